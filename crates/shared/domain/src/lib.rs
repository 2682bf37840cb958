//! # Domain Models
//!
//! Pure types shared by every crate in the workspace: provider identifiers,
//! protection features and the settings tree read from the configuration file.
//! Keep it lean: no I/O, networking, or provider calls. Just data and validation.

pub mod config;
pub mod error;
pub mod features;
pub mod ids;

pub use crate::error::{DomainError, DomainErrorExt};
