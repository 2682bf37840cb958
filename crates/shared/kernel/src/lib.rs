//! Kernel utilities shared by the fleet crates.
//! Keep this crate lightweight: it loads and validates configuration and
//! re-exports the domain model.
//!
//! ## Config loading
//! ```rust,no_run
//! use gdfleet_kernel::config::load_fleet_config;
//!
//! let cfg = load_fleet_config("gdfleet.toml").unwrap();
//! assert!(cfg.run.max_concurrent_regions >= 1);
//! ```
pub mod config;

pub use gdfleet_domain as domain;
