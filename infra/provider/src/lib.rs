//! SDK binding of [`gdfleet_enablement::ManagementApi`].
//!
//! Region discovery goes through the compute service; everything else through
//! the threat-detection service. SDK failures are classified into
//! [`gdfleet_enablement::ProviderErrorKind`] so run reports stay provider-neutral.

mod client;
mod convert;
mod error;

pub use crate::client::AwsManagementApi;
