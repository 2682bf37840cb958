//! Facade crate for gdfleet.
//! Re-exports the domain, configuration kernel and enablement pipeline, and
//! wires a [`FleetRunner`](enablement::FleetRunner) from a loaded configuration.
//! Keep this crate thin: it composes other crates, it does not implement behaviour.
//!
//! ## Usage
//! - Load a `FleetConfig` with [`kernel::config::load_fleet_config`].
//! - Call [`connect`] (feature `aws`) or [`runner`] with your own API binding.

pub use gdfleet_domain as domain;
pub use gdfleet_enablement as enablement;
pub use gdfleet_kernel as kernel;
#[cfg(feature = "aws")]
pub use gdfleet_provider as provider;

use gdfleet_domain::config::FleetSettings;
use gdfleet_enablement::{FleetRunner, ManagementApi, RunOptions};
use std::sync::Arc;

/// Builds a runner over any [`ManagementApi`] binding.
pub fn runner<P>(api: Arc<P>, settings: &FleetSettings) -> FleetRunner<P>
where
    P: ManagementApi + ?Sized + 'static,
{
    FleetRunner::new(api, RunOptions::from_settings(settings))
}

/// Resolves provider sessions from `config.provider` and builds a runner over them.
#[cfg(feature = "aws")]
pub async fn connect(
    config: &gdfleet_domain::config::FleetConfig,
) -> FleetRunner<provider::AwsManagementApi> {
    let api = provider::AwsManagementApi::connect(&config.provider).await;
    runner(Arc::new(api), config)
}
