pub mod apply;
pub mod validate;

use anyhow::{Context, Result};
use gdfleet::domain::config::FleetSettings;
use gdfleet::kernel::config::load_config;
use gdfleet_logger::Logger;
use std::path::Path;

/// Reads the configuration and installs the logger it describes.
///
/// Validation runs after the logger is up so its warnings are visible.
pub fn bootstrap(path: &Path, verbosity: u8) -> Result<(FleetSettings, Logger)> {
    let settings: FleetSettings = load_config(path, None)
        .with_context(|| format!("Critical: configuration '{}' is malformed", path.display()))?;
    let logger = Logger::from_settings(env!("CARGO_BIN_NAME"), &settings.logging, verbosity)?;
    Ok((settings, logger))
}
