use anyhow::{Context, Result};
use gdfleet::domain::config::FleetSettings;
use gdfleet::enablement::ExceptionPolicy;
use gdfleet::kernel::config::freeze;
use std::path::Path;

/// Validates the configuration and prints what a run would use. No provider call is made.
pub fn validate(settings: FleetSettings, path: &Path) -> Result<()> {
    let config = freeze(settings).context("Critical: configuration is invalid")?;
    let policy = ExceptionPolicy::from_settings(&config.exceptions);

    println!("configuration ok: {}", path.display());

    println!("features: {}", config.run.features.features().count());
    for feature in config.run.features.features() {
        println!("  {feature} ({})", feature.label());
    }
    println!(
        "admin profile: {}",
        config.provider.effective_admin_profile().unwrap_or("(default chain)")
    );
    if let Some(preservation) = config.malware.snapshot_preservation {
        println!("snapshot preservation: {preservation}");
    }

    match policy.feature() {
        Some(feature) => {
            println!("exceptions for {feature}: {}", policy.len());
            for entry in policy.entries() {
                println!("  {} {}", entry.region, entry.account_id);
            }
        },
        None => println!("exceptions: none"),
    }

    Ok(())
}
