use super::ConfigError;
use gdfleet_domain::config::FleetSettings;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing::warn;

/// Rejects settings that cannot drive a run.
///
/// Inconsistent but harmless combinations (an exception feature that is not part of
/// the run, a region both included and excluded) are logged as warnings.
///
/// # Errors
/// Returns [`ConfigError::Invalid`] naming the first offending key.
pub fn validate_settings(settings: &FleetSettings) -> Result<(), ConfigError> {
    if LevelFilter::from_str(settings.logging.level.trim()).is_err() {
        return Err(invalid(format!("logging.level '{}' is not a log level", settings.logging.level)));
    }
    if settings.logging.max_files == 0 {
        return Err(invalid("logging.max_files must be greater than zero"));
    }
    if settings.provider.max_attempts == 0 {
        return Err(invalid("provider.max_attempts must be greater than zero"));
    }
    if settings.run.max_concurrent_regions == 0 {
        return Err(invalid("run.max_concurrent_regions must be greater than zero"));
    }
    if settings.run.features.is_empty() {
        return Err(invalid("run.features must name at least one feature"));
    }

    let exceptions = &settings.exceptions;
    if exceptions.enabled
        && !exceptions.entries.is_empty()
        && !settings.run.features.contains_feature(exceptions.feature)
    {
        warn!(
            feature = %exceptions.feature,
            "Exception feature is not part of run.features; exception entries have no effect"
        );
    }

    for region in &settings.run.include_regions {
        if settings.run.exclude_regions.contains(region) {
            warn!(region = %region, "Region is both included and excluded; it will be skipped");
        }
    }

    Ok(())
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> ConfigError {
    ConfigError::Invalid { message: message.into(), context: None }
}
