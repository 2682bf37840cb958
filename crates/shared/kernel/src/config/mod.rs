mod validate;

pub use self::validate::validate_settings;

use config::{Config, Environment, File, Map};
use gdfleet_domain::config::{FleetConfig, FleetSettings};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Prefix of environment overrides (`GDFLEET__RUN__DRY_RUN=true`).
pub const ENV_PREFIX: &str = "GDFLEET";
/// Separator between nesting levels in override names.
pub const ENV_SEPARATOR: &str = "__";
/// Configuration file read when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "gdfleet.toml";

const LIST_KEYS: [&str; 3] = ["run.include_regions", "run.exclude_regions", "run.features"];

/// Custom error type for config loading.
#[gdfleet_derive::fleet_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Invalid configuration{}: {message}", format_context(.context))]
    Invalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// 1. **Base File**: settings from `path`; the format follows the file extension.
/// 2. **Environment Overrides**: variables prefixed with `GDFLEET__`, nested with `__`
///    (`GDFLEET__PROVIDER__REGION` maps to `provider.region`). Region and feature lists
///    accept comma-separated values.
///
/// `env` replaces the process environment as the override source when given.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing, an override is malformed,
/// or the merged settings do not deserialize into `T`.
pub fn load_config<T>(path: &Path, env: Option<Map<String, String>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let overrides = LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    );

    let builder = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(overrides.source(env));

    info!("Loading config from {}", path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Loads, validates and freezes the fleet configuration using the process environment.
///
/// # Errors
/// Returns [`ConfigError`] when loading fails or [`validate_settings`] rejects the result.
pub fn load_fleet_config(path: impl AsRef<Path>) -> Result<FleetConfig, ConfigError> {
    freeze(load_config::<FleetSettings>(path.as_ref(), None)?)
}

/// Same as [`load_fleet_config`], but reads overrides from `vars` instead of the process
/// environment. Variable names keep their `GDFLEET__` prefix.
///
/// # Errors
/// Returns [`ConfigError`] when loading fails or [`validate_settings`] rejects the result.
pub fn load_fleet_config_with_env<I, K, V>(
    path: impl AsRef<Path>,
    vars: I,
) -> Result<FleetConfig, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let env: Map<String, String> = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    freeze(load_config::<FleetSettings>(path.as_ref(), Some(env))?)
}

/// Validates settings assembled by the caller and freezes them for the run.
///
/// # Errors
/// Returns [`ConfigError::Invalid`] when [`validate_settings`] rejects them.
pub fn freeze(settings: FleetSettings) -> Result<FleetConfig, ConfigError> {
    validate_settings(&settings)?;
    Ok(FleetConfig::new(settings))
}
