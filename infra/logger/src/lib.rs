//! # Logger
//!
//! Installs the global `tracing` subscriber for gdfleet: a compact console
//! layer on stderr and an optional daily-rotated file sink with non-blocking
//! I/O. `RUST_LOG` always overrides the configured level.
//!
//! ```rust
//! # use gdfleet_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder("gdfleet").level(LevelFilter::DEBUG).init().unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use gdfleet_domain::config::LoggingSettings;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// Ordered from quietest to most verbose.
const VERBOSITY: [LevelFilter; 6] = [
    LevelFilter::OFF,
    LevelFilter::ERROR,
    LevelFilter::WARN,
    LevelFilter::INFO,
    LevelFilter::DEBUG,
    LevelFilter::TRACE,
];

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    directory: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            directory: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
        }
    }
}

#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl private::Sealed for NoFile {}
impl private::Sealed for WithFile {}

/// Configures the global subscriber. File-only options are available once a
/// directory has been set.
#[derive(Debug)]
#[must_use = "The builder does nothing until `init` is called."]
pub struct LoggerBuilder<F: private::Sealed = NoFile> {
    name: String,
    config: LoggerConfig,
    file: PhantomData<F>,
}

impl LoggerBuilder<NoFile> {
    /// Adds a rolling file sink under `directory`; files are named `<name>.<date>.log`.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> LoggerBuilder<WithFile> {
        self.config.directory = Some(directory.into());
        LoggerBuilder { name: self.name, config: self.config, file: PhantomData }
    }
}

impl LoggerBuilder<WithFile> {
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Writes JSON lines to the file sink. The console stays human-readable.
    pub const fn json(mut self, enabled: bool) -> Self {
        self.config.json = enabled;
        self
    }
}

impl<F: private::Sealed> LoggerBuilder<F> {
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Raises the level by `steps` (one per `-v`), saturating at `TRACE`.
    pub fn verbosity(mut self, steps: u8) -> Self {
        self.config.level = raise_level(self.config.level, steps);
        self
    }

    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Programmatic directives such as `gdfleet_enablement=debug`; `RUST_LOG` still wins.
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    /// Installs the subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's guard and must outlive
    /// every log call that should reach the file.
    ///
    /// # Errors
    /// [`LoggerError::InvalidConfiguration`] for an empty name, zero retained
    /// files, a bad filter or no sink at all; [`LoggerError::Subscriber`] when a
    /// global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        validate(&self.name, &self.config)?;
        let filter = env_filter(&self.config)?;

        let mut layers = Vec::new();
        if self.config.console {
            layers.push(layer().compact().with_ansi(true).with_writer(std::io::stderr).boxed());
        }

        let guard = match &self.config.directory {
            Some(directory) => {
                let (file_layer, guard) = file_layer(&self.name, directory, &self.config)?;
                layers.push(file_layer);
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(invalid("No sink enabled; enable the console or set a log directory"));
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }
}

fn file_layer<S>(
    name: &str,
    directory: &Path,
    config: &LoggerConfig,
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard), LoggerError>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fs::create_dir_all(directory).context(format!("Failed to create {}", directory.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.clone())
        .filename_prefix(name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(config.max_files)
        .build(directory)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let base = layer().with_writer(writer).with_ansi(false);
    let boxed = if config.json { base.json().boxed() } else { base.boxed() };
    Ok((boxed, guard))
}

/// Handle to the installed subscriber.
#[must_use = "Dropping this handle stops the background file writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a builder. `name` prefixes rolling log files.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder { name: name.into(), config: LoggerConfig::default(), file: PhantomData }
    }

    /// Installs the subscriber described by the `[logging]` section, raised by
    /// `verbosity` steps.
    ///
    /// # Errors
    /// See [`LoggerBuilder::init`]; an unknown level name is also rejected.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &LoggingSettings,
        verbosity: u8,
    ) -> Result<Self, LoggerError> {
        let level = LevelFilter::from_str(settings.level.trim())
            .map_err(|e| invalid(format!("Unknown log level '{}': {e}", settings.level)))?;

        let builder =
            Self::builder(name).console(settings.console).level(level).verbosity(verbosity);
        match &settings.directory {
            Some(directory) => builder
                .directory(directory)
                .max_files(settings.max_files)
                .json(settings.json)
                .init(),
            None => builder.init(),
        }
    }

    /// Whether a file sink is attached.
    #[must_use]
    pub const fn has_file_sink(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Flushing log file writer");
        }
    }
}

fn raise_level(level: LevelFilter, steps: u8) -> LevelFilter {
    let current = VERBOSITY.iter().position(|l| *l == level).unwrap_or(3);
    VERBOSITY[(current + usize::from(steps)).min(VERBOSITY.len() - 1)]
}

fn validate(name: &str, config: &LoggerConfig) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(invalid("Logger name cannot be empty"));
    }
    if config.directory.is_some() && config.max_files == 0 {
        return Err(invalid("max_files must be greater than zero"));
    }
    Ok(())
}

fn env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    match &config.env_filter {
        Some(filter) => builder
            .parse(filter)
            .map_err(|e| invalid(format!("Invalid env filter '{filter}': {e}"))),
        None => Ok(builder.from_env_lossy()),
    }
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> LoggerError {
    LoggerError::InvalidConfiguration { message: message.into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder("gdfleet");
        assert!(builder.config.console);
        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert!(builder.config.directory.is_none());
        assert_eq!(builder.config.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn file_options_are_kept() {
        let builder = Logger::builder("gdfleet")
            .env_filter("gdfleet_enablement=debug")
            .directory("logs")
            .max_files(3)
            .json(true);

        assert_eq!(builder.config.directory.as_deref(), Some(Path::new("logs")));
        assert_eq!(builder.config.max_files, 3);
        assert!(builder.config.json);
        assert_eq!(builder.config.env_filter.as_deref(), Some("gdfleet_enablement=debug"));
    }

    #[test]
    fn verbosity_raises_and_saturates() {
        assert_eq!(raise_level(LevelFilter::INFO, 0), LevelFilter::INFO);
        assert_eq!(raise_level(LevelFilter::INFO, 1), LevelFilter::DEBUG);
        assert_eq!(raise_level(LevelFilter::WARN, 2), LevelFilter::DEBUG);
        assert_eq!(raise_level(LevelFilter::INFO, 9), LevelFilter::TRACE);
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Logger::builder("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn no_sink_is_rejected() {
        let err = Logger::builder("gdfleet").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let settings = LoggingSettings { level: "chatty".to_owned(), ..LoggingSettings::default() };
        let err = Logger::from_settings("gdfleet", &settings, 0).unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }
}
