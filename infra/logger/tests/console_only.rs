use gdfleet_domain::config::LoggingSettings;
use gdfleet_logger::Logger;

#[test]
fn default_settings_log_to_console_only() {
    let logger = Logger::from_settings("gdfleet-console-only", &LoggingSettings::default(), 1)
        .expect("logger should initialize");

    assert!(!logger.has_file_sink(), "console-only logger should not own a file writer");
    tracing::debug!("visible because of one verbosity step");
}
