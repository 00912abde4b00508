pub mod config;

pub use config::{LogFormat, LoggerConfig};

use tracing_subscriber::EnvFilter;

use crate::config::settings::LoggingConfig;

/// Initialize the logger from application settings
pub fn init_from_settings(settings: &LoggingConfig) {
    let config = LoggerConfig::from_settings(settings);
    init_logger(&config);
}

/// Initialize the global tracing subscriber. Safe to call once per
/// process; later calls are ignored.
pub fn init_logger(config: &LoggerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if result.is_err() {
        tracing::debug!("Logger already initialized");
    }
}
