use std::env;

use crate::config::settings::LoggingConfig;

/// Logger configuration builder
pub struct LoggerConfig {
    pub level: String,
    pub rust_log: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LoggerConfig {
    /// Check if we're in development mode
    fn is_development_mode() -> bool {
        let env_str = env::var("RUST_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();
        matches!(env_str.as_str(), "dev" | "development")
    }

    /// Create logger config from settings (pretty logs for development,
    /// json for everything else unless LOG_FORMAT overrides).
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        let is_dev = Self::is_development_mode();

        let format = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| if is_dev { "pretty".to_string() } else { "json".to_string() })
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let level = if settings.level.is_empty() {
            if is_dev { "debug" } else { "info" }.to_string()
        } else {
            settings.level.clone()
        };

        let rust_log = if settings.rust_log.is_empty() {
            level.clone()
        } else {
            settings.rust_log.clone()
        };

        Self {
            level,
            rust_log,
            format,
            include_location: env::var("LOG_INCLUDE_LOCATION")
                .unwrap_or_else(|_| if is_dev { "true".to_string() } else { "false".to_string() })
                .parse()
                .unwrap_or(is_dev),
        }
    }
}
