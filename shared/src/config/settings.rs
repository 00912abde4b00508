use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL of this service. Sent to external
    /// agencies in submission payloads so they can call back.
    pub public_url: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub rust_log: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Inline form-submission HTTP timeout, seconds.
    pub submission_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let server = ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "4210".to_string())
                .parse()
                .unwrap_or(4210),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:4210".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").map_err(|_| {
                config::ConfigError::NotFound("DATABASE_URL".to_string())
            })?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        let engine = EngineConfig {
            submission_timeout_secs: env::var("SUBMISSION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        };

        Ok(Settings {
            server,
            database,
            logging,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_requires_database_url() {
        // DATABASE_URL is the single setting without a default.
        let saved = env::var("DATABASE_URL").ok();
        env::remove_var("DATABASE_URL");
        assert!(Settings::from_env().is_err());

        env::set_var("DATABASE_URL", "postgresql://localhost/trade_db");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.database.url, "postgresql://localhost/trade_db");
        assert_eq!(settings.engine.submission_timeout_secs, 30);

        match saved {
            Some(value) => env::set_var("DATABASE_URL", value),
            None => env::remove_var("DATABASE_URL"),
        }
    }
}
