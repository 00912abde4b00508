pub mod settings;

pub use settings::{DatabaseConfig, EngineConfig, LoggingConfig, ServerConfig, Settings};
