//! Configuration management for agentcfg
//!
//! YAML file loading with environment overrides and `validator` based
//! validation of every section.

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader, CONFIG_PATH_VAR};
pub use settings::{
    CacheConfig, Config, ElasticsearchConfig, LoggingConfig, ServerConfig, DEFAULT_INDEX,
};
