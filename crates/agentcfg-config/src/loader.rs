//! Configuration loading utilities

use crate::Config;
use agentcfg_common::Result as AgentCfgResult;
use std::env;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "AGENTCFG_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for agentcfg_common::AgentCfgError {
    fn from(err: ConfigError) -> Self {
        agentcfg_common::AgentCfgError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        debug!(path = %path.as_ref().display(), "Parsed configuration file");

        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from the first location that exists:
    /// `AGENTCFG_CONFIG_PATH`, `agentcfg.yaml`, `agentcfg.yml`, then defaults
    pub fn load() -> AgentCfgResult<Config> {
        let config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::load_config(&config_path)?
        } else if Path::new("agentcfg.yaml").exists() {
            Self::load_config("agentcfg.yaml")?
        } else if Path::new("agentcfg.yml").exists() {
            Self::load_config("agentcfg.yml")?
        } else {
            info!("No configuration file found, using defaults");
            let mut config = Config::default();
            Self::apply_env_overrides(&mut config)?;
            config.validate_all().map_err(ConfigError::Validation)?;
            config
        };

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> AgentCfgResult<Config> {
        Ok(Self::load_config(path)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |var| env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("AGENTCFG_ES_URL") {
            config.elasticsearch.url = url;
        }

        if let Some(username) = lookup("AGENTCFG_ES_USERNAME") {
            config.elasticsearch.username = Some(username);
        }

        if let Some(password) = lookup("AGENTCFG_ES_PASSWORD") {
            config.elasticsearch.password = Some(password);
        }

        if let Some(api_key) = lookup("AGENTCFG_ES_API_KEY") {
            config.elasticsearch.api_key = Some(api_key);
        }

        if let Some(interval) = lookup("AGENTCFG_REFRESH_INTERVAL") {
            config.cache.refresh_interval_seconds = parse_var("AGENTCFG_REFRESH_INTERVAL", &interval)?;
        }

        if let Some(timeout) = lookup("AGENTCFG_REFRESH_TIMEOUT") {
            config.cache.refresh_timeout_seconds = parse_var("AGENTCFG_REFRESH_TIMEOUT", &timeout)?;
        }

        if let Some(address) = lookup("AGENTCFG_LISTEN_ADDRESS") {
            config.server.listen_address = address;
        }

        if let Some(level) = lookup("AGENTCFG_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e| ConfigError::EnvParse {
        var: var.to_string(),
        source: Box::new(e),
    })
}
