//! Error types and utilities for agentcfg

use thiserror::Error;

/// Result type alias for agentcfg operations
pub type Result<T> = std::result::Result<T, AgentCfgError>;

/// Main error type for agentcfg setup and plumbing
#[derive(Error, Debug)]
pub enum AgentCfgError {
    /// Configuration could not be loaded or does not describe a usable setup
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The HTTP client could not be set up
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AgentCfgError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }
}
