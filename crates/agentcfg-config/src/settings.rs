//! Application configuration structures

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError, ValidationErrors};

/// Index holding the centrally managed agent configuration documents.
pub const DEFAULT_INDEX: &str = ".apm-agent-configuration";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Upstream Elasticsearch connection
    #[validate]
    pub elasticsearch: ElasticsearchConfig,

    /// Refresh cycle tuning
    #[validate]
    pub cache: CacheConfig,

    /// HTTP listener
    #[validate]
    pub server: ServerConfig,

    /// Log output
    #[validate]
    pub logging: LoggingConfig,
}

/// Elasticsearch connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster
    #[validate(url(message = "Elasticsearch URL must be a valid URL"))]
    pub url: String,

    /// Index that stores the agent configuration documents
    #[validate(length(min = 1, message = "Index name cannot be empty"))]
    pub index: String,

    /// Basic auth user name
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,

    /// Encoded API key, sent as `Authorization: ApiKey <key>`
    #[validate(length(min = 1, message = "API key cannot be empty if specified"))]
    pub api_key: Option<String>,

    /// Per-request timeout applied by the HTTP client
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub request_timeout_seconds: u64,
}

/// Refresh cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds between refresh cycles; also the scroll keep-alive
    #[validate(range(min = 1, max = 86400, message = "Refresh interval must be between 1 and 86400 seconds"))]
    pub refresh_interval_seconds: u64,

    /// Deadline for one complete refresh cycle
    #[validate(range(min = 1, max = 300, message = "Refresh timeout must be between 1 and 300 seconds"))]
    pub refresh_timeout_seconds: u64,

    /// Documents requested per page
    #[validate(range(min = 1, max = 10000, message = "Page size must be between 1 and 10000"))]
    pub page_size: u32,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:8200`
    #[validate(custom(function = "crate::validation::validate_listen_address", message = "Listen address must be host:port"))]
    pub listen_address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(custom(function = "crate::validation::validate_log_level", message = "Log level must be one of: trace, debug, info, warn, error"))]
    pub level: String,

    /// Emit JSON lines instead of text
    pub json: bool,

    /// Multi-line, colored output for local development
    pub pretty: bool,

    /// Also log span open/close events, e.g. each refresh cycle
    pub spans: bool,

    /// Optional log file path
    #[validate(custom(function = "crate::validation::validate_file_path", message = "Invalid log file path"))]
    pub file: Option<String>,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: DEFAULT_INDEX.to_string(),
            username: None,
            password: None,
            api_key: None,
            request_timeout_seconds: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 30,
            refresh_timeout_seconds: 5,
            page_size: 100,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:8200".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            pretty: false,
            spans: false,
            file: None,
        }
    }
}

impl Config {
    /// Field validation plus the checks that span several fields
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        self.elasticsearch.validate_credentials()?;
        Ok(())
    }
}

impl ElasticsearchConfig {
    /// Basic auth needs both halves; basic auth and an API key are exclusive
    pub fn validate_credentials(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match (&self.username, &self.password) {
            (Some(_), None) => errors.add("password", ValidationError::new("missing_password")),
            (None, Some(_)) => errors.add("username", ValidationError::new("missing_username")),
            _ => {}
        }

        if self.username.is_some() && self.api_key.is_some() {
            errors.add("api_key", ValidationError::new("conflicting_credentials"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl CacheConfig {
    /// Interval between refresh cycles
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Deadline for a single refresh cycle
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_seconds)
    }
}

impl From<&LoggingConfig> for agentcfg_common::LoggingConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            json_format: config.json,
            pretty_format: config.pretty,
            file_path: config.file.clone(),
            include_spans: config.spans,
        }
    }
}
