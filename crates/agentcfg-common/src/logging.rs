//! Structured logging infrastructure for agentcfg

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "agentcfg=debug")
    pub level: String,
    /// Whether to emit JSON lines
    pub json_format: bool,
    /// Whether to enable pretty formatting with colors
    pub pretty_format: bool,
    /// Optional file path for log output
    pub file_path: Option<String>,
    /// Whether to log span open/close events
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_format: false,
            file_path: None,
            include_spans: false,
        }
    }
}

fn open_log_file(path: &str) -> std::io::Result<std::sync::Mutex<std::fs::File>> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(std::sync::Mutex::new)
}

/// Initialize the tracing subscriber with the given configuration
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // RUST_LOG wins over the configured level when set
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .or_else(|_| EnvFilter::try_new("info"))?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_format {
        let layer = fmt::layer()
            .json()
            .with_span_events(span_events);

        match config.file_path {
            Some(path) => registry.with(layer.with_writer(open_log_file(&path)?)).try_init()?,
            None => registry.with(layer).try_init()?,
        }
    } else if config.pretty_format {
        let layer = fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_thread_names(true);

        match config.file_path {
            Some(path) => registry
                .with(layer.with_ansi(false).with_writer(open_log_file(&path)?))
                .try_init()?,
            None => registry.with(layer).try_init()?,
        }
    } else {
        let layer = fmt::layer()
            .with_span_events(span_events);

        match config.file_path {
            Some(path) => registry
                .with(layer.with_ansi(false).with_writer(open_log_file(&path)?))
                .try_init()?,
            None => registry.with(layer).try_init()?,
        }
    }

    Ok(())
}
