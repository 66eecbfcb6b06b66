//! Test utilities shared across the workspace.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}
