//! Tuning for the refresh engine.

use agentcfg_config::CacheConfig;
use std::time::Duration;

/// Timing and paging parameters shared by the fetcher and the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Time between refresh cycles; also the cursor validity window.
    pub interval: Duration,
    /// Deadline for one whole refresh cycle.
    pub timeout: Duration,
    /// Records requested per page.
    pub page_size: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
            page_size: 100,
        }
    }
}

impl From<&CacheConfig> for RefreshSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            interval: config.refresh_interval(),
            timeout: config.refresh_timeout(),
            page_size: config.page_size as usize,
        }
    }
}
