//! Background loop that keeps the cache fresh.

use crate::cache::CacheStore;
use crate::error::{RefreshError, RunError};
use crate::fetcher::PageFetcher;
use crate::readiness::ReadinessGate;
use crate::settings::RefreshSettings;
use crate::upstream::DocumentStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shortest tick period the loop accepts. `interval_at` panics on zero.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    Continue,
    Stop,
}

/// Runs refresh cycles on a fixed interval and publishes their snapshots.
#[derive(Debug)]
pub struct RefreshScheduler<S> {
    fetcher: PageFetcher<S>,
    cache: Arc<CacheStore>,
    gate: Arc<ReadinessGate>,
    interval: Duration,
}

impl<S: DocumentStore> RefreshScheduler<S> {
    /// Creates a scheduler that publishes into `cache` and reports to `gate`.
    pub fn new(
        store: S,
        settings: &RefreshSettings,
        cache: Arc<CacheStore>,
        gate: Arc<ReadinessGate>,
    ) -> Self {
        let interval = if settings.interval < MIN_REFRESH_INTERVAL {
            warn!(
                configured = ?settings.interval,
                using = ?MIN_REFRESH_INTERVAL,
                "refresh interval too short, clamping"
            );
            MIN_REFRESH_INTERVAL
        } else {
            settings.interval
        };

        Self {
            fetcher: PageFetcher::new(store, settings),
            cache,
            gate,
            interval,
        }
    }

    /// Refreshes immediately, then once per interval until told to stop.
    ///
    /// Returns `Ok(())` when a permanent upstream failure ends the loop and
    /// `Err(RunError::Cancelled)` when `cancel` fires. Cycles never overlap.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RunError> {
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        info!(interval = ?self.interval, "refresh cache background job started");
        if self.refresh(&cancel).await? == Cycle::Stop {
            return Ok(());
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("refresh cache background job cancelled");
                    return Err(RunError::Cancelled);
                }
                _ = ticker.tick() => {
                    if self.refresh(&cancel).await? == Cycle::Stop {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn refresh(&self, cancel: &CancellationToken) -> Result<Cycle, RunError> {
        let size_hint = self.cache.read().len();

        match self.fetcher.fetch(cancel, size_hint).await {
            Ok(snapshot) => {
                let records = snapshot.len();
                self.cache.publish(snapshot);
                self.gate.mark_ready();
                debug!(records, "refresh cache success");
                Ok(Cycle::Continue)
            }
            Err(RefreshError::Cancelled) => {
                info!("refresh cache background job cancelled mid-cycle");
                Err(RunError::Cancelled)
            }
            Err(err) => {
                error!(error = %err, "refresh cache error");
                if err.is_permanent() {
                    self.gate.mark_invalid();
                    warn!("stopping refresh cache background job: elasticsearch config is invalid");
                    return Ok(Cycle::Stop);
                }
                Ok(Cycle::Continue)
            }
        }
    }
}
