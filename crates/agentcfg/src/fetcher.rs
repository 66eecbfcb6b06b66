//! Full-corpus extraction over the cursor pagination protocol.

use crate::error::RefreshError;
use crate::model::{ConfigRecord, Snapshot};
use crate::settings::RefreshSettings;
use crate::upstream::DocumentStore;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Upper bound for the best-effort cursor release after a cycle.
pub const CURSOR_RELEASE_TIMEOUT: Duration = Duration::from_secs(1);

/// Pulls every record from a [`DocumentStore`], one page at a time.
#[derive(Debug)]
pub struct PageFetcher<S> {
    store: S,
    page_size: usize,
    keep_alive: Duration,
    timeout: Duration,
}

impl<S: DocumentStore> PageFetcher<S> {
    /// Creates a fetcher. The cursor keep-alive equals the refresh interval.
    pub fn new(store: S, settings: &RefreshSettings) -> Self {
        Self {
            store,
            page_size: settings.page_size,
            keep_alive: settings.interval,
            timeout: settings.timeout,
        }
    }

    /// Runs one extraction and returns the resulting snapshot.
    ///
    /// The whole extraction is bounded by the configured timeout and aborted
    /// when `cancel` fires. The cursor is released afterwards whatever the
    /// outcome. `size_hint` only pre-sizes the buffer.
    #[instrument(skip_all, name = "fetch_snapshot")]
    pub async fn fetch(
        &self,
        cancel: &CancellationToken,
        size_hint: usize,
    ) -> Result<Snapshot, RefreshError> {
        let mut cursor: Option<String> = None;
        let mut records = Vec::with_capacity(size_hint);

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RefreshError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.paginate(&mut cursor, &mut records)) => {
                result.unwrap_or_else(|_| Err(RefreshError::DeadlineExceeded(self.timeout)))
            }
        };

        self.release(cursor.as_deref().unwrap_or_default()).await;

        let pages = outcome?;
        debug!(pages, records = records.len(), "fetched all pages");
        Ok(Snapshot::new(records))
    }

    /// Returns the number of pages read. `cursor` always holds the latest
    /// cursor issued by the store so the caller can release it.
    async fn paginate(
        &self,
        cursor: &mut Option<String>,
        records: &mut Vec<ConfigRecord>,
    ) -> Result<usize, RefreshError> {
        let mut pages = 0;
        loop {
            let page = match cursor.as_deref() {
                None => {
                    self.store
                        .open_cursor(self.page_size, self.keep_alive)
                        .await?
                }
                Some(id) => self.store.continue_cursor(id, self.keep_alive).await?,
            };
            pages += 1;

            if page.records.is_empty() {
                if page.cursor.is_some() {
                    *cursor = page.cursor;
                }
                return Ok(pages);
            }

            match page.cursor {
                Some(next) => *cursor = Some(next),
                None => return Err(RefreshError::MissingCursor),
            }
            records.extend(page.records);
        }
    }

    /// Best effort; runs even after cancellation, bounded by its own timeout.
    async fn release(&self, cursor: &str) {
        let released =
            tokio::time::timeout(CURSOR_RELEASE_TIMEOUT, self.store.release_cursor(cursor)).await;

        match released {
            Ok(Ok(())) => debug!("released cursor"),
            Ok(Err(err)) => warn!(error = %err, "failed to release cursor"),
            Err(_) => warn!(timeout = ?CURSOR_RELEASE_TIMEOUT, "cursor release timed out"),
        }
    }
}
