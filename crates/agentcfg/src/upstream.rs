//! The paginated document-store seam and the classification of its failures.

use crate::model::ConfigRecord;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Whether an upstream failure can be fixed by trying again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retrying on the next cycle may succeed.
    Transient,
    /// Only external reconfiguration can fix it.
    Permanent,
}

/// Classifies an HTTP status returned by the upstream store.
///
/// 401 (unauthenticated) and 403 (forbidden) are permanent; any other
/// status is transient.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        401 | 403 => ErrorClass::Permanent,
        _ => ErrorClass::Transient,
    }
}

/// Failure of a single request against the upstream store.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The store answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status {
        status: u16,
        body: Option<String>,
    },

    /// The request never produced a response.
    #[error("upstream request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response body could not be decoded.
    #[error("malformed upstream response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl UpstreamError {
    /// Creates a status error.
    pub fn status(status: u16, body: Option<String>) -> Self {
        Self::Status { status, body }
    }

    /// Creates a transport error from any underlying error.
    pub fn transport(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(source))
    }

    /// Permanent for auth failures, transient otherwise.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Status { status, .. } => classify_status(*status),
            Self::Transport(_) | Self::Decode(_) => ErrorClass::Transient,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err)
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Cursor to continue from, when the store issued one.
    pub cursor: Option<String>,
    /// Records on this page; empty once the listing is exhausted.
    pub records: Vec<ConfigRecord>,
}

impl Page {
    /// Creates a page.
    pub fn new(cursor: impl Into<String>, records: Vec<ConfigRecord>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            records,
        }
    }
}

/// A remote store that can list every configuration record with a cursor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Requests the first page and opens a cursor valid for `keep_alive`.
    async fn open_cursor(
        &self,
        page_size: usize,
        keep_alive: Duration,
    ) -> Result<Page, UpstreamError>;

    /// Requests the page after `cursor`, extending its validity by `keep_alive`.
    async fn continue_cursor(
        &self,
        cursor: &str,
        keep_alive: Duration,
    ) -> Result<Page, UpstreamError>;

    /// Frees the server-side cursor.
    async fn release_cursor(&self, cursor: &str) -> Result<(), UpstreamError>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn open_cursor(
        &self,
        page_size: usize,
        keep_alive: Duration,
    ) -> Result<Page, UpstreamError> {
        (**self).open_cursor(page_size, keep_alive).await
    }

    async fn continue_cursor(
        &self,
        cursor: &str,
        keep_alive: Duration,
    ) -> Result<Page, UpstreamError> {
        (**self).continue_cursor(cursor, keep_alive).await
    }

    async fn release_cursor(&self, cursor: &str) -> Result<(), UpstreamError> {
        (**self).release_cursor(cursor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_table() {
        for status in [401, 403] {
            assert_eq!(classify_status(status), ErrorClass::Permanent, "{status}");
        }
        for status in [200, 400, 404, 408, 429, 500, 502, 503, 504] {
            assert_eq!(classify_status(status), ErrorClass::Transient, "{status}");
        }
    }

    #[test]
    fn test_non_status_errors_are_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(UpstreamError::transport(io).class(), ErrorClass::Transient);

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(UpstreamError::from(decode).class(), ErrorClass::Transient);
    }

    #[test]
    fn test_status_error_class() {
        assert_eq!(UpstreamError::status(401, None).class(), ErrorClass::Permanent);
        assert_eq!(
            UpstreamError::status(500, Some("boom".into())).class(),
            ErrorClass::Transient
        );
    }
}
