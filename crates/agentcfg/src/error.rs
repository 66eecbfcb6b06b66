//! Error types surfaced by the refresh engine and the read path.

use crate::upstream::{ErrorClass, UpstreamError};
use std::time::Duration;
use thiserror::Error;

/// Errors returned to callers of [`QueryDispatcher::fetch`](crate::QueryDispatcher::fetch).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// No refresh has succeeded yet.
    #[error("agentcfg infrastructure is not ready")]
    NotReady,

    /// The upstream store permanently rejected our credentials.
    #[error("no valid elasticsearch config to fetch agent config")]
    ConfigInvalid,
}

/// Why a single refresh cycle failed.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// The upstream store failed a request.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The cycle did not finish within its deadline.
    #[error("refresh did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    /// A page carried records but no cursor to continue from.
    #[error("upstream returned a page without a continuation cursor")]
    MissingCursor,

    /// The outer cancellation signal fired mid-cycle.
    #[error("refresh cancelled")]
    Cancelled,
}

impl RefreshError {
    /// Whether retrying on the next tick can help.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Upstream(err) => err.class(),
            Self::DeadlineExceeded(_) | Self::MissingCursor | Self::Cancelled => {
                ErrorClass::Transient
            }
        }
    }

    /// Shorthand for `class() == ErrorClass::Permanent`.
    pub fn is_permanent(&self) -> bool {
        self.class() == ErrorClass::Permanent
    }
}

/// Why [`RefreshScheduler::run`](crate::RefreshScheduler::run) returned an error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    /// The outer cancellation signal fired.
    #[error("refresh loop cancelled")]
    Cancelled,
}
