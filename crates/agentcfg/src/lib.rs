//! # agentcfg
//!
//! Refresh-and-cache engine for centrally managed agent configuration.
//!
//! A [`RefreshScheduler`] periodically pulls every configuration record from
//! a paginated [`DocumentStore`] and publishes them as an immutable
//! [`Snapshot`]. A [`QueryDispatcher`] answers lookups from the latest
//! snapshot without ever waiting on the upstream store, and reports
//! [`FetchError::NotReady`] or [`FetchError::ConfigInvalid`] until a refresh
//! has succeeded.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod dispatcher;
pub mod elasticsearch;
pub mod error;
pub mod fetcher;
pub mod matcher;
pub mod model;
pub mod readiness;
pub mod scheduler;
pub mod settings;
pub mod upstream;

pub use cache::CacheStore;
pub use dispatcher::{Matcher, QueryDispatcher};
pub use elasticsearch::ElasticsearchStore;
pub use error::{FetchError, RefreshError, RunError};
pub use fetcher::PageFetcher;
pub use matcher::{AgentConfigResult, AgentQuery, Service, ServiceMatcher, Source};
pub use model::{ConfigRecord, Snapshot};
pub use readiness::{ReadinessGate, ReadinessState};
pub use scheduler::RefreshScheduler;
pub use settings::RefreshSettings;
pub use upstream::{classify_status, DocumentStore, ErrorClass, Page, UpstreamError};

use std::sync::Arc;

/// Wires a scheduler and a dispatcher around one shared cache and gate.
pub fn build<S, M>(
    store: S,
    settings: &RefreshSettings,
    matcher: M,
) -> (RefreshScheduler<S>, QueryDispatcher<M>)
where
    S: DocumentStore,
    M: Matcher,
{
    let cache = Arc::new(CacheStore::new());
    let gate = Arc::new(ReadinessGate::new());

    let scheduler = RefreshScheduler::new(store, settings, Arc::clone(&cache), Arc::clone(&gate));
    let dispatcher = QueryDispatcher::new(gate, cache, matcher);
    (scheduler, dispatcher)
}
