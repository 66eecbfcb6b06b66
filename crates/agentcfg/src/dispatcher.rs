//! Read path: gate lookups on readiness, then match against the snapshot.

use crate::cache::CacheStore;
use crate::error::FetchError;
use crate::model::{ConfigRecord, Snapshot};
use crate::readiness::{ReadinessGate, ReadinessState};
use std::sync::Arc;

/// Lookup policy applied to a snapshot's records.
pub trait Matcher: Send + Sync {
    type Query;
    type Output;

    fn find(&self, query: &Self::Query, records: &[ConfigRecord]) -> Self::Output;
}

/// Answers lookups from the current snapshot once the cache is ready.
#[derive(Debug)]
pub struct QueryDispatcher<M> {
    gate: Arc<ReadinessGate>,
    cache: Arc<CacheStore>,
    matcher: M,
}

impl<M: Matcher> QueryDispatcher<M> {
    pub fn new(gate: Arc<ReadinessGate>, cache: Arc<CacheStore>, matcher: M) -> Self {
        Self {
            gate,
            cache,
            matcher,
        }
    }

    /// Looks up `query`, or reports why the cache cannot answer.
    ///
    /// Never blocks on a refresh; a ready cache always answers from the last
    /// published snapshot.
    pub fn fetch(&self, query: &M::Query) -> Result<M::Output, FetchError> {
        self.gate.check()?;
        let snapshot = self.cache.read();
        Ok(self.matcher.find(query, snapshot.records()))
    }

    pub fn state(&self) -> ReadinessState {
        self.gate.state()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.cache.read()
    }
}
