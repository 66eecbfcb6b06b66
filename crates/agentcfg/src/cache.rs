//! Snapshot cache with lock-free reads.

use crate::model::Snapshot;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Holds the currently published [`Snapshot`].
///
/// Readers get a reference-counted handle to one complete snapshot; a
/// publish swaps the pointer, so a reader sees either the old or the new
/// snapshot in full.
#[derive(Debug)]
pub struct CacheStore {
    snapshot: ArcSwap<Snapshot>,
}

impl CacheStore {
    /// Creates a cache holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// Returns the current snapshot.
    pub fn read(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Atomically replaces the current snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
