//! Configuration records and the immutable snapshot built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One centrally managed agent configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Service the settings apply to; empty matches any service.
    pub service_name: String,
    /// Environment the settings apply to; empty matches any environment.
    pub service_environment: String,
    /// Agent the settings were written for.
    pub agent_name: String,
    /// Entity tag used by agents for cache validation.
    pub etag: String,
    /// Setting name to value.
    pub settings: HashMap<String, String>,
}

impl ConfigRecord {
    /// Creates a record for the given service identity.
    pub fn new(
        service_name: impl Into<String>,
        service_environment: impl Into<String>,
        etag: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_environment: service_environment.into(),
            etag: etag.into(),
            ..Self::default()
        }
    }

    /// Sets the agent name.
    pub fn with_agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = agent_name.into();
        self
    }

    /// Adds a single setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

/// The full set of records produced by one successful refresh cycle.
///
/// Built once, never mutated; a newer cycle replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<ConfigRecord>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Wraps records gathered just now, in page-arrival order.
    pub fn new(records: Vec<ConfigRecord>) -> Self {
        Self {
            records,
            refreshed_at: Some(Utc::now()),
        }
    }

    /// The snapshot published before any refresh has succeeded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Records in page-arrival order.
    pub fn records(&self) -> &[ConfigRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the refresh that produced this snapshot completed.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}
