//! Default lookup policy: match a service by name and environment.

use crate::dispatcher::Matcher;
use crate::model::ConfigRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of the service asking for its configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub environment: String,
}

/// A lookup issued by an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentQuery {
    pub service: Service,
    /// Etag the agent already holds, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl AgentQuery {
    pub fn new(name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            service: Service {
                name: name.into(),
                environment: environment.into(),
            },
            etag: None,
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// The configuration chosen for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub settings: HashMap<String, String>,
    pub etag: String,
    pub agent_name: String,
}

/// Outcome of a lookup; `source` is `None` when no record applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfigResult {
    pub source: Option<Source>,
}

impl AgentConfigResult {
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }

    /// True when the agent's cached etag is still current.
    pub fn is_unchanged_for(&self, etag: Option<&str>) -> bool {
        match (&self.source, etag) {
            (Some(source), Some(held)) => !held.is_empty() && source.etag == held,
            _ => false,
        }
    }
}

impl From<&ConfigRecord> for Source {
    fn from(record: &ConfigRecord) -> Self {
        Self {
            settings: record.settings.clone(),
            etag: record.etag.clone(),
            agent_name: record.agent_name.clone(),
        }
    }
}

/// Picks the most specific record for a service.
///
/// Precedence, with the first record winning inside each tier:
/// exact name and environment, then name with an empty environment, then
/// an empty name with the environment, then the catch-all record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceMatcher;

impl Matcher for ServiceMatcher {
    type Query = AgentQuery;
    type Output = AgentConfigResult;

    fn find(&self, query: &AgentQuery, records: &[ConfigRecord]) -> AgentConfigResult {
        let name = query.service.name.as_str();
        let env = query.service.environment.as_str();

        let mut by_name = None;
        let mut by_env = None;
        let mut fallback = None;

        for record in records {
            let name_matches = record.service_name == name;
            let env_matches = record.service_environment == env;
            let any_name = record.service_name.is_empty();
            let any_env = record.service_environment.is_empty();

            if name_matches && env_matches {
                return AgentConfigResult {
                    source: Some(Source::from(record)),
                };
            } else if name_matches && any_env {
                by_name.get_or_insert(record);
            } else if any_name && env_matches {
                by_env.get_or_insert(record);
            } else if any_name && any_env {
                fallback.get_or_insert(record);
            }
        }

        AgentConfigResult {
            source: by_name.or(by_env).or(fallback).map(Source::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ConfigRecord> {
        vec![
            ConfigRecord::new("", "", "default").with_setting("sample_rate", "0.1"),
            ConfigRecord::new("", "production", "env"),
            ConfigRecord::new("opbeans", "", "name"),
            ConfigRecord::new("opbeans", "production", "exact").with_agent_name("java"),
            ConfigRecord::new("opbeans", "", "name-duplicate"),
        ]
    }

    fn etag_of(result: &AgentConfigResult) -> Option<&str> {
        result.source.as_ref().map(|s| s.etag.as_str())
    }

    #[test]
    fn test_exact_match_wins() {
        let result = ServiceMatcher.find(&AgentQuery::new("opbeans", "production"), &records());
        assert_eq!(etag_of(&result), Some("exact"));
        assert_eq!(result.source.unwrap().agent_name, "java");
    }

    #[test]
    fn test_name_beats_environment() {
        let result = ServiceMatcher.find(&AgentQuery::new("opbeans", "staging"), &records());
        assert_eq!(etag_of(&result), Some("name"));
    }

    #[test]
    fn test_environment_beats_default() {
        let result = ServiceMatcher.find(&AgentQuery::new("other", "production"), &records());
        assert_eq!(etag_of(&result), Some("env"));
    }

    #[test]
    fn test_default_catches_everything_else() {
        let result = ServiceMatcher.find(&AgentQuery::new("other", "staging"), &records());
        assert_eq!(etag_of(&result), Some("default"));
        assert_eq!(
            result.source.unwrap().settings.get("sample_rate").map(String::as_str),
            Some("0.1")
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        let records = vec![ConfigRecord::new("opbeans", "production", "exact")];
        let result = ServiceMatcher.find(&AgentQuery::new("other", ""), &records);
        assert!(result.is_empty());
    }

    #[test]
    fn test_unchanged_etag() {
        let result = ServiceMatcher.find(&AgentQuery::new("opbeans", "production"), &records());
        assert!(result.is_unchanged_for(Some("exact")));
        assert!(!result.is_unchanged_for(Some("stale")));
        assert!(!result.is_unchanged_for(None));
        assert!(!AgentConfigResult::default().is_unchanged_for(Some("")));
    }
}
