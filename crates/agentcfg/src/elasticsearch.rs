//! [`DocumentStore`] backed by the Elasticsearch scroll API.

use crate::model::ConfigRecord;
use crate::upstream::{DocumentStore, Page, UpstreamError};
use agentcfg_common::{AgentCfgError, Result};
use agentcfg_config::ElasticsearchConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

#[derive(Clone)]
enum Credentials {
    Anonymous,
    Basic { username: String, password: String },
    ApiKey(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

/// Reads agent configuration documents from one Elasticsearch index.
#[derive(Debug, Clone)]
pub struct ElasticsearchStore {
    http: Client,
    base: Url,
    index: String,
    credentials: Credentials,
}

impl ElasticsearchStore {
    /// Builds a store from validated connection settings.
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let base = Url::parse(&config.url).map_err(|e| {
            AgentCfgError::config_with_source(
                format!("invalid Elasticsearch URL '{}'", config.url),
                e,
            )
        })?;
        if base.cannot_be_a_base() {
            return Err(AgentCfgError::config(format!(
                "Elasticsearch URL '{}' cannot carry a path",
                config.url
            )));
        }

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AgentCfgError::network_with_source("failed to create HTTP client", e))?;

        let credentials = match (&config.api_key, &config.username, &config.password) {
            (Some(key), _, _) => Credentials::ApiKey(key.clone()),
            (None, Some(username), Some(password)) => Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Credentials::Anonymous,
        };

        Ok(Self {
            http,
            base,
            index: config.index.clone(),
            credentials,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn search_url(&self, page_size: usize, keep_alive: Duration) -> Url {
        let mut url = self.endpoint(&[self.index.as_str(), "_search"]);
        url.query_pairs_mut()
            .append_pair("scroll", &keep_alive_param(keep_alive))
            .append_pair("size", &page_size.to_string());
        url
    }

    fn scroll_url(&self) -> Url {
        self.endpoint(&["_search", "scroll"])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Anonymous => request,
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Credentials::ApiKey(key) => request.header("Authorization", format!("ApiKey {key}")),
        }
    }

    async fn execute(&self, request: RequestBuilder) -> std::result::Result<Response, UpstreamError> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "elasticsearch rejected request");
            return Err(UpstreamError::status(status.as_u16(), Some(body)));
        }
        Ok(response)
    }

    async fn read_page(&self, request: RequestBuilder) -> std::result::Result<Page, UpstreamError> {
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        parse_page(&body)
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    #[instrument(skip(self), fields(index = %self.index))]
    async fn open_cursor(
        &self,
        page_size: usize,
        keep_alive: Duration,
    ) -> std::result::Result<Page, UpstreamError> {
        let request = self.http.post(self.search_url(page_size, keep_alive));
        self.read_page(request).await
    }

    #[instrument(skip(self, cursor))]
    async fn continue_cursor(
        &self,
        cursor: &str,
        keep_alive: Duration,
    ) -> std::result::Result<Page, UpstreamError> {
        let request = self.http.post(self.scroll_url()).json(&json!({
            "scroll": keep_alive_param(keep_alive),
            "scroll_id": cursor,
        }));
        self.read_page(request).await
    }

    #[instrument(skip_all)]
    async fn release_cursor(&self, cursor: &str) -> std::result::Result<(), UpstreamError> {
        if cursor.is_empty() {
            return Ok(());
        }
        let request = self
            .http
            .delete(self.scroll_url())
            .json(&json!({ "scroll_id": [cursor] }));
        self.execute(request).await?;
        Ok(())
    }
}

/// Scroll keep-alive in the millisecond form Elasticsearch accepts.
fn keep_alive_param(keep_alive: Duration) -> String {
    format!("{}ms", keep_alive.as_millis())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
    #[serde(default)]
    hits: Hits,
}

#[derive(Debug, Default, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: Document,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Document {
    service: ServiceDocument,
    settings: HashMap<String, String>,
    agent_name: String,
    etag: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServiceDocument {
    name: String,
    environment: String,
}

impl From<Document> for ConfigRecord {
    fn from(doc: Document) -> Self {
        Self {
            service_name: doc.service.name,
            service_environment: doc.service.environment,
            agent_name: doc.agent_name,
            etag: doc.etag,
            settings: doc.settings,
        }
    }
}

fn parse_page(body: &[u8]) -> std::result::Result<Page, UpstreamError> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    Ok(Page {
        cursor: response.scroll_id.filter(|id| !id.is_empty()),
        records: response
            .hits
            .hits
            .into_iter()
            .map(|hit| ConfigRecord::from(hit.source))
            .collect(),
    })
}
