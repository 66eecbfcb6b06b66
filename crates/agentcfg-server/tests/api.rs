//! HTTP behaviour of the agent configuration endpoints.

use agentcfg::{CacheStore, ConfigRecord, QueryDispatcher, ReadinessGate, ServiceMatcher, Snapshot};
use agentcfg_common::test_utils::init_test_logging;
use agentcfg_server::{router, HealthResponse};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    gate: Arc<ReadinessGate>,
    cache: Arc<CacheStore>,
    app: axum::Router,
}

impl Harness {
    fn new() -> Self {
        init_test_logging();
        let gate = Arc::new(ReadinessGate::new());
        let cache = Arc::new(CacheStore::new());
        let dispatcher = QueryDispatcher::new(Arc::clone(&gate), Arc::clone(&cache), ServiceMatcher);
        Self {
            gate,
            cache,
            app: router(Arc::new(dispatcher)),
        }
    }

    fn ready(records: Vec<ConfigRecord>) -> Self {
        let harness = Self::new();
        harness.cache.publish(Snapshot::new(records));
        harness.gate.mark_ready();
        harness
    }

    async fn get(&self, uri: &str, if_none_match: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(etag) = if_none_match {
            request = request.header(header::IF_NONE_MATCH, etag);
        }
        self.app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn records() -> Vec<ConfigRecord> {
    vec![
        ConfigRecord::new("opbeans", "production", "abc123")
            .with_agent_name("java")
            .with_setting("transaction_sample_rate", "0.2"),
        ConfigRecord::new("", "", "fallback"),
    ]
}

#[tokio::test]
async fn test_not_ready_returns_503() {
    let harness = Harness::new();
    let response = harness
        .get("/config/v1/agents?service.name=opbeans", None)
        .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "agentcfg infrastructure is not ready");
}

#[tokio::test]
async fn test_invalid_config_returns_503_with_distinct_message() {
    let harness = Harness::new();
    harness.gate.mark_invalid();

    let response = harness
        .get("/config/v1/agents?service.name=opbeans", None)
        .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "no valid elasticsearch config to fetch agent config"
    );
}

#[tokio::test]
async fn test_matching_service_returns_settings_and_etag() {
    let harness = Harness::ready(records());
    let response = harness
        .get(
            "/config/v1/agents?service.name=opbeans&service.environment=production",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ETAG], "\"abc123\"");

    let body = json_body(response).await;
    assert_eq!(body["source"]["etag"], "abc123");
    assert_eq!(body["source"]["agent_name"], "java");
    assert_eq!(body["source"]["settings"]["transaction_sample_rate"], "0.2");
}

#[tokio::test]
async fn test_unchanged_etag_returns_304() {
    let harness = Harness::ready(records());
    let response = harness
        .get(
            "/config/v1/agents?service.name=opbeans&service.environment=production",
            Some("\"abc123\""),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[header::ETAG], "\"abc123\"");
}

#[tokio::test]
async fn test_weak_etag_returns_304() {
    let harness = Harness::ready(records());
    let response = harness
        .get(
            "/config/v1/agents?service.name=opbeans&service.environment=production",
            Some("W/\"abc123\""),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_stale_etag_returns_200() {
    let harness = Harness::ready(records());
    let response = harness
        .get(
            "/config/v1/agents?service.name=opbeans&service.environment=production",
            Some("\"old\""),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_match_returns_404() {
    let harness = Harness::ready(vec![ConfigRecord::new("opbeans", "production", "abc")]);
    let response = harness.get("/config/v1/agents?service.name=other", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fallback_record_applies_to_unknown_service() {
    let harness = Harness::ready(records());
    let response = harness.get("/config/v1/agents?service.name=other", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["source"]["etag"], "fallback");
}

#[tokio::test]
async fn test_missing_service_name_returns_400() {
    let harness = Harness::ready(records());

    let response = harness.get("/config/v1/agents", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = harness.get("/config/v1/agents?service.name=", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "service.name is required");
}

#[tokio::test]
async fn test_health_reports_state_and_snapshot() {
    let harness = Harness::new();

    let response = harness.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(health.status, "not_ready");
    assert_eq!(health.records, 0);
    assert!(health.refreshed_at.is_none());

    harness.cache.publish(Snapshot::new(records()));
    harness.gate.mark_ready();

    let response = harness.get("/health", None).await;
    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(health.status, "ready");
    assert_eq!(health.records, 2);
    assert!(health.refreshed_at.is_some());
}
