//! Agent configuration and health endpoints.

use crate::error::ApiError;
use agentcfg::{AgentQuery, QueryDispatcher, ServiceMatcher};
use axum::{
    extract::{Query, State},
    http::{
        header::{ETAG, IF_NONE_MATCH},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Dispatcher shared by every handler.
pub type SharedDispatcher = Arc<QueryDispatcher<ServiceMatcher>>;

/// Query parameters of `GET /config/v1/agents`.
#[derive(Debug, Deserialize)]
pub struct AgentConfigParams {
    #[serde(rename = "service.name")]
    pub service_name: Option<String>,
    #[serde(rename = "service.environment")]
    pub service_environment: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub records: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Builds the HTTP router.
pub fn router(dispatcher: SharedDispatcher) -> Router {
    Router::new()
        .route("/config/v1/agents", get(agent_config))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(dispatcher)
}

async fn agent_config(
    State(dispatcher): State<SharedDispatcher>,
    headers: HeaderMap,
    Query(params): Query<AgentConfigParams>,
) -> Result<Response, ApiError> {
    let name = params
        .service_name
        .filter(|name| !name.is_empty())
        .ok_or(ApiError::MissingServiceName)?;

    let mut query = AgentQuery::new(name, params.service_environment.unwrap_or_default());
    query.etag = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            // weak validators compare equal to the strong etag
            let value = value.trim();
            let value = value.strip_prefix("W/").unwrap_or(value);
            value.trim_matches('"').to_string()
        });

    let result = dispatcher.fetch(&query)?;
    let Some(source) = result.source.as_ref() else {
        debug!(service = %query.service.name, "no agent configuration matched");
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let etag = format!("\"{}\"", source.etag);
    if result.is_unchanged_for(query.etag.as_deref()) {
        return Ok((StatusCode::NOT_MODIFIED, [(ETAG, etag)]).into_response());
    }
    Ok((StatusCode::OK, [(ETAG, etag)], Json(result)).into_response())
}

async fn health(State(dispatcher): State<SharedDispatcher>) -> Json<HealthResponse> {
    let snapshot = dispatcher.snapshot();
    Json(HealthResponse {
        status: dispatcher.state().as_str().to_string(),
        records: snapshot.len(),
        refreshed_at: snapshot.refreshed_at(),
    })
}
