//! Errors returned by the HTTP handlers.

use agentcfg::FetchError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Why an agent configuration request could not be answered.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The request did not name a service.
    #[error("service.name is required")]
    MissingServiceName,

    /// The cache cannot serve lookups yet, or never will.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingServiceName => StatusCode::BAD_REQUEST,
            Self::Fetch(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
