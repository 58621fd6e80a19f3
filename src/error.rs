use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures inside the whale pipeline.
///
/// `ConfigurationMissing` and `UpstreamUnavailable` never reach a caller:
/// the fetchers log them and hand back their fallback value instead.
/// Only `Internal` is surfaced, as an HTTP 500.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for MonitorError {
    fn from(e: reqwest::Error) -> Self {
        MonitorError::UpstreamUnavailable(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
