//! Mapping from core errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use scribe_core::ScribeError;

/// Handler error: a `ScribeError` rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub ScribeError);

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(ScribeError::Validation(msg.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScribeError::Validation(_) => StatusCode::BAD_REQUEST,
            ScribeError::Summarizer(_) => StatusCode::BAD_GATEWAY,
            ScribeError::Storage(_) | ScribeError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ScribeError> for ApiError {
    fn from(err: ScribeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
