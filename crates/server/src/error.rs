//! HTTP error taxonomy
//!
//! Only two categories are hard errors: missing API-key configuration
//! and malformed request bodies. Everything else the handlers map to a
//! best-effort reply or a user-readable message distinguishing the
//! cause ("API key" / "model unavailable" / "rate limit" / "database
//! connectivity").

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use city_living_agent::AgentError;
use city_living_store::StoreError;

/// User-facing error payload: `{ error, details }` with a status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: String,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: error.into(),
            details: "No such resource".to_string(),
        }
    }

    pub fn missing_api_key() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "API key is missing. Please check your environment variables.".to_string(),
            details: "GEMINI_API_KEY is not configured".to_string(),
        }
    }

    pub fn rate_limited() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            error: "Rate limit exceeded. Please try again later.".to_string(),
            details: "The generative service is throttling requests".to_string(),
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "An error occurred while processing your request".to_string(),
            details: details.into(),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::RateLimited => Self::rate_limited(),
            AgentError::InvalidTranscript(details) => Self::bad_request(
                "Invalid request body. Must include a messages array.",
                details,
            ),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::not_found(format!("Listing not found: {}", id)),
            StoreError::Unavailable(details) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: "Database connectivity issue. Please try again later.".to_string(),
                details,
            },
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.error, details = %self.details, "Request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.error, "Request rejected");
        }

        (
            self.status,
            Json(json!({
                "error": self.error,
                "details": self.details,
            })),
        )
            .into_response()
    }
}
