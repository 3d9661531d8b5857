//! HTTP error rendering.
//!
//! Every failure leaves the server as JSON: `{"error": ..., "details"?: ...}`.

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use daybook_core::Error;
use serde_json::json;
use tracing::{debug, error};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Completion API answered with a non-2xx status; mirrored to the client.
    Upstream { status: u16, detail: String },
    BadGateway(String),
    ServiceUnavailable(String),
    EndpointUnresolved,
    Transport(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        debug!(subsystem = "api", kind = err.kind(), error = %err, "Request failed");
        match err {
            Error::NoFile => ApiError::BadRequest("No file uploaded".to_string()),
            Error::PayloadTooLarge { size, limit } => ApiError::BadRequest(format!(
                "File too large: {} bytes exceeds the {} byte limit",
                size, limit
            )),
            Error::InvalidRequest(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::UpstreamError { status, detail } => ApiError::Upstream { status, detail },
            Error::UpstreamContractViolation(msg) => ApiError::BadGateway(msg),
            Error::NotConfigured(msg) => ApiError::ServiceUnavailable(msg),
            Error::EndpointUnresolved => ApiError::EndpointUnresolved,
            Error::TransportError(msg) => ApiError::Transport(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Not found: {}", msg), None),
            ApiError::Upstream { status, detail } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let reason = status.canonical_reason().unwrap_or("unknown status");
                (status, format!("Completion API error: {}", reason), Some(detail))
            }
            ApiError::BadGateway(detail) => (
                StatusCode::BAD_GATEWAY,
                "Completion API returned an unexpected response".to_string(),
                Some(detail),
            ),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            ApiError::EndpointUnresolved => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server URL is not available yet".to_string(),
                None,
            ),
            ApiError::Transport(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Completion API unreachable".to_string(),
                Some(detail),
            ),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Unhandled internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(details) => json!({ "error": message, "details": details }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
