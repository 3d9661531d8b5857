//! OpenAI-specific error handling.
//!
//! Upstream failures are never reinterpreted for the caller: a non-2xx
//! response becomes `Error::UpstreamError` carrying the status and the body
//! verbatim. The classification here only feeds logs.

use daybook_core::Error;

use super::types::OpenAIErrorResponse;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Classify a raw error body, which may or may not be OpenAI-shaped.
    pub fn from_body(status: u16, body: &str) -> Self {
        let error_type = serde_json::from_str::<OpenAIErrorResponse>(body)
            .ok()
            .and_then(|r| r.error.code.or(r.error.error_type))
            .unwrap_or_default();
        Self::from_response(status, &error_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationError => "authentication_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ModelNotFound => "model_not_found",
            Self::ContextLengthExceeded => "context_length_exceeded",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        }
    }
}

/// Non-2xx upstream response, status and body preserved.
pub fn upstream_error(status: u16, body: String) -> Error {
    Error::UpstreamError {
        status,
        detail: body,
    }
}

/// No response reached us.
pub fn transport_error(err: &reqwest::Error, timeout_seconds: u64) -> Error {
    if err.is_timeout() {
        Error::TransportError(format!(
            "completion API did not respond within {}s",
            timeout_seconds
        ))
    } else {
        Error::TransportError(format!("completion API request failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_401() {
        let code = OpenAIErrorCode::from_response(401, "invalid_api_key");
        assert_eq!(code, OpenAIErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_429() {
        let code = OpenAIErrorCode::from_response(429, "rate_limit_exceeded");
        assert_eq!(code, OpenAIErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_error_code_from_500() {
        let code = OpenAIErrorCode::from_response(502, "bad_gateway");
        assert_eq!(code, OpenAIErrorCode::ServerError);
    }

    #[test]
    fn test_error_code_from_body() {
        let body = r#"{"error":{"message":"no","type":"invalid_request_error","code":"model_not_found"}}"#;
        assert_eq!(
            OpenAIErrorCode::from_body(400, body),
            OpenAIErrorCode::ModelNotFound
        );
        assert_eq!(
            OpenAIErrorCode::from_body(418, "not json"),
            OpenAIErrorCode::Unknown
        );
    }

    #[test]
    fn test_upstream_error_keeps_body_verbatim() {
        let body = r#"{"error":"rate_limited"}"#.to_string();
        match upstream_error(429, body.clone()) {
            Error::UpstreamError { status, detail } => {
                assert_eq!(status, 429);
                assert_eq!(detail, body);
            }
            other => panic!("Expected UpstreamError, got {:?}", other),
        }
    }
}
