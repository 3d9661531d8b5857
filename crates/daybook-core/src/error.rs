//! Error types for daybook.

use thiserror::Error;

/// Result type alias using daybook's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for daybook operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Upload call carried no binary (or an empty one)
    #[error("No file uploaded")]
    NoFile,

    /// Upload exceeds the size limit
    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// The externally reachable base URL has not been resolved yet
    #[error("Server endpoint is not ready")]
    EndpointUnresolved,

    /// Malformed message list or request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Completion API answered with a non-2xx status
    #[error("Completion API returned {status}")]
    UpstreamError { status: u16, detail: String },

    /// Completion API answered 2xx but without the expected fields
    #[error("Unexpected completion API response: {0}")]
    UpstreamContractViolation(String),

    /// No response reached us from the completion API
    #[error("Transport error: {0}")]
    TransportError(String),

    /// A required collaborator (API key, backend) is not configured
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable snake_case tag for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NoFile => "no_file",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::EndpointUnresolved => "endpoint_unresolved",
            Error::InvalidRequest(_) => "invalid_request",
            Error::UpstreamError { .. } => "upstream_error",
            Error::UpstreamContractViolation(_) => "upstream_contract_violation",
            Error::TransportError(_) => "transport_error",
            Error::NotConfigured(_) => "not_configured",
            Error::NotFound(_) => "not_found",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
