//! Data model shared by the storage, inference, and API crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ASSETS
// =============================================================================

/// A binary accepted by the asset store. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    /// Unique name under which the bytes are stored.
    pub stored_name: String,
    /// Name supplied by the client.
    pub original_name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ENDPOINT
// =============================================================================

/// How the externally reachable base URL was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSource {
    /// Configured by the operator.
    Static,
    /// Assigned by a tunnel relay.
    Tunnel,
    /// Local bind address; not reachable from outside this host.
    LocalFallback,
}

impl EndpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointSource::Static => "static",
            EndpointSource::Tunnel => "tunnel",
            EndpointSource::LocalFallback => "local_fallback",
        }
    }
}

/// The process-wide public address of this service. Set once, then read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEndpoint {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub established_at: DateTime<Utc>,
    pub source: EndpointSource,
}

impl ServiceEndpoint {
    pub fn new(base_url: impl Into<String>, source: EndpointSource) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            established_at: Utc::now(),
            source,
        }
    }

    /// Whether a remote service can fetch URLs built from this endpoint.
    pub fn externally_reachable(&self) -> bool {
        self.source != EndpointSource::LocalFallback
    }

    /// Join a relative locator (`/uploads/x.jpg`) onto the base URL.
    pub fn url_for(&self, locator: &str) -> String {
        format!("{}/{}", self.base_url, locator.trim_start_matches('/'))
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Author of a message in the completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Absolute image reference as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multimodal message.
///
/// Serializes to the chat-completions wire shape:
/// `{"type":"text","text":…}` or `{"type":"image_url","image_url":{"url":…}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename = "image_url")]
    ImageRef {
        image_url: ImageUrl,
    },
}

impl ContentPart {
    pub fn text(value: impl Into<String>) -> Self {
        ContentPart::Text { text: value.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageRef {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// A message with its ordered parts. Part order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(rename = "content", deserialize_with = "parts_from_content")]
    pub parts: Vec<ContentPart>,
}

impl Message {
    pub fn user(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            parts: vec![ContentPart::text(text)],
        }
    }
}

/// Accept either a bare string or a list of parts for `content`.
fn parts_from_content<'de, D>(deserializer: D) -> std::result::Result<Vec<ContentPart>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Content {
        Plain(String),
        Parts(Vec<ContentPart>),
    }

    Ok(match Content::deserialize(deserializer)? {
        Content::Plain(text) => vec![ContentPart::text(text)],
        Content::Parts(parts) => parts,
    })
}

// =============================================================================
// COMPLETION
// =============================================================================

/// Successful completion. Lives only for one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub finish_reason: Option<String>,
}
