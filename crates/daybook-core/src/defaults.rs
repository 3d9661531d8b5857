//! Centralized default constants for daybook.
//!
//! Every crate and the binary reference these instead of defining their own
//! magic numbers. Environment variable names live next to their defaults.

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum accepted upload size (5 MiB). An upload of exactly this size is accepted.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Slack added to the request body limit for multipart framing, so an
/// oversized photo still reaches the store and is answered with 400.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// URL path prefix under which stored assets are served.
pub const UPLOADS_PATH: &str = "/uploads";

/// Multipart field carrying the photo.
pub const PHOTO_FIELD: &str = "photo";

/// Default upload directory (relative to the working directory).
pub const UPLOAD_DIR: &str = "uploads";

/// Environment variable for the upload directory.
pub const ENV_UPLOAD_DIR: &str = "UPLOAD_DIR";

/// Maximum length of the sanitized original name inside a stored name.
pub const STORED_NAME_MAX_LEN: usize = 100;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Environment variable for an optional directory of static client files.
pub const ENV_PUBLIC_DIR: &str = "PUBLIC_DIR";

/// Environment variable for the CORS origin list.
pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";

// =============================================================================
// ENDPOINT RESOLUTION
// =============================================================================

/// Environment variable for a statically configured public base URL.
pub const ENV_PUBLIC_BASE_URL: &str = "PUBLIC_BASE_URL";

/// Environment variable toggling tunnel establishment.
pub const ENV_TUNNEL_ENABLED: &str = "TUNNEL_ENABLED";

/// Environment variable for the local tunnel agent API.
pub const ENV_TUNNEL_API_URL: &str = "TUNNEL_API_URL";

/// Default local tunnel agent API (ngrok agent).
pub const TUNNEL_API_URL: &str = "http://127.0.0.1:4040";

/// Environment variable for the tunnel establishment timeout.
pub const ENV_TUNNEL_TIMEOUT_SECS: &str = "TUNNEL_TIMEOUT_SECS";

/// Upper bound on tunnel establishment.
pub const TUNNEL_TIMEOUT_SECS: u64 = 10;

/// Tunnel name registered with the agent.
pub const TUNNEL_NAME: &str = "daybook";

// =============================================================================
// COMPLETION API
// =============================================================================

/// Default completion API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default completion model (must accept image inputs).
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Default completion timeout in seconds.
pub const COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Fixed cap on generated tokens.
pub const MAX_COMPLETION_TOKENS: u32 = 150;

/// Fixed sampling temperature.
pub const TEMPERATURE: f32 = 0.7;

/// Fixed frequency penalty (discourages repeated wording).
pub const FREQUENCY_PENALTY: f32 = 0.2;

/// Fixed presence penalty (encourages covering new topics).
pub const PRESENCE_PENALTY: f32 = 0.6;

/// Default system message prepended on the wire.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Environment variable for the completion API base URL.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

/// Environment variable for the completion API key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable for the completion model.
pub const ENV_OPENAI_GEN_MODEL: &str = "OPENAI_GEN_MODEL";

/// Environment variable for the completion timeout.
pub const ENV_OPENAI_TIMEOUT: &str = "OPENAI_TIMEOUT";

/// Environment variable for the system message (empty disables it).
pub const ENV_OPENAI_SYSTEM_PROMPT: &str = "OPENAI_SYSTEM_PROMPT";

// =============================================================================
// PROMPTS
// =============================================================================

/// Instruction used when neither a note nor a photo was supplied.
pub const PROMPT_DEFAULT: &str = "generate a default report";

/// Instruction prefix when only a note was supplied.
pub const PROMPT_NOTE_ONLY: &str = "generate a report, using the following note: ";

/// Instruction used when only a photo was supplied.
pub const PROMPT_IMAGE_ONLY: &str = "generate a report describing what the attached image shows";

/// Instruction prefix when both a note and a photo were supplied.
pub const PROMPT_NOTE_AND_IMAGE: &str = "generate a report using the following note: ";
