//! Server configuration loaded from the environment.

use daybook_core::defaults::{
    ENV_ALLOWED_ORIGINS, ENV_PUBLIC_BASE_URL, ENV_PUBLIC_DIR, ENV_TUNNEL_API_URL,
    ENV_TUNNEL_ENABLED, ENV_TUNNEL_TIMEOUT_SECS, ENV_UPLOAD_DIR, SERVER_HOST, SERVER_PORT,
    TUNNEL_API_URL, TUNNEL_TIMEOUT_SECS, UPLOAD_DIR,
};
use daybook_core::{Error, Result};
use reqwest::Url;
use std::path::PathBuf;

/// Everything the HTTP server needs besides the completion backend, which
/// reads its own `OPENAI_*` variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    /// Directory of static client files served for unmatched paths.
    pub public_dir: Option<PathBuf>,
    /// Operator-provided public base URL. Takes precedence over the tunnel.
    pub public_base_url: Option<String>,
    pub tunnel_enabled: bool,
    pub tunnel_api_url: String,
    pub tunnel_timeout_secs: u64,
    /// Raw `ALLOWED_ORIGINS` value.
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.to_string(),
            port: SERVER_PORT,
            upload_dir: PathBuf::from(UPLOAD_DIR),
            public_dir: None,
            public_base_url: None,
            tunnel_enabled: true,
            tunnel_api_url: TUNNEL_API_URL.to_string(),
            tunnel_timeout_secs: TUNNEL_TIMEOUT_SECS,
            allowed_origins: "*".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `PUBLIC_BASE_URL` is set but is not an
    /// absolute http(s) URL.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let public_base_url = non_empty_var(ENV_PUBLIC_BASE_URL);
        if let Some(url) = &public_base_url {
            validate_base_url(url)?;
        }

        Ok(Self {
            host: non_empty_var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            upload_dir: non_empty_var(ENV_UPLOAD_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_dir: non_empty_var(ENV_PUBLIC_DIR).map(PathBuf::from),
            public_base_url,
            tunnel_enabled: std::env::var(ENV_TUNNEL_ENABLED)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.tunnel_enabled),
            tunnel_api_url: non_empty_var(ENV_TUNNEL_API_URL).unwrap_or(defaults.tunnel_api_url),
            tunnel_timeout_secs: std::env::var(ENV_TUNNEL_TIMEOUT_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.tunnel_timeout_secs),
            allowed_origins: std::env::var(ENV_ALLOWED_ORIGINS).unwrap_or(defaults.allowed_origins),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Check that a configured base URL is an absolute http(s) URL.
pub fn validate_base_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::Config(format!("{} '{}' is invalid: {}", ENV_PUBLIC_BASE_URL, url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
        return Err(Error::Config(format!(
            "{} must be an absolute http(s) URL, got '{}'",
            ENV_PUBLIC_BASE_URL, url
        )));
    }
    Ok(())
}
