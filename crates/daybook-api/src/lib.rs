//! # daybook-api
//!
//! HTTP surface for daybook: photo uploads, the report completion endpoint,
//! and discovery of the service's public base URL.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /uploads` | store multipart field `photo`, answer `{fileUrl}` |
//! | `GET /uploads` | absolute URLs of every stored photo |
//! | `GET /uploads/:name` | stored bytes, unmodified |
//! | `GET /server-url` | resolved public base URL |
//! | `POST /api/completion` | generate a report, answer `{result}` |
//! | `GET /health` | liveness |

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use daybook_core::defaults::{MAX_UPLOAD_BYTES, MULTIPART_OVERHEAD_BYTES};
use daybook_core::CompletionBackend;
use daybook_storage::AssetStore;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use uuid::Uuid;

pub use config::ServerConfig;
pub use error::ApiError;
pub use services::{EndpointResolver, NgrokAgentTunnel, TunnelProvider};

/// Shared handler state. Everything inside is immutable or internally
/// synchronized, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AssetStore>,
    pub endpoint: Arc<EndpointResolver>,
    pub backend: Arc<dyn CompletionBackend>,
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Parse `ALLOWED_ORIGINS`. `None` means any origin (`*` or empty).
///
/// ```text
/// ALLOWED_ORIGINS=https://reports.example.com,http://localhost:5173
/// ```
pub fn parse_allowed_origins(raw: &str) -> Option<Vec<HeaderValue>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "*" {
        return None;
    }

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let origin = match parse_allowed_origins(allowed_origins) {
        Some(list) => AllowOrigin::list(list),
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/health", get(handlers::system::health_check))
        .route("/server-url", get(handlers::system::server_url))
        .route(
            "/uploads",
            post(handlers::uploads::upload_photo).get(handlers::uploads::list_uploads),
        )
        .route("/uploads/:name", get(handlers::uploads::serve_upload))
        .route(
            "/api/completion",
            post(handlers::completion::create_completion),
        );

    let app = match &config.public_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.fallback(handlers::system::not_found),
    };

    app
        // Oversized photos must still reach the store to be answered with 400
        .layer(DefaultBodyLimit::max(
            MAX_UPLOAD_BYTES as usize + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_and_empty_origins_mean_any() {
        assert!(parse_allowed_origins("*").is_none());
        assert!(parse_allowed_origins("").is_none());
        assert!(parse_allowed_origins(" , ").is_none());
    }

    #[test]
    fn test_origin_list_parsing() {
        let origins =
            parse_allowed_origins("https://reports.example.com, http://localhost:5173").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://reports.example.com");
        assert_eq!(origins[1], "http://localhost:5173");
    }
}
