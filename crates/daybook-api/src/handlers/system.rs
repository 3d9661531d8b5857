//! Health and endpoint discovery handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub endpoint_ready: bool,
}

/// Liveness probe. Does not call the completion API.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        endpoint_ready: state.endpoint.current().is_some(),
    })
}

#[derive(Debug, Serialize)]
pub struct ServerUrlResponse {
    pub url: String,
    pub source: &'static str,
    /// False for the local fallback: photo URLs will not be fetchable by the
    /// completion API.
    pub externally_reachable: bool,
}

/// The resolved public base URL; 500 until resolution completes.
pub async fn server_url(State(state): State<AppState>) -> Result<Json<ServerUrlResponse>, ApiError> {
    let endpoint = state.endpoint.require()?;
    Ok(Json(ServerUrlResponse {
        url: endpoint.base_url.clone(),
        source: endpoint.source.as_str(),
        externally_reachable: endpoint.externally_reachable(),
    }))
}

/// JSON 404 for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".to_string())
}
