//! Upload HTTP handlers.
//!
//! Photos arrive as multipart field `photo`, are stored by the asset store,
//! and are answered with an absolute URL built from the resolved endpoint.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use daybook_core::defaults::PHOTO_FIELD;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_url: String,
}

/// A file part read from a multipart body.
pub struct UploadedPart {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Map a multipart read failure to 400, naming the limit when the body
/// limit was hit.
pub fn multipart_error(e: MultipartError, max_bytes: u64) -> ApiError {
    warn!(error = %e, "Multipart read error");
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BadRequest(format!("File too large: exceeds the {} byte limit", max_bytes))
    } else {
        ApiError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

/// Read a file field fully.
pub async fn read_file_field(field: Field<'_>, max_bytes: u64) -> Result<UploadedPart, ApiError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?;
    Ok(UploadedPart {
        file_name,
        data: data.to_vec(),
    })
}

/// Store a photo and return its public URL.
///
/// # Returns
/// - 200 OK with `{fileUrl}`
/// - 400 Bad Request if no photo was sent or it exceeds 5 MiB
/// - 500 if the public endpoint is not resolved yet (nothing is stored)
pub async fn upload_photo(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let endpoint = state.endpoint.require()?;
    let mut multipart = multipart?;

    let mut photo: Option<UploadedPart> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.store.max_bytes()))?
    {
        if field.name() == Some(PHOTO_FIELD) {
            photo = Some(read_file_field(field, state.store.max_bytes()).await?);
        } else {
            debug!(field = ?field.name(), "Ignoring multipart field");
        }
    }

    let (file_name, data) = match &photo {
        Some(part) => (part.file_name.as_str(), Some(part.data.as_slice())),
        None => ("", None),
    };
    let asset = state.store.store(file_name, data).await?;
    let file_url = endpoint.url_for(&state.store.locator_for(&asset));

    Ok(Json(UploadResponse { file_url }))
}

/// List every stored upload as an absolute URL.
pub async fn list_uploads(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let endpoint = state.endpoint.require()?;
    let urls = state
        .store
        .list()
        .await?
        .iter()
        .map(|asset| endpoint.url_for(&state.store.locator_for(asset)))
        .collect();
    Ok(Json(urls))
}

/// Serve stored bytes unmodified.
///
/// Recognized images are served inline; anything else is an opaque download.
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let content = state.store.read(&name).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content.content_type),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    if !content.inline {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment"),
        );
    }

    Ok((headers, content.data))
}
