//! Asset store: persists uploaded photos under collision-resistant names.
//!
//! Stored names have the form `<unix-millis>-<sequence>-<sanitized-name>`,
//! e.g. `1760861512345-7-dog.jpg`. The sequence is a process-wide counter, so
//! two uploads of the same name in the same millisecond still differ; a name
//! already present on disk (another process, clock skew) bumps the sequence.

use chrono::{DateTime, TimeZone, Utc};
use daybook_core::defaults::{MAX_UPLOAD_BYTES, STORED_NAME_MAX_LEN, UPLOADS_PATH};
use daybook_core::{Error, Result, UploadedAsset};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::file_storage::{StorageBackend, TEMP_SUFFIX};

/// Attempts at finding a free name before giving up.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Served for anything that is not a recognized image.
pub const OPAQUE_CONTENT_TYPE: &str = "application/octet-stream";

/// Image types browsers may render inline.
const INLINE_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heif",
    "image/avif",
    "image/bmp",
];

/// Bytes of a stored asset together with the type it should be served as.
#[derive(Debug, Clone)]
pub struct AssetContent {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    /// False when the bytes must be offered as a download.
    pub inline: bool,
}

/// Persists uploaded binaries and hands out relative locators for them.
pub struct AssetStore {
    backend: Box<dyn StorageBackend>,
    max_bytes: u64,
    sequence: AtomicU64,
}

impl AssetStore {
    /// Create a store over `backend` with the default 5 MiB limit.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            max_bytes: MAX_UPLOAD_BYTES,
            sequence: AtomicU64::new(0),
        }
    }

    /// Override the size limit.
    pub fn with_limit(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Store an uploaded binary.
    ///
    /// # Errors
    ///
    /// - `Error::NoFile` if `data` is absent or empty
    /// - `Error::PayloadTooLarge` if `data` exceeds the limit
    pub async fn store(&self, original_name: &str, data: Option<&[u8]>) -> Result<UploadedAsset> {
        let data = match data {
            Some(d) if !d.is_empty() => d,
            _ => return Err(Error::NoFile),
        };

        let size_bytes = data.len() as u64;
        if size_bytes > self.max_bytes {
            return Err(Error::PayloadTooLarge {
                size: size_bytes,
                limit: self.max_bytes,
            });
        }

        let start = Instant::now();
        self.backend.ensure_root().await?;

        let safe_name = sanitize_filename(original_name);
        let created_at = Utc::now();
        let stored_name = self.free_name(created_at, &safe_name).await?;

        self.backend.write(&stored_name, data).await?;

        info!(
            subsystem = "storage",
            op = "store",
            asset = %stored_name,
            size_bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Stored uploaded asset"
        );

        Ok(UploadedAsset {
            stored_name,
            original_name: original_name.to_string(),
            size_bytes,
            created_at,
        })
    }

    async fn free_name(&self, created_at: DateTime<Utc>, safe_name: &str) -> Result<String> {
        let millis = created_at.timestamp_millis();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}-{}-{}", millis, seq, safe_name);
            if !self.backend.exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!(subsystem = "storage", candidate = %candidate, "Stored name taken, advancing sequence");
        }
        Err(Error::Internal(format!(
            "no free stored name for '{}' after {} attempts",
            safe_name, MAX_NAME_ATTEMPTS
        )))
    }

    /// Relative locator under which the asset is served.
    pub fn locator_for(&self, asset: &UploadedAsset) -> String {
        locator_for_name(&asset.stored_name)
    }

    /// Read the stored bytes unmodified.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for unknown or unsafe names.
    pub async fn read(&self, stored_name: &str) -> Result<AssetContent> {
        if !is_servable_name(stored_name) || !self.backend.exists(stored_name).await? {
            return Err(Error::NotFound(format!("asset '{}'", stored_name)));
        }
        let data = self.backend.read(stored_name).await?;
        let content_type = detect_content_type(&data);
        let inline = content_type != OPAQUE_CONTENT_TYPE;
        debug!(subsystem = "storage", op = "read", asset = %stored_name, size_bytes = data.len(), content_type, "Read asset");
        Ok(AssetContent {
            data,
            content_type,
            inline,
        })
    }

    /// All stored assets, oldest first.
    pub async fn list(&self) -> Result<Vec<UploadedAsset>> {
        let mut objects = self.backend.list().await?;
        objects.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(objects
            .into_iter()
            .map(|obj| {
                let (created_at, original_name) = parse_stored_name(&obj.name)
                    .unwrap_or((obj.modified, obj.name.clone()));
                UploadedAsset {
                    stored_name: obj.name,
                    original_name,
                    size_bytes: obj.size_bytes,
                    created_at,
                }
            })
            .collect())
    }
}

/// Locator for a stored name: `/uploads/<stored_name>`.
pub fn locator_for_name(stored_name: &str) -> String {
    format!("{}/{}", UPLOADS_PATH, stored_name)
}

/// Split `<millis>-<seq>-<name>` back into its timestamp and original part.
fn parse_stored_name(stored_name: &str) -> Option<(DateTime<Utc>, String)> {
    let mut parts = stored_name.splitn(3, '-');
    let millis: i64 = parts.next()?.parse().ok()?;
    let _seq: u64 = parts.next()?.parse().ok()?;
    let name = parts.next()?.to_string();
    let created_at = Utc.timestamp_millis_opt(millis).single()?;
    Some((created_at, name))
}

fn is_servable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with(TEMP_SUFFIX)
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Sanitize an original filename for use inside a stored name.
///
/// Strips path components, replaces anything outside `[A-Za-z0-9._-]` with
/// `_`, and truncates long names while keeping the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect();

    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_') {
        return "upload".to_string();
    }

    if sanitized.len() > STORED_NAME_MAX_LEN {
        // ASCII only at this point, byte slicing is safe
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < STORED_NAME_MAX_LEN {
                let stem = &sanitized[..STORED_NAME_MAX_LEN - ext.len()];
                return format!("{}{}", stem, ext);
            }
        }
        return sanitized[..STORED_NAME_MAX_LEN].to_string();
    }

    sanitized.to_string()
}

/// Detect the content type to serve from magic bytes alone.
///
/// The stored name is client-chosen and never decides the type. Bytes that
/// are not one of the inline image types are opaque, including HTML or SVG
/// uploaded as `dog.jpg`.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    infer::get(data)
        .map(|kind| kind.mime_type())
        .filter(|mime| INLINE_IMAGE_TYPES.contains(mime))
        .unwrap_or(OPAQUE_CONTENT_TYPE)
}
