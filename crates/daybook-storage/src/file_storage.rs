//! Storage backends for uploaded assets.
//!
//! The asset store talks to storage through [`StorageBackend`] so the
//! filesystem can later be swapped for an object store. Names handed to a
//! backend are flat (no directories) and already validated by the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_core::Result;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Suffix of in-flight writes; such entries are never listed or served.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Metadata for one stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Storage backend trait for different storage implementations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Create the backing location if absent. Idempotent.
    async fn ensure_root(&self) -> Result<()>;

    /// Write data under `name`, atomically replacing nothing partial.
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Read the exact bytes stored under `name`.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Check if data exists under `name`.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// List every stored object.
    async fn list(&self) -> Result<Vec<StoredObject>>;
}

/// Filesystem storage backend.
///
/// Stores each asset as a single file directly under `base_path`.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            warn!(path = %self.base_path.display(), error = %e, "file_storage: create_dir_all failed");
            e
        })?;
        Ok(())
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(name);
        debug!(full_path = %full_path.display(), size = data.len(), "file_storage: write");

        // Atomic write: temp file + rename
        let temp_path = self.full_path(&format!(".{}{}", name, TEMP_SUFFIX));
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "file_storage: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "file_storage: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "file_storage: rename failed");
            e
        })?;

        // rw-r--r--, never executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.full_path(name)).await?)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(name)).await?)
    }

    async fn list(&self) -> Result<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(objects),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') || name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            objects.push(StoredObject {
                name,
                size_bytes: meta.len(),
                modified,
            });
        }

        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.ensure_root().await.unwrap();

        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        backend.write("blob.bin", &data).await.unwrap();

        assert_eq!(backend.read("blob.bin").await.unwrap(), data);
        assert!(backend.exists("blob.bin").await.unwrap());
        assert!(!backend.exists("other.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_root_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path().join("nested/uploads"));
        backend.ensure_root().await.unwrap();
        backend.ensure_root().await.unwrap();
        assert!(backend.base_path().is_dir());
    }

    #[tokio::test]
    async fn test_list_skips_temp_and_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.ensure_root().await.unwrap();
        backend.write("a.jpg", b"a").await.unwrap();
        std::fs::write(dir.path().join(".b.jpg.tmp"), b"partial").unwrap();

        let names: Vec<String> = backend
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path().join("absent"));
        assert!(backend.list().await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_written_file_not_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.ensure_root().await.unwrap();
        backend.write("x.png", b"png").await.unwrap();

        let mode = std::fs::metadata(dir.path().join("x.png"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
