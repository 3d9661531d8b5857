//! # daybook-storage
//!
//! Durable storage for uploaded photos. [`AssetStore`] assigns each upload a
//! unique stored name and a relative locator (`/uploads/<name>`); the bytes
//! themselves go through a [`StorageBackend`].

pub mod asset_store;
pub mod file_storage;

pub use asset_store::{
    detect_content_type, locator_for_name, sanitize_filename, AssetContent, AssetStore,
    OPAQUE_CONTENT_TYPE,
};
pub use file_storage::{FilesystemBackend, StorageBackend, StoredObject};
