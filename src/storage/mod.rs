//! Object storage collaborator
//!
//! The upload pipeline only needs three capabilities from a store: put an
//! object under a key, derive its public URL, and remove keys. Backends
//! implement [`ObjectStorage`]; the pipeline never touches them otherwise.

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::{MemoryStorage, StoredBlob};

use crate::constants::CACHE_CONTROL;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object already exists: {bucket}/{key}")]
    AlreadyExists { bucket: String, key: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Per-object write options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    /// `Cache-Control` max-age, in seconds
    pub cache_control: String,
    /// When false, writing to an existing key fails with `AlreadyExists`
    pub overwrite: bool,
    pub content_type: Option<String>,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            cache_control: CACHE_CONTROL.to_string(),
            overwrite: false,
            content_type: None,
        }
    }
}

/// Location of a stored object, relative to its bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> StorageResult<StoredObject>;

    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Removes `keys`. Keys that do not exist are skipped silently.
    async fn remove(&self, bucket: &str, keys: &[String]) -> StorageResult<()>;
}

#[async_trait]
impl<T: ObjectStorage + ?Sized> ObjectStorage for std::sync::Arc<T> {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> StorageResult<StoredObject> {
        (**self).put(bucket, key, data, options).await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        (**self).public_url(bucket, key)
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> StorageResult<()> {
        (**self).remove(bucket, keys).await
    }
}

/// Rejects keys that could escape the bucket
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// `{base_url}/{bucket}/{key}` without doubled slashes
pub(crate) fn join_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), bucket, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_options_default() {
        let options = PutOptions::default();
        assert_eq!(options.cache_control, "3600");
        assert!(!options.overwrite);
        assert_eq!(options.content_type, None);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("squat_1.png").is_ok());
        assert!(validate_key("nested/squat_1.png").is_ok());

        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key("../etc/passwd"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key("/abs.png"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key("a\\b.png"), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://cdn.example.com/", "images", "a.png"),
            "https://cdn.example.com/images/a.png"
        );
        assert_eq!(
            join_url("https://cdn.example.com", "images", "a.png"),
            "https://cdn.example.com/images/a.png"
        );
    }
}
