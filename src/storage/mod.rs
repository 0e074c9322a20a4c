//! Object storage for generated documents and note images.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "s3")]
pub use s3::S3Storage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    pub cache_control_secs: u64,
    /// Overwrite an existing object at the same path
    pub upsert: bool,
}

impl UploadOptions {
    pub fn new(content_type: impl Into<String>, cache_control_secs: u64) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control_secs,
            upsert: false,
        }
    }

    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    pub fn cache_control_header(&self) -> String {
        format!("max-age={}", self.cache_control_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub size: usize,
}

/// URL the web app uses to show a stored private object inline
pub fn preview_url(bucket: &str, path: &str) -> String {
    format!("/file/preview/{}/{}", bucket, path)
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Bytes,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError>;

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub body: Bytes,
    pub content_type: String,
    pub cache_control: String,
}

/// Process-local storage used in development and tests
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    objects: DashMap<(String, String), StoredBlob>,
    failing: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every later upload fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredBlob> {
        self.objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn paths(&self, bucket: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .iter()
            .filter(|e| e.key().0 == bucket)
            .map(|e| e.key().1.clone())
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    #[instrument(skip(self, body, options), fields(size = body.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Bytes,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("in-memory storage set to fail".into()));
        }

        let key = (bucket.to_string(), path.to_string());
        if !options.upsert && self.objects.contains_key(&key) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }

        let size = body.len();
        self.objects.insert(
            key,
            StoredBlob {
                body,
                content_type: options.content_type.clone(),
                cache_control: options.cache_control_header(),
            },
        );
        debug!(bucket, path, size, "stored object");

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size,
        })
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        self.get(bucket, path)
            .map(|blob| blob.body)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.objects
            .remove(&(bucket.to_string(), path.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn pdf() -> UploadOptions {
        UploadOptions::new("application/pdf", 43_200)
    }

    #[tokio::test]
    async fn upsert_overwrites_and_plain_upload_refuses() {
        let storage = InMemoryStorage::new();
        storage
            .upload("private", "c/a.pdf", Bytes::from_static(b"v1"), &pdf())
            .await
            .unwrap();

        assert_matches!(
            storage
                .upload("private", "c/a.pdf", Bytes::from_static(b"v2"), &pdf())
                .await,
            Err(StorageError::AlreadyExists(_))
        );

        storage
            .upload("private", "c/a.pdf", Bytes::from_static(b"v2"), &pdf().upsert())
            .await
            .unwrap();
        let blob = storage.get("private", "c/a.pdf").unwrap();
        assert_eq!(blob.body, Bytes::from_static(b"v2"));
        assert_eq!(blob.cache_control, "max-age=43200");
        assert_eq!(blob.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn failing_switch_rejects_uploads() {
        let storage = InMemoryStorage::new();
        storage.set_failing(true);
        assert_matches!(
            storage
                .upload("private", "x", Bytes::new(), &pdf())
                .await,
            Err(StorageError::Backend(_))
        );
        assert!(storage.is_empty());
    }

    #[test]
    fn preview_url_points_at_bucket_path() {
        assert_eq!(
            preview_url("private", "c1/supplier-interaction/i1/a.png"),
            "/file/preview/private/c1/supplier-interaction/i1/a.png"
        );
    }
}
