use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Builder as S3ConfigBuilder, primitives::ByteStream, Client as S3Client};
use bytes::Bytes;
use tracing::{info, instrument};

use super::{ObjectStorage, StorageError, StoredObject, UploadOptions};
use crate::config::StorageConfig;

/// S3 compatible object storage
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient AWS credentials chain
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.s3_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let base_config = loader.load().await;

        let s3_config = S3ConfigBuilder::from(&base_config)
            .force_path_style(config.s3_endpoint.is_some())
            .build();

        info!(bucket = %config.bucket, "S3 storage configured");
        Self::new(S3Client::from_conf(s3_config))
    }

    async fn exists(&self, bucket: &str, path: &str) -> Result<bool, StorageError> {
        match self.client.head_object().bucket(bucket).key(path).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if not_found {
                    Ok(false)
                } else {
                    Err(StorageError::Backend(e.to_string()))
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    #[instrument(skip(self, body, options), fields(size = body.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Bytes,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError> {
        if !options.upsert && self.exists(bucket, path).await? {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }

        let size = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(path)
            .body(ByteStream::from(body))
            .content_type(&options.content_type)
            .cache_control(options.cache_control_header())
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size,
        })
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if not_found {
                    StorageError::NotFound(path.to_string())
                } else {
                    StorageError::Backend(e.to_string())
                }
            })?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(data.into_bytes())
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }
}
