//! Object store client
//!
//! Uninterpreted key/value blob storage. The store is the sole durable
//! owner of pipeline artifacts; everything above it deals in plain bytes.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use super::PlatformError;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, PlatformError>;
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>)
        -> Result<(), PlatformError>;
    async fn head_object(&self, bucket: &str, key: &str) -> Result<(), PlatformError>;
    async fn head_bucket(&self, bucket: &str) -> Result<(), PlatformError>;
}

/// S3-backed object store.
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: S3Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, PlatformError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| PlatformError::Platform(e.to_string()))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| PlatformError::Platform(e.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), PlatformError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| PlatformError::Platform(e.to_string()))?;

        tracing::info!("Uploaded s3://{}/{}", bucket, key);
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<(), PlatformError> {
        self.client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| PlatformError::Platform(e.to_string()))?;
        Ok(())
    }

    async fn head_bucket(&self, bucket: &str) -> Result<(), PlatformError> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| PlatformError::Platform(e.to_string()))?;
        Ok(())
    }
}
