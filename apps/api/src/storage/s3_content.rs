use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::storage::{object_path, BlobRef, ContentStore, StoreError, UploadFile};

/// S3 / MinIO content store. Every upload gets a fresh object key, so references
/// are never overwritten.
#[derive(Clone)]
pub struct S3ContentStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ContentStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    async fn upload(&self, file: &UploadFile) -> Result<BlobRef, StoreError> {
        let key = object_path(&file.name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(file.data.clone()))
            .content_type(&file.content_type)
            .send()
            .await
            .map_err(|e| StoreError::Content(format!("S3 upload failed: {e}")))?;

        info!(
            "Uploaded {} bytes to s3://{}/{}",
            file.data.len(),
            self.bucket,
            key
        );
        Ok(BlobRef { path: key })
    }

    async fn read(&self, path: &str) -> Result<Bytes, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    StoreError::NotFound(path.to_string())
                } else {
                    StoreError::Content(format!("S3 read failed: {e}"))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Content(format!("S3 body read failed: {e}")))?;
        Ok(data.into_bytes())
    }
}
