//! Storage seams for the analysis service.
//!
//! Two dumb stores sit behind traits so the pipeline never knows where bytes or
//! records live:
//!
//! - [`ContentStore`]: opaque blob storage addressed by path (S3 / MinIO in production).
//! - [`KvStore`]: string keys to string values (Redis in production). No transactions,
//!   no secondary indexes, prefix listing only.
//!
//! Domain logic (record schema, key naming) lives in `records`, not here.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod redis_kv;
pub mod s3_content;

pub use redis_kv::RedisKvStore;
pub use s3_content::S3ContentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Content store error: {0}")]
    Content(String),

    #[error("Key-value store error: {0}")]
    Kv(String),
}

/// A file on its way into the content store: the uploaded résumé or its preview image.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Reference returned by [`ContentStore::upload`]. Opaque to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub path: String,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<BlobRef, StoreError>;

    async fn read(&self, path: &str) -> Result<Bytes, StoreError>;
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Returns every `(key, value)` pair whose key starts with `prefix`.
    /// Order is whatever the backend yields.
    async fn list(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Builds a fresh object path `uploads/<uuid>/<sanitized file name>`.
/// Every upload lands under its own UUID so two files with the same name never collide.
pub fn object_path(file_name: &str) -> String {
    format!("uploads/{}/{}", Uuid::new_v4(), sanitize_file_name(file_name))
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
