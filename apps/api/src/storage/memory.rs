//! In-memory stores used by the test suite in place of S3 and Redis.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::storage::{object_path, BlobRef, ContentStore, KvStore, StoreError, UploadFile};

/// Content store backed by a `HashMap`. Can be told to start failing after a
/// number of successful uploads.
#[derive(Default)]
pub struct InMemoryContentStore {
    objects: Mutex<HashMap<String, Bytes>>,
    uploads: AtomicUsize,
    fail_after: Option<usize>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows `successes` uploads, then rejects every further one.
    pub fn failing_after(successes: usize) -> Self {
        Self {
            fail_after: Some(successes),
            ..Self::default()
        }
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn upload(&self, file: &UploadFile) -> Result<BlobRef, StoreError> {
        let attempt = self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| attempt >= limit) {
            return Err(StoreError::Content("injected upload failure".to_string()));
        }
        let path = object_path(&file.name);
        self.objects
            .lock()
            .await
            .insert(path.clone(), file.data.clone());
        Ok(BlobRef { path })
    }

    async fn read(&self, path: &str) -> Result<Bytes, StoreError> {
        self.objects
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}

/// Key-value store backed by a `BTreeMap`. Writes can be switched off after a
/// number of successful `set` calls.
#[derive(Default)]
pub struct InMemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
    writes: AtomicUsize,
    fail_sets_after: Option<usize>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_sets_after(successes: usize) -> Self {
        Self {
            fail_sets_after: Some(successes),
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let attempt = self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets_after.is_some_and(|limit| attempt >= limit) {
            return Err(StoreError::Kv("injected write failure".to_string()));
        }
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .entries
            .lock()
            .await
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_content_store_read_back() {
        let store = InMemoryContentStore::new();
        let blob = store
            .upload(&UploadFile::new("cv.pdf", "application/pdf", Bytes::from_static(b"%PDF")))
            .await
            .unwrap();
        assert_eq!(store.read(&blob.path).await.unwrap(), Bytes::from_static(b"%PDF"));
    }

    #[tokio::test]
    async fn test_content_store_fails_after_limit() {
        let store = InMemoryContentStore::failing_after(1);
        let file = UploadFile::new("cv.pdf", "application/pdf", Bytes::from_static(b"%PDF"));
        assert!(store.upload(&file).await.is_ok());
        assert!(store.upload(&file).await.is_err());
        assert_eq!(store.object_count().await, 1);
    }

    #[tokio::test]
    async fn test_kv_list_respects_prefix() {
        let kv = InMemoryKvStore::new();
        kv.set("resume:a", "1").await.unwrap();
        kv.set("resume:b", "2").await.unwrap();
        kv.set("session:x", "3").await.unwrap();

        let listed = kv.list("resume:").await.unwrap();
        let keys: Vec<_> = listed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["resume:a", "resume:b"]);
    }

    #[tokio::test]
    async fn test_kv_delete_reports_presence() {
        let kv = InMemoryKvStore::new();
        kv.set("k", "v").await.unwrap();
        assert!(kv.delete("k").await.unwrap());
        assert!(!kv.delete("k").await.unwrap());
    }
}
