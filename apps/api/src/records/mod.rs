//! RecordStore: the résumé record schema mapped onto the key-value store.
//!
//! Every record lives under `resume:<id>` as one JSON string. `save` is a plain
//! overwrite; the pipeline relies on that to finalize a pending record in place.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::resume::ResumeRecord;
use crate::storage::{KvStore, StoreError};

pub const RECORD_PREFIX: &str = "resume:";

pub fn record_key(id: Uuid) -> String {
    format!("{RECORD_PREFIX}{id}")
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to encode resume record {id}: {source}")]
    Encode {
        id: Uuid,
        source: serde_json::Error,
    },

    #[error("Stored value under {key} is not a valid resume record: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KvStore>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Writes the record under its key, replacing whatever was there.
    pub async fn save(&self, record: &ResumeRecord) -> Result<(), RecordError> {
        let value = serde_json::to_string(record).map_err(|source| RecordError::Encode {
            id: record.id,
            source,
        })?;
        let key = record_key(record.id);
        self.kv.set(&key, &value).await?;
        debug!("Saved {key} ({} bytes)", value.len());
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ResumeRecord>, RecordError> {
        let key = record_key(id);
        match self.kv.get(&key).await? {
            Some(value) => decode(&key, &value).map(Some),
            None => Ok(None),
        }
    }

    /// All records under the namespace. Order follows the store and is not stable.
    /// Values that no longer decode are skipped rather than failing the whole listing.
    pub async fn list_all(&self) -> Result<Vec<ResumeRecord>, RecordError> {
        let entries = self.kv.list(RECORD_PREFIX).await?;
        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match decode(&key, &value) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record: {e}"),
            }
        }
        Ok(records)
    }

    /// Removes every key under the namespace and returns how many were deleted.
    pub async fn delete_all(&self) -> Result<usize, RecordError> {
        let entries = self.kv.list(RECORD_PREFIX).await?;
        let mut deleted = 0;
        for (key, _) in entries {
            if self.kv.delete(&key).await? {
                deleted += 1;
            }
        }
        info!("Deleted {deleted} resume records");
        Ok(deleted)
    }
}

fn decode(key: &str, value: &str) -> Result<ResumeRecord, RecordError> {
    serde_json::from_str(value).map_err(|source| RecordError::Decode {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use super::*;
    use crate::models::resume::{AnalysisResult, Feedback};
    use crate::storage::memory::InMemoryKvStore;

    fn make_record(company: &str) -> ResumeRecord {
        ResumeRecord::pending(
            Uuid::new_v4(),
            format!("uploads/{company}/cv.pdf"),
            format!("uploads/{company}/cv.png"),
            company.to_string(),
            "Engineer".to_string(),
            "Build things".to_string(),
        )
    }

    fn store() -> (Arc<InMemoryKvStore>, RecordStore) {
        let kv = Arc::new(InMemoryKvStore::new());
        (kv.clone(), RecordStore::new(kv))
    }

    #[test]
    fn test_record_key_format() {
        let id = Uuid::nil();
        assert_eq!(record_key(id), "resume:00000000-0000-0000-0000-000000000000");
    }

    #[tokio::test]
    async fn test_save_then_get_returns_same_record() {
        let (_, records) = store();
        let record = make_record("Acme");
        records.save(&record).await.unwrap();

        let fetched = records.get(record.id).await.unwrap();
        assert_eq!(fetched, Some(record));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_, records) = store();
        assert!(records.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_in_place() {
        let (kv, records) = store();
        let mut record = make_record("Acme");
        records.save(&record).await.unwrap();

        record.feedback = Feedback::Scored(AnalysisResult {
            overall_score: 88,
            category_scores: BTreeMap::new(),
            notes: String::new(),
        });
        records.save(&record).await.unwrap();

        assert_eq!(kv.len().await, 1);
        let fetched = records.get(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.overall_score(), Some(88));
    }

    #[tokio::test]
    async fn test_list_all_returns_each_record_once() {
        let (kv, records) = store();
        let a = make_record("Acme");
        let b = make_record("Globex");
        records.save(&a).await.unwrap();
        records.save(&b).await.unwrap();
        kv.set("session:xyz", "unrelated").await.unwrap();

        let listed = records.list_all().await.unwrap();
        let ids: HashSet<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(listed.len(), 2);
        assert_eq!(ids, HashSet::from([a.id, b.id]));
    }

    #[tokio::test]
    async fn test_list_all_skips_corrupt_values() {
        let (kv, records) = store();
        let good = make_record("Acme");
        records.save(&good).await.unwrap();
        kv.set(&record_key(Uuid::new_v4()), "{not json").await.unwrap();

        let listed = records.list_all().await.unwrap();
        assert_eq!(listed, vec![good]);
    }

    #[tokio::test]
    async fn test_get_surfaces_corrupt_value() {
        let (kv, records) = store();
        let id = Uuid::new_v4();
        kv.set(&record_key(id), "{not json").await.unwrap();

        let err = records.get(id).await.unwrap_err();
        assert!(matches!(err, RecordError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_delete_all_only_touches_namespace() {
        let (kv, records) = store();
        records.save(&make_record("Acme")).await.unwrap();
        records.save(&make_record("Globex")).await.unwrap();
        kv.set("session:xyz", "keep me").await.unwrap();

        assert_eq!(records.delete_all().await.unwrap(), 2);
        assert!(records.list_all().await.unwrap().is_empty());
        assert_eq!(kv.get("session:xyz").await.unwrap().as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn test_store_errors_are_surfaced() {
        let kv = Arc::new(InMemoryKvStore::failing_sets_after(0));
        let records = RecordStore::new(kv);
        let err = records.save(&make_record("Acme")).await.unwrap_err();
        assert!(matches!(err, RecordError::Store(StoreError::Kv(_))));
    }
}
