use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::storage::{KvStore, StoreError};

/// Redis-backed [`KvStore`]. Values are stored as plain strings under their key.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: MultiplexedConnection,
}

impl RedisKvStore {
    pub async fn connect(client: &redis::Client) -> Result<Self, StoreError> {
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;
        info!("Redis connection established");
        Ok(Self { conn })
    }
}

fn map_redis_error(err: redis::RedisError) -> StoreError {
    StoreError::Kv(err.to_string())
}

/// Keys fetched per MGET round trip.
const MGET_CHUNK: usize = 100;

/// Pairs keys with their MGET values, skipping keys deleted since the SCAN.
fn present_entries(keys: &[String], values: Vec<Option<String>>) -> Vec<(String, String)> {
    keys.iter()
        .zip(values)
        .filter_map(|(key, value)| value.map(|v| (key.clone(), v)))
        .collect()
}

/// Escapes glob metacharacters so a literal prefix can be used as a SCAN pattern.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(map_redis_error)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut conn = self.conn.clone();
        let pattern = scan_pattern(prefix);

        let mut keys = Vec::new();
        {
            let mut iter = conn
                .scan_match::<_, String>(&pattern)
                .await
                .map_err(map_redis_error)?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }
        // SCAN may return a key more than once.
        keys.sort();
        keys.dedup();

        let mut entries = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(MGET_CHUNK) {
            let values: Vec<Option<String>> = redis::cmd("MGET")
                .arg(chunk)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;
            entries.extend(present_entries(chunk, values));
        }
        debug!("Listed {} keys under prefix {prefix:?}", entries.len());
        Ok(entries)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(map_redis_error)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_pattern_appends_wildcard() {
        assert_eq!(scan_pattern("resume:"), "resume:*");
    }

    #[test]
    fn test_scan_pattern_escapes_glob_characters() {
        assert_eq!(scan_pattern("a*b?[c]"), "a\\*b\\?\\[c\\]*");
    }

    #[test]
    fn test_present_entries_skips_vanished_keys() {
        let keys = vec![
            "resume:a".to_string(),
            "resume:b".to_string(),
            "resume:c".to_string(),
        ];
        let values = vec![Some("{}".to_string()), None, Some("[]".to_string())];
        assert_eq!(
            present_entries(&keys, values),
            vec![
                ("resume:a".to_string(), "{}".to_string()),
                ("resume:c".to_string(), "[]".to_string()),
            ]
        );
    }
}
