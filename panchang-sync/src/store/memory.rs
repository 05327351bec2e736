//! In-memory almanac store with an optional byte budget

use super::{AlmanacStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Record {
    namespace: String,
    value: String,
}

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Record>>,
    capacity_bytes: Option<usize>,
}

impl MemoryStore {
    /// Unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose record values may total at most `capacity_bytes`
    pub fn with_capacity_bytes(capacity_bytes: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AlmanacStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.read().await.get(key).map(|r| r.value.clone()))
    }

    async fn write(&self, key: &str, namespace: &str, value: String) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        if let Some(capacity) = self.capacity_bytes {
            let used: usize = records
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, r)| r.value.len())
                .sum();
            if used + value.len() > capacity {
                return Err(StoreError::CapacityExceeded);
            }
        }

        records.insert(
            key.to_string(),
            Record {
                namespace: namespace.to_string(),
                value,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn clear(&self, namespace: &str) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.namespace != namespace);
        Ok((before - records.len()) as u64)
    }
}
