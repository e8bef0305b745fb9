use crate::record::LogRecord;
use crate::store::{DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A store that keeps every inserted document in process memory.
///
/// Records are kept in their serialized JSON form so callers observe
/// exactly what a real backend would receive. Useful for local runs
/// (`memory://`) and as a test double. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all documents inserted so far, oldest first.
    pub async fn documents(&self) -> Vec<Value> {
        self.documents.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_many(&self, records: &[LogRecord]) -> Result<usize, StoreError> {
        // Serialize the whole batch before touching the vector so a bad
        // record leaves nothing behind.
        let batch = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let inserted = batch.len();
        self.documents.lock().await.extend(batch);
        Ok(inserted)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ERROR_LOG_ID, INFO_LOG_ID};
    use chrono::Utc;

    #[tokio::test]
    async fn keeps_documents_in_insertion_order() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let batch = vec![
            LogRecord::info("demo", INFO_LOG_ID, now, "first").unwrap(),
            LogRecord::error("demo", ERROR_LOG_ID, now, "disk", "full").unwrap(),
        ];

        assert_eq!(store.insert_many(&batch).await.unwrap(), 2);
        assert_eq!(store.insert_many(&batch[..1]).await.unwrap(), 1);

        let docs = store.documents().await;
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0]["Log_id"], 1);
        assert_eq!(docs[1]["Log_id"], 2);
        assert_eq!(docs[2]["Values"]["message"], "first");
    }

    #[tokio::test]
    async fn clones_share_documents() {
        let store = MemoryStore::new();
        let handle = store.clone();
        let record = LogRecord::info("demo", INFO_LOG_ID, Utc::now(), "hi").unwrap();

        store.insert_many(&[record]).await.unwrap();
        assert_eq!(handle.len().await, 1);
        assert!(!handle.is_empty().await);
    }
}
