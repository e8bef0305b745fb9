use crate::record::LogRecord;
use async_trait::async_trait;

/// Asynchronous destination for batches of [`LogRecord`]s.
///
/// Implementations are responsible for transporting records to a concrete
/// backend (MongoDB, OpenSearch, in-memory). The writer calls
/// `insert_many` from the scheduler's background task and never from the
/// HTTP serving path. Implementations are shared process-wide behind an
/// `Arc` and must tolerate concurrent calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert an ordered batch of records.
    ///
    /// **Parameters**
    /// - `records`: fully-populated [`LogRecord`]s, in insertion order.
    ///
    /// **Returns**
    /// - `Ok(n)` with the number of documents the backend accepted.
    /// - `Err(..)` if the backend was unreachable, rejected the write or
    ///   the records could not be serialized. The writer logs this and
    ///   treats the tick as failed; nothing is retried.
    async fn insert_many(&self, records: &[LogRecord]) -> Result<usize, StoreError>;

    /// Check that the backend is reachable.
    ///
    /// Called once at startup so that a bad connection string fails the
    /// process instead of every tick. Default implementation is a no-op.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Short human-readable description of the target, used in log lines.
    fn describe(&self) -> String;
}

/// Failure reported by a [`DocumentStore`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("could not reach document store: {0}")]
    Connect(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("could not serialize log records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store rejected the batch: {0}")]
    Rejected(String),
}
