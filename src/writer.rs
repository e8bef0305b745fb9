use crate::record::{LogRecord, RecordError, ERROR_LOG_ID, INFO_LOG_ID};
use crate::scheduler::Job;
use crate::store::{DocumentStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// Scheduler id of the log push job.
pub const PUSH_JOB_ID: &str = "push_logs";

pub const DEMO_MESSAGE: &str = "This is demo log";
pub const DEMO_WHAT_FAILED: &str = "placeholder";
pub const DEMO_REASON: &str = "This is demo reason";

/// Builds the per-tick batch of [`LogRecord`]s and writes it to a
/// [`DocumentStore`].
///
/// [`LogWriter::push`] is the tick boundary: every failure, whether in
/// record construction, the store call or the write timeout, is logged
/// and counted there and never leaves the call.
pub struct LogWriter {
    store: Arc<dyn DocumentStore>,
    username: String,
    write_timeout: Duration,
    stats: Arc<WriteStats>,
}

impl LogWriter {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        username: impl Into<String>,
        write_timeout: Duration,
    ) -> Self {
        LogWriter {
            store,
            username: username.into(),
            write_timeout,
            stats: Arc::new(WriteStats::default()),
        }
    }

    /// Shared statistics, still readable after the writer moves into
    /// the scheduler.
    pub fn stats(&self) -> Arc<WriteStats> {
        Arc::clone(&self.stats)
    }

    /// The fixed two-record batch, both stamped with `now`.
    pub fn build_batch(&self, now: DateTime<Utc>) -> Result<Vec<LogRecord>, RecordError> {
        Ok(vec![
            LogRecord::info(&self.username, INFO_LOG_ID, now, DEMO_MESSAGE)?,
            LogRecord::error(
                &self.username,
                ERROR_LOG_ID,
                now,
                DEMO_WHAT_FAILED,
                DEMO_REASON,
            )?,
        ])
    }

    /// Build one batch and write it, bounded by the write timeout.
    ///
    /// **Returns**
    /// - `Ok(n)` with the number of documents the store accepted.
    /// - `Err(..)` describing what failed. Callers on the tick path use
    ///   [`LogWriter::push`] instead, which contains the error.
    pub async fn try_push(&self) -> Result<usize, PushError> {
        let now = Utc::now();
        let batch = self.build_batch(now)?;

        let inserted = timeout(self.write_timeout, self.store.insert_many(&batch))
            .await
            .map_err(|_| PushError::Timeout(self.write_timeout))??;

        info!(
            store = %self.store.describe(),
            inserted,
            "inserted {} logs into store",
            inserted
        );
        debug!(records = ?batch, "pushed logs");
        Ok(inserted)
    }

    /// Run one push and absorb its outcome.
    pub async fn push(&self) {
        self.stats.attempts.fetch_add(1, Ordering::Relaxed);

        match self.try_push().await {
            Ok(inserted) => {
                self.stats.successes.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .documents_written
                    .fetch_add(inserted as u64, Ordering::Relaxed);
                *self.stats.last_error.lock().await = None;
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    store = %self.store.describe(),
                    error = %e,
                    "error pushing logs to store"
                );
                *self.stats.last_error.lock().await = Some(e.to_string());
            }
        }
    }
}

#[async_trait]
impl Job for LogWriter {
    fn id(&self) -> &str {
        PUSH_JOB_ID
    }

    async fn run(&self) {
        self.push().await;
    }
}

/// Outcome counters of [`LogWriter::push`].
#[derive(Debug, Default)]
pub struct WriteStats {
    pub attempts: AtomicU64,
    pub successes: AtomicU64,
    pub failures: AtomicU64,
    pub documents_written: AtomicU64,
    /// Description of the most recent failure; cleared by a success.
    last_error: Mutex<Option<String>>,
}

impl WriteStats {
    pub async fn snapshot(&self) -> WriteStatus {
        WriteStatus {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            documents_written: self.documents_written.load(Ordering::Relaxed),
            last_error: self.last_error.lock().await.clone(),
        }
    }
}

/// Point-in-time copy of [`WriteStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteStatus {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub documents_written: u64,
    pub last_error: Option<String>,
}

/// Why a single push did not complete.
#[derive(thiserror::Error, Debug)]
pub enum PushError {
    #[error("could not build log records: {0}")]
    Record(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store write timed out after {0:?}")]
    Timeout(Duration),
}
