use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

/// A unit of recurring work driven by the [`Scheduler`].
///
/// `run` has no error channel on purpose: a job contains its own failures
/// and reports them through logging. A panic is still caught by the
/// scheduler and does not end the schedule.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Stable identifier, unique within one scheduler.
    fn id(&self) -> &str;

    async fn run(&self);
}

/// Identifier returned by [`Scheduler::schedule`].
pub type JobId = String;

/// Counters shared between a job's ticker task and its handle.
#[derive(Debug, Default)]
pub struct TickStats {
    /// Ticks that started running the job.
    pub fired: AtomicU64,
    /// Ticks whose job panicked.
    pub panicked: AtomicU64,
}

/// Handle to one registered job.
///
/// Dropping the handle closes the stop channel, which ends the ticker
/// after any in-flight tick.
pub struct JobHandle {
    id: JobId,
    interval: Duration,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    stats: Arc<TickStats>,
}

impl JobHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ticks(&self) -> u64 {
        self.stats.fired.load(Ordering::Relaxed)
    }

    pub fn panics(&self) -> u64 {
        self.stats.panicked.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the ticker to stop and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!(job = %self.id, error = %e, "scheduler task ended abnormally");
        }
    }
}

/// Process-wide timer that fires registered jobs at a fixed period.
///
/// Each job gets its own tokio task, fully independent of whatever serves
/// HTTP. Ticks of one job are serialized: the first tick fires immediately
/// on registration and the ticker awaits the job before polling the next
/// tick. Fires missed during a slow run are dropped; a single catch-up
/// tick runs once it finishes, then the regular cadence resumes.
#[derive(Default)]
pub struct Scheduler {
    jobs: HashMap<JobId, JobHandle>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` to run every `interval` until stopped.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// **Returns**
    /// - `Ok(id)` once the ticker task has been spawned.
    /// - `Err(ScheduleError::ZeroInterval)` if `interval` is zero.
    /// - `Err(ScheduleError::DuplicateId)` if a job with the same id is
    ///   already registered.
    pub fn schedule(
        &mut self,
        interval: Duration,
        job: Arc<dyn Job>,
    ) -> Result<JobId, ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        let id = job.id().to_string();
        if self.jobs.contains_key(&id) {
            return Err(ScheduleError::DuplicateId(id));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let stats = Arc::new(TickStats::default());
        let task = tokio::spawn(run_ticker(job, interval, stop_rx, Arc::clone(&stats)));

        info!(job = %id, ?interval, "scheduled job");
        self.jobs.insert(
            id.clone(),
            JobHandle {
                id: id.clone(),
                interval,
                stop: Some(stop_tx),
                task,
                stats,
            },
        );
        Ok(id)
    }

    pub fn handle(&self, id: &str) -> Option<&JobHandle> {
        self.jobs.get(id)
    }

    /// Number of ticks fired so far for `id`.
    pub fn ticks(&self, id: &str) -> Option<u64> {
        self.jobs.get(id).map(JobHandle::ticks)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Stop one job cleanly. Returns `false` if no such job was registered.
    pub async fn stop(&mut self, id: &str) -> bool {
        match self.jobs.remove(id) {
            Some(handle) => {
                handle.stop().await;
                info!(job = %id, "stopped job");
                true
            }
            None => false,
        }
    }

    /// Stop every registered job.
    pub async fn shutdown(&mut self) {
        for (id, handle) in self.jobs.drain() {
            handle.stop().await;
            info!(job = %id, "stopped job");
        }
    }
}

async fn run_ticker(
    job: Arc<dyn Job>,
    interval: Duration,
    mut stop: oneshot::Receiver<()>,
    stats: Arc<TickStats>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            // Fires on an explicit stop and when the handle is dropped.
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let tick = stats.fired.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(job = %job.id(), tick, "tick");

                // Run the body on its own task so a panic surfaces as a
                // JoinError here instead of unwinding through the ticker.
                let body = Arc::clone(&job);
                let run = tokio::spawn(async move { body.run().await });
                if let Err(e) = run.await {
                    stats.panicked.fetch_add(1, Ordering::Relaxed);
                    error!(
                        job = %job.id(),
                        tick,
                        error = %e,
                        "job tick aborted; schedule continues"
                    );
                }
            }
        }
    }
    debug!(job = %job.id(), "ticker exited");
}

/// Error returned when a job cannot be registered.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("job interval must be greater than zero")]
    ZeroInterval,

    #[error("a job with id {0:?} is already scheduled")]
    DuplicateId(JobId),
}
