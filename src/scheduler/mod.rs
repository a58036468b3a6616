// src/scheduler/mod.rs

//! Bounded worker pool with submission-time lock-order enforcement.
//!
//! - [`validate`] holds the ordering check applied by `submit`.
//! - [`worker_loop`] owns the OS worker threads and their FIFO queue.
//! - [`task_runner`] runs one task: acquire, run, release in reverse.
//! - [`result`] defines `ExecutionResult` and `TaskHandle`.
//!
//! Per-task lifecycle: `Submitted -> Validated -> Running -> {Completed |
//! Failed | TimedOut}`, or `Submitted -> Rejected` for a task whose
//! resources are out of order. A rejected task never reaches a worker.

pub mod result;
pub mod task_runner;
pub mod validate;
pub mod worker_loop;

use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::errors::{LockstepError, Result};
use crate::task::Task;

use self::result::TaskShared;
use self::task_runner::Job;

pub use result::{ExecutionResult, TaskHandle};
pub use validate::validate_lock_order;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Deadline used when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Options fixed at scheduler construction.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Number of worker threads. Must be at least 1.
    pub workers: usize,
    /// How often a task blocked on a lock re-checks its cancellation flag.
    pub lock_poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }
}

/// Runs tasks on a fixed pool of worker threads.
///
/// Dropping the scheduler closes the queue: idle workers exit, a busy worker
/// exits after its current task. Workers are never joined.
pub struct Scheduler {
    config: SchedulerConfig,
    queue_tx: std_mpsc::Sender<Job>,
    done_rx: mpsc::UnboundedReceiver<()>,
    /// Tasks submitted since the last `await_all`, in submission order.
    pending: Vec<TaskHandle>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(LockstepError::ConfigError(
                "scheduler needs at least one worker (got 0)".to_string(),
            ));
        }

        let (queue_tx, queue_rx) = std_mpsc::channel::<Job>();
        let (done_tx, done_rx) = mpsc::unbounded_channel::<()>();
        worker_loop::spawn_workers(
            config.workers,
            queue_rx,
            done_tx,
            config.lock_poll_interval,
        )?;

        Ok(Self {
            config,
            queue_tx,
            done_rx,
            pending: Vec::new(),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate and enqueue a task.
    ///
    /// Resources must be strictly increasing by order index; otherwise this
    /// returns [`LockstepError::InvalidLockOrder`] and the task's work is
    /// dropped without ever running.
    pub fn submit(&mut self, task: Task) -> Result<TaskHandle> {
        if let Err(err) = validate_lock_order(task.id(), task.resources()) {
            warn!(task = %task.id(), error = %err, "task rejected");
            return Err(err);
        }

        let (id, resources, work) = task.into_parts();
        let shared = Arc::new(TaskShared::new(id));
        let handle = TaskHandle::new(Arc::clone(&shared));

        debug!(
            task = %shared.id(),
            resources = ?resources.iter().map(|r| r.name()).collect::<Vec<_>>(),
            "task validated; queueing"
        );

        self.queue_tx
            .send(Job {
                shared,
                resources,
                work,
            })
            .map_err(|_| LockstepError::Other(anyhow!("worker queue closed")))?;

        self.pending.push(handle.clone());
        Ok(handle)
    }

    /// Tasks submitted since the last `await_all` that have no outcome yet.
    pub fn outstanding(&self) -> usize {
        self.pending
            .iter()
            .filter(|h| !h.state().is_terminal())
            .count()
    }

    /// Set the cancellation flag of every outstanding task.
    pub fn cancel_all(&self) {
        for handle in self.pending.iter().filter(|h| !h.state().is_terminal()) {
            handle.cancel();
        }
    }

    /// Wait until every task submitted since the previous call has an
    /// outcome, or until `timeout` elapses.
    ///
    /// Results come back in submission order. Tasks without an outcome at
    /// the deadline are reported `TimedOut` and flagged for cancellation;
    /// they keep running until their next acquisition boundary or until
    /// their body returns, and whatever they produce then is discarded.
    ///
    /// Cancel-safe: outcomes are stored on the task handles as workers
    /// produce them, so dropping this future loses nothing.
    pub async fn await_all(&mut self, timeout: Duration) -> Vec<ExecutionResult> {
        let now = Instant::now();
        let deadline = now.checked_add(timeout).unwrap_or(now + FAR_FUTURE);

        while self.outstanding() > 0 {
            match timeout_at(deadline, self.done_rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => {
                    warn!("all workers exited with tasks still outstanding");
                    break;
                }
                Err(_elapsed) => {
                    info!(
                        outstanding = self.outstanding(),
                        ?timeout,
                        "await_all deadline reached"
                    );
                    break;
                }
            }
        }

        let batch = std::mem::take(&mut self.pending);

        // Settle every straggler before cancelling any of them, so a worker
        // freed by one cancellation cannot pick up a queued task of this batch.
        let timed_out: Vec<&TaskHandle> = batch
            .iter()
            .filter(|handle| handle.shared().finish(timeout_result(handle.shared(), timeout)))
            .collect();
        for handle in timed_out {
            warn!(task = %handle.id(), ?timeout, "task timed out; requesting cancellation");
            handle.cancel();
        }

        batch
            .iter()
            .map(|handle| take_result(handle, timeout))
            .collect()
    }
}

/// Take the recorded outcome of a settled handle.
fn take_result(handle: &TaskHandle, timeout: Duration) -> ExecutionResult {
    let shared = handle.shared();
    // Each handle is settled exactly once, so the result is always there.
    shared
        .take_result()
        .unwrap_or_else(|| timeout_result(shared, timeout))
}

fn timeout_result(shared: &TaskShared, timeout: Duration) -> ExecutionResult {
    ExecutionResult::timed_out(
        shared.id().to_string(),
        LockstepError::Timeout {
            task: shared.id().to_string(),
            timeout,
        },
        shared.running_for(),
    )
}
