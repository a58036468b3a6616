// src/scheduler/task_runner.rs

//! Runs one accepted task on the calling worker thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::errors::LockstepError;
use crate::registry::{Resource, ResourceGuard};
use crate::scheduler::result::{ExecutionResult, TaskShared};
use crate::task::{TaskContext, Work};
use crate::types::ExecutionStatus;

/// A validated task waiting in the worker queue.
pub(crate) struct Job {
    pub(crate) shared: Arc<TaskShared>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) work: Work,
}

/// Run a job to its outcome and record it on the shared task state.
///
/// Returns `true` if this call recorded the outcome, `false` if the task had
/// already been settled (timed out while queued or while running).
pub(crate) fn run_job(job: Job, lock_poll_interval: Duration) -> bool {
    let Job {
        shared,
        resources,
        work,
    } = job;

    if !shared.start() {
        debug!(task = %shared.id(), "task already settled before pickup; skipping");
        return false;
    }

    let started = Instant::now();
    let result = execute(&shared, resources, work, lock_poll_interval, started);
    let status = result.status;

    if shared.finish(result) {
        match status {
            ExecutionStatus::Completed => {
                info!(task = %shared.id(), elapsed = ?started.elapsed(), "task completed");
            }
            other => {
                warn!(task = %shared.id(), status = %other, "task did not complete");
            }
        }
        true
    } else {
        debug!(
            task = %shared.id(),
            status = %status,
            "late outcome for a task already reported as timed out; discarding"
        );
        false
    }
}

fn execute(
    shared: &TaskShared,
    resources: Vec<Resource>,
    work: Work,
    lock_poll_interval: Duration,
    started: Instant,
) -> ExecutionResult {
    let id = shared.id().to_string();
    let cancel = shared.cancel_flag();

    let mut guards: Vec<ResourceGuard> = Vec::with_capacity(resources.len());
    for resource in &resources {
        debug!(
            task = %id,
            resource = %resource.name(),
            order_index = resource.order_index(),
            "acquiring"
        );
        match resource.acquire(&id, cancel, lock_poll_interval) {
            Ok(guard) => guards.push(guard),
            Err(err) => {
                release_in_reverse(&id, &mut guards);
                info!(task = %id, resource = %resource.name(), "cancelled at acquisition boundary");
                return ExecutionResult::timed_out(id, err, started.elapsed());
            }
        }
    }

    let ctx = TaskContext::new(id.clone(), resources, cancel.clone());
    debug!(task = %id, held = guards.len(), "running task body");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&ctx)));

    release_in_reverse(&id, &mut guards);

    match outcome {
        Ok(Ok(())) => ExecutionResult::completed(id, started.elapsed()),
        Ok(Err(source)) => {
            let err = LockstepError::TaskExecution {
                task: id.clone(),
                source,
            };
            ExecutionResult::failed(id, err, started.elapsed())
        }
        Err(payload) => {
            let err = LockstepError::TaskExecution {
                task: id.clone(),
                source: anyhow!("panicked: {}", panic_message(payload.as_ref())),
            };
            ExecutionResult::failed(id, err, started.elapsed())
        }
    }
}

/// Drop guards last-acquired first.
fn release_in_reverse(task: &str, guards: &mut Vec<ResourceGuard>) {
    while let Some(guard) = guards.pop() {
        debug!(task, resource = %guard.resource().name(), "releasing");
        drop(guard);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
