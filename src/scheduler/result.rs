// src/scheduler/result.rs

//! Per-task outcome records and the handle returned by `submit`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::errors::LockstepError;
use crate::task::CancelFlag;
use crate::types::{ExecutionStatus, TaskId, TaskState};

/// Final record for one accepted task.
#[derive(Debug)]
pub struct ExecutionResult {
    pub task_id: TaskId,
    pub status: ExecutionStatus,
    /// `TaskExecution` for `Failed`; `Timeout` or `Cancelled` for `TimedOut`.
    pub error: Option<LockstepError>,
    /// Time from worker pickup to outcome. Zero if the task never started.
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn completed(task_id: TaskId, elapsed: Duration) -> Self {
        Self {
            task_id,
            status: ExecutionStatus::Completed,
            error: None,
            elapsed,
        }
    }

    pub fn failed(task_id: TaskId, error: LockstepError, elapsed: Duration) -> Self {
        Self {
            task_id,
            status: ExecutionStatus::Failed,
            error: Some(error),
            elapsed,
        }
    }

    pub fn timed_out(task_id: TaskId, error: LockstepError, elapsed: Duration) -> Self {
        Self {
            task_id,
            status: ExecutionStatus::TimedOut,
            error: Some(error),
            elapsed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}

#[derive(Debug)]
struct Slot {
    state: TaskState,
    started_at: Option<Instant>,
    result: Option<ExecutionResult>,
}

/// State shared between the submitter's handle and the worker running the
/// task. The first terminal transition wins; later ones are ignored.
#[derive(Debug)]
pub(crate) struct TaskShared {
    id: TaskId,
    cancel: CancelFlag,
    slot: Mutex<Slot>,
}

impl TaskShared {
    pub(crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            cancel: CancelFlag::new(),
            slot: Mutex::new(Slot {
                state: TaskState::Validated,
                started_at: None,
                result: None,
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// `Validated -> Running`. Returns false if the task already reached a
    /// terminal state while it sat in the queue.
    pub(crate) fn start(&self) -> bool {
        let mut slot = self.slot();
        if slot.state != TaskState::Validated {
            return false;
        }
        slot.state = TaskState::Running;
        slot.started_at = Some(Instant::now());
        true
    }

    /// Record the terminal outcome unless one is already recorded.
    pub(crate) fn finish(&self, result: ExecutionResult) -> bool {
        let mut slot = self.slot();
        if slot.state.is_terminal() {
            return false;
        }
        slot.state = TaskState::Finished(result.status);
        slot.result = Some(result);
        true
    }

    /// Time since the worker picked the task up, zero if it never did.
    pub(crate) fn running_for(&self) -> Duration {
        self.slot()
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }

    pub(crate) fn state(&self) -> TaskState {
        self.slot().state
    }

    pub(crate) fn take_result(&self) -> Option<ExecutionResult> {
        self.slot().result.take()
    }
}

/// Handle to an accepted task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    shared: Arc<TaskShared>,
}

impl TaskHandle {
    pub(crate) fn new(shared: Arc<TaskShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Arc<TaskShared> {
        &self.shared
    }

    pub fn id(&self) -> &str {
        self.shared.id()
    }

    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    /// Ask the task to stop at its next acquisition boundary.
    ///
    /// Work that is already running is not interrupted.
    pub fn cancel(&self) {
        self.shared.cancel_flag().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel_flag().is_cancelled()
    }
}
