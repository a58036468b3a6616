// src/types.rs

use std::fmt;

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Terminal status of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    Completed,
    Failed,
    TimedOut,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::TimedOut => "timed out",
        };
        f.pad(s)
    }
}

/// Lifecycle of an accepted task.
///
/// `Submitted` and `Rejected` only exist inside `Scheduler::submit`: a
/// rejected task never gets a handle, so it is never observable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Passed lock-order validation and waits in the FIFO queue.
    Validated,
    /// Picked up by a worker (acquiring locks or running work).
    Running,
    Finished(ExecutionStatus),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Finished(_))
    }
}
