// src/task/mod.rs

//! The unit of work handed to the scheduler.
//!
//! A [`Task`] is an id, the resources it needs (in the order it will take
//! them) and a body. The body receives a [`TaskContext`] describing what it
//! holds and whether it has been asked to stop.

pub mod cancel;

use std::fmt;

use crate::registry::Resource;
use crate::types::TaskId;

pub use cancel::CancelFlag;

/// Body of a task. Errors are captured into the task's result, never
/// propagated through the worker pool.
pub type Work = Box<dyn FnOnce(&TaskContext) -> anyhow::Result<()> + Send + 'static>;

pub struct Task {
    id: TaskId,
    resources: Vec<Resource>,
    work: Work,
}

impl Task {
    pub fn new<F>(id: impl Into<TaskId>, resources: Vec<Resource>, work: F) -> Self
    where
        F: FnOnce(&TaskContext) -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            id: id.into(),
            resources,
            work: Box::new(work),
        }
    }

    /// Same as [`Task::new`] for a body that is already boxed.
    pub fn from_work(id: impl Into<TaskId>, resources: Vec<Resource>, work: Work) -> Self {
        Self {
            id: id.into(),
            resources,
            work,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Required resources, in acquisition order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub(crate) fn into_parts(self) -> (TaskId, Vec<Resource>, Work) {
        (self.id, self.resources, self.work)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

/// What a running task body can see about itself.
#[derive(Debug)]
pub struct TaskContext {
    id: TaskId,
    held: Vec<Resource>,
    cancel: CancelFlag,
}

impl TaskContext {
    pub(crate) fn new(id: TaskId, held: Vec<Resource>, cancel: CancelFlag) -> Self {
        Self { id, held, cancel }
    }

    pub fn task_id(&self) -> &str {
        &self.id
    }

    /// Resources held for the whole body, in acquisition order.
    pub fn held(&self) -> &[Resource] {
        &self.held
    }

    pub fn holds(&self, resource: &Resource) -> bool {
        self.held.contains(resource)
    }

    /// Whether the scheduler asked this task to stop.
    ///
    /// The scheduler itself only checks this at acquisition boundaries;
    /// long-running bodies may poll it to stop early.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
