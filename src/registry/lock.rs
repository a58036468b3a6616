// src/registry/lock.rs

//! Per-resource mutual exclusion.
//!
//! Each [`Resource`] owns one `ResourceLock`. Unlike a bare `Mutex<()>`, the
//! lock remembers which task holds it and waits in short slices so a blocked
//! task can notice cancellation while it waits.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{trace, warn};

use crate::errors::{LockstepError, Result};
use crate::registry::Resource;
use crate::task::CancelFlag;
use crate::types::TaskId;

#[derive(Debug, Default)]
pub(crate) struct ResourceLock {
    holder: Mutex<Option<TaskId>>,
    released: Condvar,
}

impl ResourceLock {
    /// The internal mutex only guards the holder slot and is never held
    /// while user code runs, so a poisoned guard still carries valid state.
    fn slot(&self) -> MutexGuard<'_, Option<TaskId>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn holder(&self) -> Option<TaskId> {
        self.slot().clone()
    }

    fn release(&self, resource: &str, task: &str) {
        let mut slot = self.slot();
        match slot.as_deref() {
            Some(holder) if holder == task => {
                *slot = None;
            }
            other => {
                warn!(
                    resource,
                    task,
                    holder = ?other,
                    "release by a task that does not hold the lock; ignoring"
                );
                return;
            }
        }
        drop(slot);
        self.released.notify_all();
    }
}

impl Resource {
    /// Block until this resource is free, then take it for `task`.
    ///
    /// The wait is sliced by `poll`; between slices (and before the first
    /// attempt) the task's cancellation flag is checked. A cancelled task
    /// gets [`LockstepError::Cancelled`] and holds nothing.
    pub fn acquire(
        &self,
        task: &str,
        cancel: &CancelFlag,
        poll: Duration,
    ) -> Result<ResourceGuard> {
        let lock = self.lock();
        let mut slot = lock.slot();

        loop {
            if cancel.is_cancelled() {
                return Err(LockstepError::Cancelled(task.to_string()));
            }

            if slot.is_none() {
                *slot = Some(task.to_string());
                trace!(
                    resource = %self.name(),
                    order_index = self.order_index(),
                    task,
                    "lock acquired"
                );
                return Ok(ResourceGuard {
                    resource: self.clone(),
                    task: task.to_string(),
                });
            }

            let (next, _timed_out) = lock
                .released
                .wait_timeout(slot, poll)
                .unwrap_or_else(PoisonError::into_inner);
            slot = next;
        }
    }

    /// Take the resource only if nobody holds it right now.
    pub fn try_acquire(&self, task: &str) -> Option<ResourceGuard> {
        let mut slot = self.lock().slot();
        if slot.is_some() {
            return None;
        }
        *slot = Some(task.to_string());
        Some(ResourceGuard {
            resource: self.clone(),
            task: task.to_string(),
        })
    }

    /// Task currently holding this resource, if any.
    pub fn holder(&self) -> Option<TaskId> {
        self.lock().holder()
    }

    pub fn is_held(&self) -> bool {
        self.holder().is_some()
    }
}

/// Proof that a task holds a resource. Dropping it releases the lock, so
/// release happens on every exit path, unwinding included.
pub struct ResourceGuard {
    resource: Resource,
    task: TaskId,
}

impl ResourceGuard {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn task(&self) -> &str {
        &self.task
    }
}

impl fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("resource", &self.resource.name())
            .field("task", &self.task)
            .finish()
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        trace!(resource = %self.resource.name(), task = %self.task, "lock released");
        self.resource.lock().release(self.resource.name(), &self.task);
    }
}
