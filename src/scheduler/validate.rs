// src/scheduler/validate.rs

use crate::errors::{LockstepError, Result};
use crate::registry::Resource;

/// Check that `resources` is strictly increasing by order index.
///
/// This is what makes circular wait impossible among accepted tasks: every
/// task takes its locks along the same total order. Repeating a resource
/// counts as a violation.
pub fn validate_lock_order(task: &str, resources: &[Resource]) -> Result<()> {
    for pair in resources.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        if next.order_index() <= previous.order_index() {
            return Err(LockstepError::InvalidLockOrder {
                task: task.to_string(),
                previous: previous.name().to_string(),
                previous_index: previous.order_index(),
                next: next.name().to_string(),
                next_index: next.order_index(),
            });
        }
    }
    Ok(())
}
