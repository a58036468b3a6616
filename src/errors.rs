// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum LockstepError {
    /// A task listed its resources out of global order. Raised by
    /// `Scheduler::submit`; the task never runs.
    #[error(
        "task '{task}' acquires '{next}' (index {next_index}) after '{previous}' (index {previous_index}); resources must be strictly increasing by order index"
    )]
    InvalidLockOrder {
        task: TaskId,
        previous: String,
        previous_index: usize,
        next: String,
        next_index: usize,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already registered: {0}")]
    DuplicateResource(String),

    #[error("task '{task}' failed: {source:#}")]
    TaskExecution {
        task: TaskId,
        #[source]
        source: anyhow::Error,
    },

    #[error("task '{task}' did not finish within {timeout:?}")]
    Timeout { task: TaskId, timeout: Duration },

    #[error("task '{0}' cancelled before acquiring its resources")]
    Cancelled(TaskId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LockstepError {
    /// Errors that stem from a bad batch description rather than from
    /// running it. These map to exit code 2.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LockstepError::ConfigError(_)
                | LockstepError::NotFound(_)
                | LockstepError::DuplicateResource(_)
                | LockstepError::IoError(_)
                | LockstepError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LockstepError>;
