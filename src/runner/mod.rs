// src/runner/mod.rs

//! Composition root: config -> registry -> tasks -> scheduler -> report.
//!
//! The runner owns no scheduling logic of its own. It registers resources in
//! config order, turns each task entry into a [`Task`], submits everything in
//! file order, and waits with the configured timeout.

pub mod work;

use std::collections::BTreeMap;
use std::future::{self, Future};
use std::time::Duration;

use tracing::{info, warn};

use crate::analysis::{self, LockOrderReport, OrderViolation};
use crate::config::{ConfigFile, TaskSpec};
use crate::errors::{LockstepError, Result};
use crate::registry::{Resource, ResourceRegistry};
use crate::scheduler::{ExecutionResult, Scheduler, SchedulerConfig};
use crate::task::Task;
use crate::{EXIT_OK, EXIT_TASK_FAILURE};

pub use work::{GuardedCounters, build_work};

/// How long an interrupted run waits for cancelled tasks to wind down.
pub const INTERRUPT_GRACE: Duration = Duration::from_millis(500);

/// Outcome of one batch.
#[derive(Debug)]
pub struct RunReport {
    /// One entry per accepted task, in submission order.
    pub results: Vec<ExecutionResult>,
    /// Tasks rejected at submission for breaking the lock order.
    pub rejected: Vec<OrderViolation>,
    /// Final counter value per resource (only moved by `increment` work).
    pub counters: BTreeMap<String, u64>,
    /// True if the wait was cut short by an interrupt.
    pub interrupted: bool,
}

impl RunReport {
    pub fn all_completed(&self) -> bool {
        self.rejected.is_empty() && self.results.iter().all(ExecutionResult::is_completed)
    }

    pub fn result_for(&self, task: &str) -> Option<&ExecutionResult> {
        self.results.iter().find(|r| r.task_id == task)
    }

    /// 0 when every task completed, 1 when any failed, timed out or was
    /// rejected.
    pub fn exit_code(&self) -> i32 {
        if self.all_completed() {
            EXIT_OK
        } else {
            EXIT_TASK_FAILURE
        }
    }
}

pub struct Runner {
    registry: ResourceRegistry,
    scheduler: Scheduler,
    counters: GuardedCounters,
    timeout: Duration,
    tasks: Vec<TaskSpec>,
}

impl Runner {
    /// Register resources and start the worker pool.
    ///
    /// Fails with `DuplicateResource` if a name is listed twice and with
    /// `ConfigError` if the pool size is zero.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let registry = ResourceRegistry::from_names(cfg.resources.iter().cloned())?;
        let scheduler = Scheduler::new(SchedulerConfig::with_workers(cfg.workers))?;
        let counters = GuardedCounters::new(cfg.resources.iter().cloned());

        info!(
            resources = registry.len(),
            tasks = cfg.tasks.len(),
            workers = cfg.workers,
            timeout = ?cfg.timeout,
            "runner ready"
        );

        Ok(Self {
            registry,
            scheduler,
            counters,
            timeout: cfg.timeout,
            tasks: cfg.tasks.clone(),
        })
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Run the batch to completion or timeout.
    pub async fn run(self) -> Result<RunReport> {
        self.run_until(future::pending()).await
    }

    /// Run the batch; if `interrupt` resolves first, cancel everything still
    /// outstanding and collect what finishes within [`INTERRUPT_GRACE`].
    pub async fn run_until<F>(mut self, interrupt: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        let tasks = self.build_tasks()?;

        let lock_report = analysis::analyze(tasks.iter().map(|t| (t.id(), t.resources())));
        if lock_report.has_circular_wait() {
            warn!(
                cycles = ?lock_report.cycles,
                "tasks as written could wait on each other in a circle; out-of-order tasks will be rejected"
            );
        }

        let mut rejected = Vec::new();
        for task in tasks {
            let id = task.id().to_string();
            match self.scheduler.submit(task) {
                Ok(_handle) => {}
                Err(error @ LockstepError::InvalidLockOrder { .. }) => {
                    rejected.push(OrderViolation { task: id, error });
                }
                Err(other) => return Err(other),
            }
        }

        let waited = tokio::select! {
            results = self.scheduler.await_all(self.timeout) => Some(results),
            () = interrupt => None,
        };

        let interrupted = waited.is_none();
        let results = match waited {
            Some(results) => results,
            None => {
                warn!("interrupted; cancelling outstanding tasks");
                self.scheduler.cancel_all();
                self.scheduler.await_all(INTERRUPT_GRACE).await
            }
        };

        Ok(RunReport {
            results,
            rejected,
            counters: self.counters.snapshot(),
            interrupted,
        })
    }

    fn build_tasks(&self) -> Result<Vec<Task>> {
        self.tasks
            .iter()
            .map(|spec| {
                let resources = self.registry.resolve(&spec.resources)?;
                let work = build_work(&spec.work, &self.counters);
                Ok(Task::from_work(spec.id.clone(), resources, work))
            })
            .collect()
    }
}

/// Resolve every task's resources against a registry built from `cfg`.
pub fn resolve_tasks(
    cfg: &ConfigFile,
    registry: &ResourceRegistry,
) -> Result<Vec<(String, Vec<Resource>)>> {
    cfg.tasks
        .iter()
        .map(|spec| Ok((spec.id.clone(), registry.resolve(&spec.resources)?)))
        .collect()
}

/// Lock-order analysis of a config without running anything.
pub fn analyze_config(cfg: &ConfigFile) -> Result<(ResourceRegistry, LockOrderReport)> {
    let registry = ResourceRegistry::from_names(cfg.resources.iter().cloned())?;
    let resolved = resolve_tasks(cfg, &registry)?;
    let report = analysis::analyze(
        resolved
            .iter()
            .map(|(id, resources)| (id.as_str(), resources.as_slice())),
    );
    Ok((registry, report))
}
