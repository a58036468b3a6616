// src/runner/work.rs

//! Task bodies for the work kinds a config file can name.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail};
use tracing::{debug, trace};

use crate::config::WorkSpec;
use crate::task::{TaskContext, Work};

/// How often a `hang` body looks at its cancellation flag.
const HANG_POLL: Duration = Duration::from_millis(10);

/// One counter per resource, for `increment` work.
///
/// The counters are plain atomics touched with separate load and store, so
/// the only thing keeping updates from being lost is the resource lock the
/// incrementing task holds.
#[derive(Debug, Clone, Default)]
pub struct GuardedCounters {
    by_resource: Arc<BTreeMap<String, Arc<AtomicU64>>>,
}

impl GuardedCounters {
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let by_resource = resources
            .into_iter()
            .map(|name| (name.into(), Arc::new(AtomicU64::new(0))))
            .collect();
        Self {
            by_resource: Arc::new(by_resource),
        }
    }

    pub fn get(&self, resource: &str) -> Option<u64> {
        self.by_resource
            .get(resource)
            .map(|c| c.load(Ordering::SeqCst))
    }

    /// Current values, keyed by resource name.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.by_resource
            .iter()
            .map(|(name, c)| (name.clone(), c.load(Ordering::SeqCst)))
            .collect()
    }

    fn counter(&self, resource: &str) -> Option<Arc<AtomicU64>> {
        self.by_resource.get(resource).cloned()
    }
}

/// Build the body for a work description.
pub fn build_work(spec: &WorkSpec, counters: &GuardedCounters) -> Work {
    match spec.clone() {
        WorkSpec::Sleep(hold) => Box::new(move |ctx: &TaskContext| -> anyhow::Result<()> {
            debug!(task = %ctx.task_id(), ?hold, "holding resources");
            thread::sleep(hold);
            Ok(())
        }),
        WorkSpec::Fail(message) => {
            Box::new(move |_ctx: &TaskContext| -> anyhow::Result<()> { Err(anyhow!(message)) })
        }
        WorkSpec::Panic(message) => {
            Box::new(move |_ctx: &TaskContext| -> anyhow::Result<()> { panic!("{message}") })
        }
        WorkSpec::Hang => Box::new(|ctx: &TaskContext| -> anyhow::Result<()> {
            while !ctx.is_cancelled() {
                thread::sleep(HANG_POLL);
            }
            bail!("hang released by cancellation")
        }),
        WorkSpec::Increment { times, hold } => {
            let counters = counters.clone();
            Box::new(move |ctx: &TaskContext| -> anyhow::Result<()> {
                let guard = ctx
                    .held()
                    .first()
                    .ok_or_else(|| anyhow!("increment needs a resource to guard the counter"))?;
                let counter = counters
                    .counter(guard.name())
                    .ok_or_else(|| anyhow!("no counter for resource '{}'", guard.name()))?;

                for _ in 0..times {
                    let seen = counter.load(Ordering::SeqCst);
                    thread::sleep(hold);
                    counter.store(seen + 1, Ordering::SeqCst);
                    trace!(task = %ctx.task_id(), resource = %guard.name(), value = seen + 1, "incremented");
                }
                Ok(())
            })
        }
    }
}
