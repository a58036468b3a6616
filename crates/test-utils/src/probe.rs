use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lockstep::registry::Resource;
use lockstep::task::{Task, TaskContext};

/// Records how many tasks hold each resource at the same time.
///
/// Every probed task bumps a per-resource gauge on entry, sleeps, and drops
/// it on exit. If the scheduler ever lets two holders overlap, the recorded
/// peak for that resource goes above 1.
#[derive(Clone, Default)]
pub struct HoldProbe {
    inner: Arc<Mutex<ProbeState>>,
}

#[derive(Default)]
struct ProbeState {
    current: HashMap<String, usize>,
    peak: HashMap<String, usize>,
    runs: Vec<String>,
}

impl HoldProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that holds `resources` for `hold` while reporting to the probe.
    pub fn task(&self, id: &str, resources: Vec<Resource>, hold: Duration) -> Task {
        let probe = self.clone();
        Task::new(id, resources, move |ctx: &TaskContext| -> anyhow::Result<()> {
            probe.enter(ctx);
            thread::sleep(hold);
            probe.exit(ctx);
            Ok(())
        })
    }

    fn enter(&self, ctx: &TaskContext) {
        let mut state = self.inner.lock().unwrap();
        state.runs.push(ctx.task_id().to_string());
        for resource in ctx.held() {
            let name = resource.name().to_string();
            let now = {
                let current = state.current.entry(name.clone()).or_default();
                *current += 1;
                *current
            };
            let peak = state.peak.entry(name).or_default();
            *peak = (*peak).max(now);
        }
    }

    fn exit(&self, ctx: &TaskContext) {
        let mut state = self.inner.lock().unwrap();
        for resource in ctx.held() {
            if let Some(current) = state.current.get_mut(resource.name()) {
                *current -= 1;
            }
        }
    }

    /// Highest number of simultaneous holders seen for `resource`.
    pub fn peak(&self, resource: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .peak
            .get(resource)
            .copied()
            .unwrap_or(0)
    }

    /// Ids of the tasks whose bodies ran, in start order.
    pub fn runs(&self) -> Vec<String> {
        self.inner.lock().unwrap().runs.clone()
    }
}
