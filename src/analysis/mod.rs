// src/analysis/mod.rs

//! Static view of the lock orders a batch asks for.
//!
//! The scheduler never lets an out-of-order task run, so this module is
//! purely diagnostic: it answers "what would happen if ordering were not
//! enforced?". Every task contributes an edge `a -> b` for each pair of
//! resources it takes back to back (it holds `a` while waiting for `b`).
//! A cycle in that graph is a potential circular wait, i.e. the batch as
//! written could deadlock.

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::errors::LockstepError;
use crate::registry::Resource;
use crate::scheduler::validate_lock_order;
use crate::types::TaskId;

/// A task whose resources break the global order.
#[derive(Debug)]
pub struct OrderViolation {
    pub task: TaskId,
    pub error: LockstepError,
}

#[derive(Debug, Default)]
pub struct LockOrderReport {
    /// Tasks the scheduler will reject, in input order.
    pub violations: Vec<OrderViolation>,
    /// Groups of resources that can wait on each other in a circle. Names
    /// within a group are sorted.
    pub cycles: Vec<Vec<String>>,
}

impl LockOrderReport {
    pub fn has_circular_wait(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.cycles.is_empty()
    }
}

/// Build the acquisition graph for `tasks` and look for circular waits.
pub fn analyze<'a, I>(tasks: I) -> LockOrderReport
where
    I: IntoIterator<Item = (&'a str, &'a [Resource])>,
{
    let mut graph: DiGraphMap<&'a str, ()> = DiGraphMap::new();
    let mut report = LockOrderReport::default();

    for (task, resources) in tasks {
        if let Err(error) = validate_lock_order(task, resources) {
            report.violations.push(OrderViolation {
                task: task.to_string(),
                error,
            });
        }

        for resource in resources {
            graph.add_node(resource.name());
        }
        for pair in resources.windows(2) {
            graph.add_edge(pair[0].name(), pair[1].name(), ());
        }
    }

    for component in tarjan_scc(&graph) {
        let is_cycle = component.len() > 1
            || component
                .first()
                .is_some_and(|node| graph.contains_edge(*node, *node));
        if is_cycle {
            let mut names: Vec<String> = component.iter().map(|s| s.to_string()).collect();
            names.sort();
            report.cycles.push(names);
        }
    }
    report.cycles.sort();

    report
}
