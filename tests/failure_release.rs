use std::error::Error;
use std::time::Duration;

use anyhow::bail;
use lockstep::errors::LockstepError;
use lockstep::registry::ResourceRegistry;
use lockstep::scheduler::{Scheduler, SchedulerConfig};
use lockstep::task::{Task, TaskContext};
use lockstep::types::ExecutionStatus;
use lockstep_test_utils::probe::HoldProbe;
use lockstep_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn failing_work_releases_its_locks() -> TestResult {
    init_tracing();
    let registry = ResourceRegistry::from_names(["A", "B"])?;
    let mut scheduler = Scheduler::new(SchedulerConfig::with_workers(1))?;
    let probe = HoldProbe::new();

    scheduler.submit(Task::new(
        "broken",
        registry.resolve(&["A", "B"])?,
        |ctx: &TaskContext| -> anyhow::Result<()> {
            assert_eq!(ctx.held().len(), 2);
            bail!("disk on fire")
        },
    ))?;
    scheduler.submit(probe.task("after", registry.resolve(&["A", "B"])?, Duration::ZERO))?;

    let results = with_timeout(scheduler.await_all(WAIT)).await;
    assert_eq!(results[0].status, ExecutionStatus::Failed);
    match &results[0].error {
        Some(LockstepError::TaskExecution { task, source }) => {
            assert_eq!(task, "broken");
            assert!(source.to_string().contains("disk on fire"));
        }
        other => panic!("expected TaskExecution, got {other:?}"),
    }

    assert!(results[1].is_completed());
    assert_eq!(probe.runs(), vec!["after"]);
    assert!(!registry.get("A")?.is_held());
    assert!(!registry.get("B")?.is_held());
    Ok(())
}

#[tokio::test]
async fn panicking_work_is_captured_and_releases_its_locks() -> TestResult {
    init_tracing();
    let registry = ResourceRegistry::from_names(["A"])?;
    let mut scheduler = Scheduler::new(SchedulerConfig::with_workers(1))?;
    let probe = HoldProbe::new();

    scheduler.submit(Task::new(
        "explodes",
        registry.resolve(&["A"])?,
        |_ctx: &TaskContext| -> anyhow::Result<()> { panic!("kaboom") },
    ))?;
    scheduler.submit(probe.task("survivor", registry.resolve(&["A"])?, Duration::ZERO))?;

    let results = with_timeout(scheduler.await_all(WAIT)).await;
    assert_eq!(results[0].status, ExecutionStatus::Failed);
    let message = results[0]
        .error
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert!(message.contains("panicked"), "{message}");
    assert!(message.contains("kaboom"), "{message}");

    // The same single worker thread went on to run the next task.
    assert!(results[1].is_completed());
    assert!(!registry.get("A")?.is_held());
    Ok(())
}

#[tokio::test]
async fn one_failure_does_not_abort_siblings() -> TestResult {
    init_tracing();
    let registry = ResourceRegistry::from_names(["A", "B", "C"])?;
    let mut scheduler = Scheduler::new(SchedulerConfig::with_workers(3))?;
    let probe = HoldProbe::new();

    scheduler.submit(probe.task("ok-1", registry.resolve(&["A"])?, Duration::from_millis(20)))?;
    scheduler.submit(Task::new(
        "bad",
        registry.resolve(&["B"])?,
        |_ctx: &TaskContext| -> anyhow::Result<()> { bail!("nope") },
    ))?;
    scheduler.submit(probe.task("ok-2", registry.resolve(&["C"])?, Duration::from_millis(20)))?;

    let results = with_timeout(scheduler.await_all(WAIT)).await;
    let statuses: Vec<ExecutionStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            ExecutionStatus::Completed,
            ExecutionStatus::Failed,
            ExecutionStatus::Completed,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn body_sees_its_resources_in_acquisition_order() -> TestResult {
    let registry = ResourceRegistry::from_names(["A", "B", "C"])?;
    let mut scheduler = Scheduler::new(SchedulerConfig::with_workers(1))?;
    let c = registry.get("C")?;

    scheduler.submit(Task::new(
        "inspect",
        registry.resolve(&["A", "C"])?,
        move |ctx: &TaskContext| -> anyhow::Result<()> {
            let names: Vec<&str> = ctx.held().iter().map(|r| r.name()).collect();
            if names != ["A", "C"] {
                bail!("unexpected held resources {names:?}");
            }
            if !ctx.holds(&c) || c.holder().as_deref() != Some(ctx.task_id()) {
                bail!("C is not held by this task");
            }
            Ok(())
        },
    ))?;

    let results = with_timeout(scheduler.await_all(WAIT)).await;
    assert!(results[0].is_completed(), "{:?}", results[0].error);
    Ok(())
}
