// src/lib.rs

pub mod analysis;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod task;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::analysis::LockOrderReport;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, WorkSpec, load_and_validate};
use crate::errors::{LockstepError, Result};
use crate::registry::ResourceRegistry;
use crate::runner::{RunReport, Runner, analyze_config};

/// Every task completed.
pub const EXIT_OK: i32 = 0;
/// At least one task failed, timed out or was rejected.
pub const EXIT_TASK_FAILURE: i32 = 1;
/// The batch could not be set up (bad config, unknown resource, I/O).
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - registry, scheduler and runner
/// - Ctrl-C handling
///
/// Returns the exit code for the process.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    apply_overrides(&mut cfg, &args)?;

    if args.dry_run {
        let (registry, lock_report) = analyze_config(&cfg)?;
        print_dry_run(&cfg, &registry, &lock_report);
        return Ok(EXIT_OK);
    }

    let runner = Runner::from_config(&cfg)?;

    // Ctrl-C → cancel outstanding tasks.
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let report = runner.run_until(interrupt).await?;
    print_report(&report);

    let code = report.exit_code();
    info!(code, interrupted = report.interrupted, "batch finished");
    Ok(code)
}

/// CLI flags win over the `[config]` section.
fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) -> Result<()> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(LockstepError::ConfigError(
                "--workers must be at least 1".to_string(),
            ));
        }
        cfg.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        cfg.timeout = timeout;
    }
    Ok(())
}

/// One line per task, then the rejected ones and any non-zero counters.
fn print_report(report: &RunReport) {
    println!("results ({}):", report.results.len());
    for result in &report.results {
        match &result.error {
            None => println!(
                "  {:<16} {:<10} {:?}",
                result.task_id, result.status, result.elapsed
            ),
            Some(err) => println!(
                "  {:<16} {:<10} {:?}  {err}",
                result.task_id, result.status, result.elapsed
            ),
        }
    }

    if !report.rejected.is_empty() {
        println!();
        println!("rejected ({}):", report.rejected.len());
        for violation in &report.rejected {
            println!("  {:<16} {}", violation.task, violation.error);
        }
    }

    let touched: Vec<_> = report.counters.iter().filter(|(_, v)| **v > 0).collect();
    if !touched.is_empty() {
        println!();
        println!("counters:");
        for (resource, value) in touched {
            println!("  {resource} = {value}");
        }
    }

    if report.interrupted {
        println!();
        println!("interrupted before the batch finished");
    }
}

/// Simple dry-run output: resources, tasks and the lock-order analysis.
fn print_dry_run(cfg: &ConfigFile, registry: &ResourceRegistry, report: &LockOrderReport) {
    println!("lockstep dry-run");
    println!("  config.workers = {}", cfg.workers);
    println!("  config.timeout = {:?}", cfg.timeout);
    println!();

    println!("resources ({}):", registry.len());
    for resource in registry.resources() {
        println!("  {:>3}  {}", resource.order_index(), resource.name());
    }
    println!();

    println!("tasks ({}):", cfg.tasks.len());
    for task in &cfg.tasks {
        println!("  - {}", task.id);
        println!("      resources: {:?}", task.resources);
        match &task.work {
            WorkSpec::Sleep(d) => println!("      work: sleep {d:?}"),
            WorkSpec::Fail(msg) => println!("      work: fail ({msg})"),
            WorkSpec::Panic(msg) => println!("      work: panic ({msg})"),
            WorkSpec::Hang => println!("      work: hang"),
            WorkSpec::Increment { times, hold } => {
                println!("      work: increment x{times}, hold {hold:?}")
            }
        }
    }
    println!();

    if report.is_clean() {
        println!("lock order: ok");
    } else {
        for violation in &report.violations {
            println!("lock order: would reject {}: {}", violation.task, violation.error);
        }
        for cycle in &report.cycles {
            println!("lock order: circular wait between {}", cycle.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
}
