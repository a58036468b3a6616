// src/scheduler/worker_loop.rs

//! Fixed-size pool of OS worker threads sharing one FIFO queue.

use std::io;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::scheduler::task_runner::{Job, run_job};

/// Spawn `count` named worker threads.
///
/// Workers pull jobs in submission order. After each recorded outcome a
/// worker pings `done_tx` so `await_all` can re-check. Threads are detached:
/// a task body that never returns must not keep the process alive.
pub(crate) fn spawn_workers(
    count: usize,
    queue: Receiver<Job>,
    done_tx: UnboundedSender<()>,
    lock_poll_interval: Duration,
) -> io::Result<()> {
    let queue = Arc::new(Mutex::new(queue));

    for index in 0..count {
        let queue = Arc::clone(&queue);
        let done_tx = done_tx.clone();
        thread::Builder::new()
            .name(format!("lockstep-worker-{index}"))
            .spawn(move || worker_loop(index, queue, done_tx, lock_poll_interval))?;
    }

    info!(workers = count, "worker pool started");
    Ok(())
}

fn worker_loop(
    index: usize,
    queue: Arc<Mutex<Receiver<Job>>>,
    done_tx: UnboundedSender<()>,
    lock_poll_interval: Duration,
) {
    debug!(worker = index, "worker started");

    loop {
        // Only one idle worker waits on the receiver at a time; the others
        // wait on the mutex, which keeps pickup order FIFO.
        let next = {
            let rx = queue.lock().unwrap_or_else(PoisonError::into_inner);
            rx.recv()
        };

        let Ok(job) = next else {
            break;
        };

        debug!(worker = index, task = %job.shared.id(), "picked up task");
        if run_job(job, lock_poll_interval) {
            // The scheduler may already be gone; nothing to notify then.
            let _ = done_tx.send(());
        }
    }

    debug!(worker = index, "worker finished (queue closed)");
}
