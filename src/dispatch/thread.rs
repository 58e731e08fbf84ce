//! A worker that runs one computation task at a time.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::schema::{JobId, ThreadInfo, ThreadState};

use super::task::ComputationTask;

#[derive(Debug, Default)]
struct Status {
    state: ThreadState,
    info: String,
}

/// Computation thread owned by a dispatcher.
///
/// The OS thread is spawned per task. Status is shared with the running task
/// so it can report completion without going through the dispatcher.
pub(crate) struct ComputationThread {
    id: JobId,
    status: Arc<Mutex<Status>>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

fn lock(status: &Mutex<Status>) -> MutexGuard<'_, Status> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ComputationThread {
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            id,
            status: Arc::new(Mutex::new(Status::default())),
            cancel: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub(crate) fn info(&self) -> ThreadInfo {
        let status = lock(&self.status);
        ThreadInfo {
            thread_id: self.id,
            state: status.state,
            accepts_commands: status.state == ThreadState::Idle,
            additional_info: status.info.clone(),
        }
    }

    pub(crate) fn accepts_commands(&self) -> bool {
        lock(&self.status).state == ThreadState::Idle
    }

    /// Start `task` on a fresh OS thread. The caller checks
    /// [`accepts_commands`](Self::accepts_commands) first.
    ///
    /// Never blocks: the previous OS thread is joined by its successor, not
    /// by the caller, who may be holding the dispatcher's registry lock.
    pub(crate) fn run(&mut self, task: Box<dyn ComputationTask>) -> io::Result<()> {
        let previous = self.handle.take();

        self.cancel.store(false, Ordering::Relaxed);
        {
            let mut status = lock(&self.status);
            status.state = ThreadState::Working;
            status.info = format!("Running {}", task.name());
        }

        let status = Arc::clone(&self.status);
        let cancel = Arc::clone(&self.cancel);
        let id = self.id;
        let spawned = thread::Builder::new()
            .name(format!("computation-{id}"))
            .spawn(move || {
                // Already reported Idle, so it is at most finishing its exit.
                if let Some(previous) = previous
                    && previous.join().is_err()
                {
                    log::warn!("Thread {id}: previous worker exited abnormally");
                }

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run(cancel)));
                let info = match outcome {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        log::warn!("Thread {id}: task failed: {e}");
                        format!("Task failed: {e}")
                    }
                    Err(_) => {
                        log::error!("Thread {id}: task panicked");
                        "Task panicked".to_string()
                    }
                };

                let mut status = lock(&status);
                if status.state == ThreadState::Working {
                    status.state = ThreadState::Idle;
                }
                status.info = info;
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                let mut status = lock(&self.status);
                status.state = ThreadState::Idle;
                status.info = format!("Failed to start task: {e}");
                Err(e)
            }
        }
    }

    /// Ask the running task to stop at its next safe point.
    pub(crate) fn abort_current_action(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Abort and mark dead. A still running task is detached, not joined.
    pub(crate) fn dispose(self) {
        self.abort_current_action();
        lock(&self.status).state = ThreadState::Dead;
    }
}
