//! Registry of computation threads addressed by job id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::schema::{
    CallResponse, JobId, THREAD_NOT_FOUND, THREAD_REJECTS_COMMANDS, ThreadInfo,
};

use super::task::ComputationTask;
use super::thread::ComputationThread;

/// Computation threads allowed per available processor.
pub const THREADS_PER_PROCESSOR: usize = 2;

/// Error type for dispatcher operations.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatcher is at capacity ({capacity} threads)")]
    AtCapacity { capacity: usize },
}

/// Creates, tracks, aborts and disposes computation threads.
///
/// All operations take `&self` and may be called from any thread. Unknown
/// ids are reported through the returned status, never as a panic.
pub struct Dispatcher {
    capacity: usize,
    threads: Mutex<HashMap<JobId, ComputationThread>>,
    next_id: AtomicU64,
}

impl Default for Dispatcher {
    fn default() -> Self {
        let processors = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(processors * THREADS_PER_PROCESSOR)
    }
}

impl Dispatcher {
    /// Create a dispatcher managing at most `capacity` threads.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            threads: Mutex::new(HashMap::with_capacity(capacity)),
            next_id: AtomicU64::new(1),
        }
    }

    fn threads(&self) -> MutexGuard<'_, HashMap<JobId, ComputationThread>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maximum number of threads.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of threads currently registered.
    pub fn thread_count(&self) -> usize {
        self.threads().len()
    }

    /// Register a new idle thread.
    pub fn new_thread(&self) -> Result<JobId, DispatchError> {
        let mut threads = self.threads();
        if threads.len() >= self.capacity {
            log::warn!("NewThread: at capacity ({})", self.capacity);
            return Err(DispatchError::AtCapacity {
                capacity: self.capacity,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        threads.insert(id, ComputationThread::new(id));

        log::debug!("NewThread: {id}");
        log::trace!(
            "Dispatcher capacity: {} alive/{} total",
            threads.len(),
            self.capacity
        );

        Ok(id)
    }

    /// Status of a thread. Unknown ids report a dead thread.
    pub fn thread_info(&self, id: JobId) -> ThreadInfo {
        match self.threads().get(&id) {
            Some(thread) => thread.info(),
            None => {
                log::warn!("GetThreadInfo: thread does not exist: {id}");
                ThreadInfo::not_found(id)
            }
        }
    }

    /// Start `task` on an idle thread.
    pub fn run_computation(&self, id: JobId, task: Box<dyn ComputationTask>) -> CallResponse {
        let mut threads = self.threads();
        let Some(thread) = threads.get_mut(&id) else {
            log::warn!("RunComputation: thread does not exist: {id}");
            return CallResponse::failed(THREAD_NOT_FOUND);
        };

        if !thread.accepts_commands() {
            log::warn!("RunComputation: thread does not accept commands: {id}");
            return CallResponse::failed(THREAD_REJECTS_COMMANDS);
        }

        let name = task.name().to_string();
        match thread.run(task) {
            Ok(()) => {
                log::debug!("RunComputation: {id} started {name}");
                CallResponse::ok()
            }
            Err(e) => {
                log::error!("RunComputation: {id} failed to start {name}: {e}");
                CallResponse::failed(format!("Failed to start task: {e}"))
            }
        }
    }

    /// Ask the task running on a thread to stop at its next safe point.
    pub fn abort_thread_action(&self, id: JobId) -> CallResponse {
        match self.threads().get(&id) {
            Some(thread) => {
                log::debug!("AbortThreadAction: {id}");
                thread.abort_current_action();
                CallResponse::ok()
            }
            None => {
                log::warn!("AbortThreadAction: thread does not exist: {id}");
                CallResponse::failed(THREAD_NOT_FOUND)
            }
        }
    }

    /// Abort a thread's task and remove it from the registry.
    pub fn dispose_thread(&self, id: JobId) -> CallResponse {
        match self.threads().remove(&id) {
            Some(thread) => {
                thread.dispose();
                log::debug!("DisposeThread: {id}");
                CallResponse::ok()
            }
            None => {
                log::warn!("DisposeThread: thread does not exist: {id}");
                CallResponse::failed(THREAD_NOT_FOUND)
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        for thread in self.threads().values() {
            thread.abort_current_action();
        }
    }
}
