//! Wire types exchanged with the job dispatch layer.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a computation thread.
pub type JobId = u64;

/// Detail reported for identifiers the dispatcher does not know.
pub const THREAD_NOT_FOUND: &str = "Thread ID not found";

/// Detail reported when a thread is busy or dead.
pub const THREAD_REJECTS_COMMANDS: &str = "Thread does not accept commands";

/// Lifecycle state of a computation thread.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ThreadState {
    /// Waiting for a task.
    #[default]
    Idle,
    /// Running a task.
    Working,
    /// Disposed, or never existed.
    Dead,
}

/// Status of a computation thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadInfo {
    pub thread_id: JobId,
    pub state: ThreadState,
    /// Whether a new task may be started right now.
    pub accepts_commands: bool,
    /// Human readable detail, e.g. the last task result.
    pub additional_info: String,
}

impl ThreadInfo {
    /// Status reported for an unknown identifier.
    pub fn not_found(thread_id: JobId) -> Self {
        Self {
            thread_id,
            state: ThreadState::Dead,
            accepts_commands: false,
            additional_info: THREAD_NOT_FOUND.to_string(),
        }
    }
}

/// Outcome of a dispatcher command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallResponse {
    pub success: bool,
    pub details: String,
}

impl CallResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            details: String::new(),
        }
    }

    pub fn failed(details: impl Into<String>) -> Self {
        Self {
            success: false,
            details: details.into(),
        }
    }
}
