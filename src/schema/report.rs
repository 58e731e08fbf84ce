//! Progress and result types reported by a running optimizer.

use serde::{Deserialize, Serialize};

/// Snapshot of optimizer state, taken between generations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress<Id> {
    /// Generations completed.
    pub generation: u64,
    /// Identifier of the best individual.
    pub best_id: Id,
    /// Fitness of the best individual (lower is better).
    pub best_fitness: i64,
    /// Generations since the best fitness last improved.
    pub iterations_without_improvement: u64,
    /// Current mutation rate (a trial mutates with probability `1 / rate`).
    pub mutation_rate: u32,
    /// Generations left before the next cataclysm.
    pub cataclysm_countdown: i64,
    /// Cataclysms triggered so far.
    pub cataclysms: u64,
}

/// Reason a run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Reached target fitness.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
    /// Cancelled between generations.
    Cancelled,
}

/// Final result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary<Id> {
    /// State after the last generation.
    pub progress: Progress<Id>,
    /// Reason for stopping.
    pub stop_reason: StopReason,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Generations per second.
    pub generations_per_second: f64,
}
