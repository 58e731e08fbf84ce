//! Units of work executed on computation threads.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::compute::evolution::{IdOf, Optimizer, OptimizerError, Problem};
use crate::schema::StopConfig;

/// Error type for failed tasks.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Optimization failed: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("Failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Work run to completion on a computation thread.
///
/// Long-running tasks must poll `cancel` at safe points and return early once
/// it is set.
pub trait ComputationTask: Send {
    /// Short name used in status details.
    fn name(&self) -> &str;

    /// Run the task, returning a human readable result.
    fn run(self: Box<Self>, cancel: Arc<AtomicBool>) -> Result<String, TaskError>;
}

/// Runs an optimizer until its stop conditions hold or it is aborted.
///
/// The result detail is the JSON encoded run summary.
pub struct OptimizationTask<P: Problem, R = StdRng> {
    optimizer: Optimizer<P, R>,
    stop: StopConfig,
}

impl<P: Problem, R> OptimizationTask<P, R> {
    pub fn new(optimizer: Optimizer<P, R>, stop: StopConfig) -> Self {
        Self { optimizer, stop }
    }
}

impl<P, R> ComputationTask for OptimizationTask<P, R>
where
    P: Problem + Send,
    P::Individual: Send,
    IdOf<P>: Serialize + Send,
    R: Rng + Send,
{
    fn name(&self) -> &str {
        "optimization"
    }

    fn run(mut self: Box<Self>, cancel: Arc<AtomicBool>) -> Result<String, TaskError> {
        self.optimizer.set_cancel_handle(cancel);
        let summary = self.optimizer.run_with_callback(&self.stop, |progress| {
            log::trace!(
                "Generation {}: best fitness {}",
                progress.generation,
                progress.best_fitness
            );
        })?;
        Ok(serde_json::to_string(&summary)?)
    }
}
