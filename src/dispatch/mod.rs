//! Dispatch module - Hosting optimizer runs on computation threads.
//!
//! A [`Dispatcher`] is an explicit registry object: create one and share it
//! (for example behind an `Arc`) with whatever serves client requests. Each
//! registered thread runs one [`ComputationTask`] at a time and is addressed
//! by an opaque [`JobId`](crate::schema::JobId).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use planet_colonizer::compute::evolution::{DistanceMatrix, Optimizer, TourProblem};
//! use planet_colonizer::dispatch::{Dispatcher, OptimizationTask};
//! use planet_colonizer::schema::{OptimizerConfig, StopConfig, TourConfig};
//!
//! let dispatcher = Dispatcher::default();
//! let id = dispatcher.new_thread().unwrap();
//!
//! let matrix = Arc::new(DistanceMatrix::generate(&TourConfig::default()).unwrap());
//! let optimizer = Optimizer::new(OptimizerConfig::default(), TourProblem::new(matrix)).unwrap();
//! let task = OptimizationTask::new(optimizer, StopConfig::default());
//!
//! assert!(dispatcher.run_computation(id, Box::new(task)).success);
//! // ... later
//! dispatcher.abort_thread_action(id);
//! println!("{:?}", dispatcher.thread_info(id));
//! ```

mod dispatcher;
mod task;
mod thread;

pub use dispatcher::{DispatchError, Dispatcher, THREADS_PER_PROCESSOR};
pub use task::{ComputationTask, OptimizationTask, TaskError};
