//! Planet Colonizer - Steady-state genetic optimization.
//!
//! This crate provides a steady-state evolutionary optimizer for integer-cost
//! minimization problems. New genetic material only replaces the weakest
//! individual; the mutation rate escalates while the search stagnates, and a
//! cataclysm regenerates the population after a long stretch without
//! improvement.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Configuration, progress and dispatch wire types
//! - `compute`: The optimizer, its selection procedures and a sample tour problem
//! - `dispatch`: A registry of computation threads hosting optimizer runs
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use planet_colonizer::{
//!     compute::evolution::{DistanceMatrix, TourProblem},
//!     schema::{OptimizerConfig, TourConfig},
//!     Optimizer,
//! };
//!
//! let matrix = Arc::new(DistanceMatrix::generate(&TourConfig::default()).unwrap());
//! let mut optimizer = Optimizer::new(OptimizerConfig::default(), TourProblem::new(matrix)).unwrap();
//!
//! for _ in 0..100 {
//!     optimizer.advance().unwrap();
//! }
//!
//! println!("Best fitness after 100 generations: {}", optimizer.best_fitness());
//! ```

pub mod compute;
pub mod dispatch;
pub mod schema;

// Re-export commonly used types
pub use compute::{Individual, Optimizer, OptimizerError, Problem};
pub use dispatch::Dispatcher;
pub use schema::{OptimizerConfig, StopConfig};
