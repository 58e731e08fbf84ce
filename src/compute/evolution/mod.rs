//! Steady-state evolutionary optimizer.
//!
//! # Overview
//!
//! The optimizer owns a fixed-size population and advances it one generation
//! per call:
//!
//! - **Crossover**: parents gated by fitness-proportionate selection are
//!   recombined into the weakest slot
//! - **Mutation**: the weakest slot mutates with probability `1 / rate`; the
//!   rate drops by one every generation and resets on improvement
//! - **Cataclysm**: after a stretch without improvement every slot except the
//!   best is regenerated
//! - **Refinement**: the best individual is locally optimized
//!
//! Candidate solutions plug in through the [`Individual`] and [`Problem`]
//! traits. [`Tour`] is a travelling-salesman implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use planet_colonizer::compute::evolution::{DistanceMatrix, Optimizer, TourProblem};
//! use planet_colonizer::schema::{OptimizerConfig, StopConfig, TourConfig};
//!
//! let matrix = Arc::new(DistanceMatrix::generate(&TourConfig::default()).unwrap());
//! let config = OptimizerConfig {
//!     population_size: 50,
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let mut optimizer = Optimizer::new(config, TourProblem::new(matrix)).unwrap();
//! let stop = StopConfig {
//!     max_generations: Some(1000),
//!     ..Default::default()
//! };
//! let summary = optimizer.run(&stop).unwrap();
//! println!("Best tour length: {}", summary.progress.best_fitness);
//! ```

mod individual;
mod optimizer;
mod selection;
mod tour;

pub use individual::{Individual, Problem};
pub use optimizer::{IdOf, Optimizer, OptimizerError};
pub use selection::{acceptance_window, healthy_slot, weakest_slot};
pub use tour::{DistanceMatrix, Tour, TourProblem};
