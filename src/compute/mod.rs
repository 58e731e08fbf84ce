//! Compute module - Evolutionary optimization.

pub mod evolution;

pub use evolution::{Individual, Optimizer, OptimizerError, Problem};
