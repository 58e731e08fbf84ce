//! Capabilities the optimizer requires from candidate solutions.

use std::fmt::Debug;

use rand::Rng;

/// A candidate solution living in one population slot.
///
/// Fitness is an integer cost: lower is better. All operations work in place;
/// the optimizer never moves an individual between slots.
pub trait Individual {
    /// Identity, stable for the individual's lifetime. Only compared for equality.
    type Id: Copy + Eq + Debug;

    /// Unique identifier.
    fn id(&self) -> Self::Id;

    /// Current cost of this solution.
    fn fitness(&self) -> i64;

    /// Local refinement.
    fn optimize(&mut self);

    /// Random perturbation.
    fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Overwrite this individual's solution (and fitness) with a recombination
    /// of two parents. The identifier is kept.
    fn crossover<R: Rng + ?Sized>(&mut self, parent1: &Self, parent2: &Self, rng: &mut R);
}

/// Problem-specific source of fresh individuals.
///
/// Used to seed the population at construction and to regenerate it on a
/// cataclysm. Every spawned individual must carry a new identifier.
pub trait Problem {
    type Individual: Individual;

    /// Create a randomly seeded individual.
    fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Self::Individual;
}
