//! Selection procedures over population slots.
//!
//! Both scans are O(N) and identify the best individual by id, so the best
//! slot is never returned.

use rand::Rng;

use super::individual::Individual;

/// Slot holding the worst (highest fitness) individual other than the best.
///
/// Ties go to the first slot in iteration order. Returns `None` only when
/// every slot holds the best individual (a population of one).
pub fn weakest_slot<I: Individual>(slots: &[I], best_id: I::Id) -> Option<usize> {
    let mut weakest = None;
    let mut max_fitness = i64::MIN;

    for (idx, individual) in slots.iter().enumerate() {
        if individual.id() == best_id {
            continue;
        }
        if weakest.is_none() || individual.fitness() > max_fitness {
            weakest = Some(idx);
            max_fitness = individual.fitness();
        }
    }

    weakest
}

/// Size of the acceptance window for fitness-proportionate selection.
///
/// A candidate is accepted with probability `1 / window`, so candidates close
/// to the best are favoured. `best_fitness` must be positive.
#[inline]
pub fn acceptance_window(fitness: i64, best_fitness: i64) -> i64 {
    debug_assert!(best_fitness > 0, "best fitness must be positive");
    (fitness.saturating_mul(3) / best_fitness)
        .saturating_add(1)
        .max(1)
}

/// Fitness-proportionate ("healthy") selection by rejection sampling.
///
/// Scans at most one full circle starting at a random slot, skipping the best
/// individual. Each visited slot is accepted when a uniform draw from its
/// acceptance window is zero. `None` means no slot was accepted in this pass.
pub fn healthy_slot<I, R>(
    slots: &[I],
    best_id: I::Id,
    best_fitness: i64,
    rng: &mut R,
) -> Option<usize>
where
    I: Individual,
    R: Rng + ?Sized,
{
    let n = slots.len();
    if n == 0 {
        return None;
    }

    let start = rng.gen_range(0..n);
    for offset in 0..n {
        let idx = (start + offset) % n;
        let individual = &slots[idx];
        if individual.id() == best_id {
            continue;
        }

        let window = acceptance_window(individual.fitness(), best_fitness);
        if rng.gen_range(0..window) == 0 {
            return Some(idx);
        }
    }

    None
}
