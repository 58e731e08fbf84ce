//! Steady-state genetic optimizer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::schema::{ConfigError, OptimizerConfig, Progress, RunSummary, StopConfig, StopReason};

use super::individual::{Individual, Problem};
use super::selection::{healthy_slot, weakest_slot};

/// Identifier type of a problem's individuals.
pub type IdOf<P> = <<P as Problem>::Individual as Individual>::Id;

/// Optimizer errors.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("Invalid optimizer configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Best fitness must be positive to weight selection, got {0}")]
    NonPositiveBestFitness(i64),
}

/// Steady-state evolutionary optimizer over a fixed-size population.
///
/// Each call to [`advance`](Self::advance) runs one generation: crossovers
/// into the weakest slots, probabilistic mutation of the weakest slot, a
/// cataclysm check, then local refinement of the best individual. New genetic
/// material only ever overwrites the worst individual, never the best.
///
/// Not safe for concurrent use; independent instances share nothing.
pub struct Optimizer<P: Problem, R = StdRng> {
    config: OptimizerConfig,
    problem: P,
    rng: R,
    individuals: Vec<P::Individual>,
    best: usize,
    best_id: IdOf<P>,
    best_fitness: i64,
    mutation_rate: u32,
    cataclysm_countdown: i64,
    current_iteration: u64,
    iterations_without_improvement: u64,
    cataclysms: u64,
    cancelled: Arc<AtomicBool>,
}

impl<P: Problem> Optimizer<P, StdRng> {
    /// Create an optimizer seeded from `config.random_seed`, or from entropy
    /// when no seed is set.
    pub fn new(config: OptimizerConfig, problem: P) -> Result<Self, OptimizerError> {
        let seed = config.random_seed.unwrap_or_else(rand::random);
        Self::with_rng(config, problem, StdRng::seed_from_u64(seed))
    }
}

impl<P: Problem, R: Rng> Optimizer<P, R> {
    /// Create an optimizer drawing all randomness from `rng`.
    ///
    /// Fills every slot from the problem and takes the lowest fitness slot as
    /// the initial best. Fails if the configuration is invalid or the initial
    /// best fitness is not positive.
    pub fn with_rng(
        config: OptimizerConfig,
        mut problem: P,
        mut rng: R,
    ) -> Result<Self, OptimizerError> {
        config.validate()?;

        let individuals: Vec<P::Individual> = (0..config.population_size)
            .map(|_| problem.spawn(&mut rng))
            .collect();

        // Non-empty after validation.
        let (best, best_fitness) = individuals
            .iter()
            .enumerate()
            .map(|(idx, individual)| (idx, individual.fitness()))
            .min_by_key(|&(_, fitness)| fitness)
            .unwrap_or((0, 0));

        if best_fitness <= 0 {
            return Err(OptimizerError::NonPositiveBestFitness(best_fitness));
        }

        let best_id = individuals[best].id();

        Ok(Self {
            mutation_rate: config.initial_mutation_rate,
            cataclysm_countdown: i64::from(config.initial_cataclysm_countdown),
            config,
            problem,
            rng,
            individuals,
            best,
            best_id,
            best_fitness,
            current_iteration: 0,
            iterations_without_improvement: 0,
            cataclysms: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Run exactly one generation.
    ///
    /// Fails fast if the best fitness is not positive when selection needs it.
    /// A failure before the first crossover leaves every counter untouched.
    pub fn advance(&mut self) -> Result<(), OptimizerError> {
        if self.individuals.len() > 1 && self.best_fitness <= 0 {
            return Err(OptimizerError::NonPositiveBestFitness(self.best_fitness));
        }

        self.current_iteration += 1;
        self.iterations_without_improvement += 1;

        self.compute_crossovers()?;
        self.compute_mutations();
        self.compute_cataclysm();

        let best = &mut self.individuals[self.best];
        best.optimize();
        self.best_fitness = best.fitness();

        Ok(())
    }

    fn compute_crossovers(&mut self) -> Result<(), OptimizerError> {
        if self.individuals.len() == 1 {
            return Ok(());
        }

        for _ in 0..self.config.brood_size() {
            if self.select_healthy()?.is_none() {
                break;
            }
            self.crossover();
        }

        Ok(())
    }

    fn select_healthy(&mut self) -> Result<Option<usize>, OptimizerError> {
        if self.best_fitness <= 0 {
            return Err(OptimizerError::NonPositiveBestFitness(self.best_fitness));
        }
        Ok(healthy_slot(
            &self.individuals,
            self.best_id,
            self.best_fitness,
            &mut self.rng,
        ))
    }

    /// Recombine two random parents into the weakest slot.
    ///
    /// Parents and victim must be pairwise distinct by id. Returns `false`
    /// when no such triple was drawn within the configured attempts.
    fn crossover(&mut self) -> bool {
        let n = self.individuals.len();
        let Some(victim) = weakest_slot(&self.individuals, self.best_id) else {
            return false;
        };
        let victim_id = self.individuals[victim].id();

        for _ in 0..self.config.max_crossover_attempts {
            let p1 = self.rng.gen_range(0..n);
            let p2 = self.rng.gen_range(0..n);
            let p1_id = self.individuals[p1].id();
            let p2_id = self.individuals[p2].id();
            if p1_id == p2_id || p1_id == victim_id || p2_id == victim_id {
                continue;
            }

            let Ok([parent1, parent2, child]) = self.individuals.get_disjoint_mut([p1, p2, victim])
            else {
                continue;
            };
            child.crossover(parent1, parent2, &mut self.rng);
            self.track_best(victim);
            return true;
        }

        log::trace!(
            "No distinct crossover parents after {} attempts",
            self.config.max_crossover_attempts
        );
        false
    }

    /// Adopt `slot` as the best individual if it strictly improves on it,
    /// restarting the mutation and cataclysm schedules.
    fn track_best(&mut self, slot: usize) {
        let candidate = &self.individuals[slot];
        let fitness = candidate.fitness();
        if fitness >= self.best_fitness {
            return;
        }

        log::debug!(
            "Generation {}: best fitness {} -> {}",
            self.current_iteration,
            self.best_fitness,
            fitness
        );

        self.mutation_rate = self.config.initial_mutation_rate;
        self.cataclysm_countdown = i64::from(self.config.initial_cataclysm_countdown);
        self.iterations_without_improvement = 0;

        self.best = slot;
        self.best_id = candidate.id();
        self.best_fitness = fitness;
    }

    fn compute_mutations(&mut self) {
        if self.individuals.len() == 1 {
            return;
        }

        for _ in 0..self.config.brood_size() {
            if self.rng.gen_range(0..self.mutation_rate) == 0
                && let Some(weakest) = weakest_slot(&self.individuals, self.best_id)
            {
                self.individuals[weakest].mutate(&mut self.rng);
            }
        }

        self.mutation_rate = self.mutation_rate.saturating_sub(1).max(1);
    }

    fn compute_cataclysm(&mut self) {
        if self.individuals.len() == 1 {
            return;
        }

        if self.cataclysm_countdown <= 0 {
            self.regenerate_population();
            self.cataclysm_countdown = i64::from(self.config.initial_cataclysm_countdown);
        }

        self.cataclysm_countdown -= 1;
    }

    /// Replace every slot except the best with a freshly spawned individual.
    fn regenerate_population(&mut self) {
        let best = self.best;
        for (idx, slot) in self.individuals.iter_mut().enumerate() {
            if idx != best {
                *slot = self.problem.spawn(&mut self.rng);
            }
        }
        self.cataclysms += 1;

        log::debug!(
            "Generation {}: cataclysm #{}, keeping best fitness {}",
            self.current_iteration,
            self.cataclysms,
            self.best_fitness
        );
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Replace the cancellation flag, e.g. with one owned by a dispatcher.
    pub fn set_cancel_handle(&mut self, cancelled: Arc<AtomicBool>) {
        self.cancelled = cancelled;
    }

    /// Check if the run should stop. Only evaluated between generations.
    fn should_stop(&self, stop: &StopConfig) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if let Some(max) = stop.max_generations
            && self.current_iteration >= max
        {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(target) = stop.target_fitness
            && self.best_fitness <= target
        {
            return Some(StopReason::TargetReached);
        }

        if let Some(limit) = stop.stagnation_limit
            && self.iterations_without_improvement >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Advance until a stop condition holds, reporting after every generation.
    pub fn run_with_callback<F>(
        &mut self,
        stop: &StopConfig,
        callback: F,
    ) -> Result<RunSummary<IdOf<P>>, OptimizerError>
    where
        F: Fn(&Progress<IdOf<P>>),
    {
        let start_time = Instant::now();
        let start_iteration = self.current_iteration;

        let stop_reason = loop {
            if let Some(reason) = self.should_stop(stop) {
                break reason;
            }

            self.advance()?;
            callback(&self.progress());
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        let generations = self.current_iteration - start_iteration;

        log::info!(
            "Stopped after {} generations ({:?}): best fitness {}, {} cataclysms",
            generations,
            stop_reason,
            self.best_fitness,
            self.cataclysms
        );

        Ok(RunSummary {
            progress: self.progress(),
            stop_reason,
            elapsed_seconds: elapsed,
            generations_per_second: if elapsed > 0.0 {
                generations as f64 / elapsed
            } else {
                0.0
            },
        })
    }

    /// Run until a stop condition holds (blocking).
    pub fn run(&mut self, stop: &StopConfig) -> Result<RunSummary<IdOf<P>>, OptimizerError> {
        self.run_with_callback(stop, |_| {})
    }

    /// Get current progress.
    pub fn progress(&self) -> Progress<IdOf<P>> {
        Progress {
            generation: self.current_iteration,
            best_id: self.best_id,
            best_fitness: self.best_fitness,
            iterations_without_improvement: self.iterations_without_improvement,
            mutation_rate: self.mutation_rate,
            cataclysm_countdown: self.cataclysm_countdown,
            cataclysms: self.cataclysms,
        }
    }
}

impl<P: Problem, R> Optimizer<P, R> {
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// All population slots, in slot order.
    pub fn individuals(&self) -> &[P::Individual] {
        &self.individuals
    }

    /// The best individual found so far.
    pub fn best(&self) -> &P::Individual {
        &self.individuals[self.best]
    }

    pub fn best_id(&self) -> IdOf<P> {
        self.best_id
    }

    pub fn best_fitness(&self) -> i64 {
        self.best_fitness
    }

    pub fn iterations_without_improvement(&self) -> u64 {
        self.iterations_without_improvement
    }

    pub fn current_iteration(&self) -> u64 {
        self.current_iteration
    }

    pub fn mutation_rate(&self) -> u32 {
        self.mutation_rate
    }

    pub fn cataclysm_countdown(&self) -> i64 {
        self.cataclysm_countdown
    }

    /// Number of cataclysms so far.
    pub fn cataclysms(&self) -> u64 {
        self.cataclysms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Shared script and call counters for [`Probe`] individuals.
    #[derive(Default)]
    struct Script {
        improving: Cell<bool>,
        record: Cell<i64>,
        optimized: Cell<usize>,
        mutated: RefCell<Vec<u64>>,
        crossovers: RefCell<Vec<(u64, u64, u64)>>,
        spawned: Cell<usize>,
    }

    struct Probe {
        id: u64,
        fitness: i64,
        script: Rc<Script>,
    }

    impl Individual for Probe {
        type Id = u64;

        fn id(&self) -> u64 {
            self.id
        }

        fn fitness(&self) -> i64 {
            self.fitness
        }

        fn optimize(&mut self) {
            self.script.optimized.set(self.script.optimized.get() + 1);
        }

        fn mutate<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
            self.script.mutated.borrow_mut().push(self.id);
            self.fitness += 1;
        }

        fn crossover<R: Rng + ?Sized>(&mut self, parent1: &Self, parent2: &Self, _rng: &mut R) {
            self.script
                .crossovers
                .borrow_mut()
                .push((self.id, parent1.id, parent2.id));
            self.fitness = if self.script.improving.get() {
                let record = self.script.record.get() - 1;
                self.script.record.set(record);
                record
            } else {
                parent1.fitness.max(parent2.fitness) + 1
            };
        }
    }

    struct ProbeProblem {
        next_id: u64,
        base_fitness: i64,
        script: Rc<Script>,
    }

    impl Problem for ProbeProblem {
        type Individual = Probe;

        fn spawn<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> Probe {
            let id = self.next_id;
            self.next_id += 1;
            self.script.spawned.set(self.script.spawned.get() + 1);
            Probe {
                id,
                fitness: self.base_fitness + id as i64,
                script: Rc::clone(&self.script),
            }
        }
    }

    fn optimizer_with(
        config: OptimizerConfig,
        base_fitness: i64,
    ) -> (Optimizer<ProbeProblem>, Rc<Script>) {
        let script = Rc::new(Script::default());
        script.record.set(500);
        let problem = ProbeProblem {
            next_id: 0,
            base_fitness,
            script: Rc::clone(&script),
        };
        let config = OptimizerConfig {
            random_seed: Some(config.random_seed.unwrap_or(42)),
            ..config
        };
        let optimizer = Optimizer::new(config, problem).unwrap();
        (optimizer, script)
    }

    fn optimizer(population_size: usize) -> (Optimizer<ProbeProblem>, Rc<Script>) {
        optimizer_with(
            OptimizerConfig {
                population_size,
                ..Default::default()
            },
            1000,
        )
    }

    #[test]
    fn test_initial_state() {
        let (opt, script) = optimizer(10);
        assert_eq!(script.spawned.get(), 10);
        assert_eq!(opt.individuals().len(), 10);
        assert_eq!(opt.best_id(), 0);
        assert_eq!(opt.best_fitness(), 1000);
        assert_eq!(opt.mutation_rate(), 70);
        assert_eq!(opt.cataclysm_countdown(), 1000);
        assert_eq!(opt.current_iteration(), 0);
    }

    #[test]
    fn test_generation_without_improvement() {
        let (mut opt, script) = optimizer(10);
        opt.advance().unwrap();

        assert_eq!(opt.mutation_rate(), 69);
        assert_eq!(opt.cataclysm_countdown(), 999);
        assert_eq!(opt.iterations_without_improvement(), 1);
        assert_eq!(opt.current_iteration(), 1);
        assert_eq!(opt.best_id(), 0);
        assert_eq!(script.optimized.get(), 1);
    }

    #[test]
    fn test_single_individual_only_refines() {
        let (mut opt, script) = optimizer(1);
        for _ in 0..5 {
            opt.advance().unwrap();
        }

        assert_eq!(script.optimized.get(), 5);
        assert!(script.mutated.borrow().is_empty());
        assert!(script.crossovers.borrow().is_empty());
        assert_eq!(opt.mutation_rate(), 70);
        assert_eq!(opt.cataclysm_countdown(), 1000);
        assert_eq!(opt.cataclysms(), 0);
        assert_eq!(opt.iterations_without_improvement(), 5);
    }

    #[test]
    fn test_track_best_resets_schedule() {
        let (mut opt, _script) = optimizer(10);
        opt.mutation_rate = 3;
        opt.cataclysm_countdown = 5;
        opt.iterations_without_improvement = 9;

        opt.individuals[3].fitness = 1;
        opt.track_best(3);

        assert_eq!(opt.mutation_rate(), 70);
        assert_eq!(opt.cataclysm_countdown(), 1000);
        assert_eq!(opt.iterations_without_improvement(), 0);
        assert_eq!(opt.best_id(), 3);
        assert_eq!(opt.best_fitness(), 1);
    }

    #[test]
    fn test_track_best_keeps_better_best() {
        let (mut opt, _script) = optimizer(10);
        opt.mutation_rate = 3;

        opt.track_best(7);

        assert_eq!(opt.best_id(), 0);
        assert_eq!(opt.best_fitness(), 1000);
        assert_eq!(opt.mutation_rate(), 3);
    }

    #[test]
    fn test_improving_crossover_resets_schedule() {
        let (mut opt, script) = optimizer(10);
        for _ in 0..5 {
            opt.advance().unwrap();
        }
        assert_eq!(opt.mutation_rate(), 65);
        assert_eq!(opt.cataclysm_countdown(), 995);

        script.improving.set(true);
        for _ in 0..1000 {
            opt.advance().unwrap();
            if opt.iterations_without_improvement() == 0 {
                break;
            }
        }

        // Reset during crossover, then decremented once by each later phase.
        assert_eq!(opt.iterations_without_improvement(), 0);
        assert_eq!(opt.mutation_rate(), 69);
        assert_eq!(opt.cataclysm_countdown(), 999);
        assert!(opt.best_fitness() < 1000);
        assert_eq!(opt.best().fitness(), opt.best_fitness());
    }

    #[test]
    fn test_cataclysm_regenerates_once() {
        let (mut opt, script) = optimizer_with(
            OptimizerConfig {
                population_size: 10,
                initial_cataclysm_countdown: 3,
                ..Default::default()
            },
            1000,
        );

        for _ in 0..3 {
            opt.advance().unwrap();
        }
        assert_eq!(opt.cataclysm_countdown(), 0);
        assert_eq!(opt.cataclysms(), 0);

        opt.advance().unwrap();
        assert_eq!(opt.cataclysms(), 1);
        assert_eq!(opt.cataclysm_countdown(), 2);
        assert_eq!(script.spawned.get(), 19);
        assert_eq!(opt.problem().next_id, 19);

        // Best survives the restart.
        assert_eq!(opt.best_id(), 0);
        assert!(opt.individuals().iter().any(|i| i.id() == 0));
    }

    #[test]
    fn test_rate_one_mutates_every_trial() {
        let (mut opt, script) = optimizer_with(
            OptimizerConfig {
                population_size: 10,
                initial_mutation_rate: 1,
                ..Default::default()
            },
            1000,
        );
        let brood = opt.config().brood_size();
        assert_eq!(brood, 2);

        opt.advance().unwrap();
        let mutated = script.mutated.borrow();
        assert_eq!(mutated.len(), brood);
        assert!(mutated.iter().all(|&id| id != opt.best_id()));
        assert_eq!(opt.mutation_rate(), 1);
    }

    #[test]
    fn test_huge_rate_never_mutates() {
        let (mut opt, script) = optimizer_with(
            OptimizerConfig {
                population_size: 10,
                initial_mutation_rate: u32::MAX,
                ..Default::default()
            },
            1000,
        );
        for _ in 0..100 {
            opt.advance().unwrap();
        }
        assert!(script.mutated.borrow().is_empty());
        assert_eq!(opt.mutation_rate(), u32::MAX - 100);
    }

    #[test]
    fn test_crossovers_bounded_by_brood_size() {
        let (mut opt, script) = optimizer(50);
        let brood = opt.config().brood_size();
        assert_eq!(brood, 3);

        let mut busiest = 0;
        for _ in 0..200 {
            let before = script.crossovers.borrow().len();
            opt.advance().unwrap();
            let made = script.crossovers.borrow().len() - before;
            assert!(made <= brood);
            busiest = busiest.max(made);
        }
        assert!(busiest > 0);
    }

    #[test]
    fn test_unhealthy_population_skips_crossover() {
        let (mut opt, script) = optimizer(10);
        for (idx, individual) in opt.individuals.iter_mut().enumerate() {
            individual.fitness = if idx == 0 {
                1
            } else {
                1_000_000_000 + idx as i64
            };
        }
        opt.best_fitness = 1;

        // Acceptance windows of ~3e9 make every healthy selection come up empty.
        for _ in 0..20 {
            opt.advance().unwrap();
        }
        assert!(script.crossovers.borrow().is_empty());
        assert_eq!(opt.best_id(), 0);
        assert_eq!(opt.best_fitness(), 1);
    }

    #[test]
    fn test_crossover_victim_is_not_a_parent() {
        let (mut opt, script) = optimizer(12);
        for _ in 0..200 {
            opt.advance().unwrap();
        }

        let crossovers = script.crossovers.borrow();
        assert!(!crossovers.is_empty());
        for &(child, p1, p2) in crossovers.iter() {
            assert_ne!(child, p1);
            assert_ne!(child, p2);
            assert_ne!(p1, p2);
        }
    }

    #[test]
    fn test_two_slots_skip_crossover() {
        let (mut opt, script) = optimizer(2);
        for _ in 0..50 {
            opt.advance().unwrap();
        }
        assert!(script.crossovers.borrow().is_empty());
        assert_eq!(opt.current_iteration(), 50);
    }

    #[test]
    fn test_rejects_non_positive_best() {
        let script = Rc::new(Script::default());
        let problem = ProbeProblem {
            next_id: 0,
            base_fitness: 0,
            script,
        };
        let result = Optimizer::new(OptimizerConfig::default(), problem);
        assert!(matches!(
            result,
            Err(OptimizerError::NonPositiveBestFitness(0))
        ));
    }

    #[test]
    fn test_fails_fast_when_best_drops_to_zero() {
        let (mut opt, script) = optimizer(10);
        opt.advance().unwrap();
        let before = opt.progress();

        opt.best_fitness = 0;
        assert!(matches!(
            opt.advance(),
            Err(OptimizerError::NonPositiveBestFitness(0))
        ));

        // The failed call is not counted as a generation.
        assert_eq!(opt.current_iteration(), before.generation);
        assert_eq!(
            opt.iterations_without_improvement(),
            before.iterations_without_improvement
        );
        assert_eq!(opt.mutation_rate(), before.mutation_rate);
        assert_eq!(opt.cataclysm_countdown(), before.cataclysm_countdown);
        assert_eq!(script.optimized.get(), 1);
    }

    #[test]
    fn test_rejects_empty_population() {
        let script = Rc::new(Script::default());
        let problem = ProbeProblem {
            next_id: 0,
            base_fitness: 10,
            script,
        };
        let config = OptimizerConfig {
            population_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            Optimizer::new(config, problem),
            Err(OptimizerError::Config(ConfigError::EmptyPopulation))
        ));
    }

    #[test]
    fn test_run_stops_at_max_generations() {
        let (mut opt, _script) = optimizer(10);
        let stop = StopConfig {
            max_generations: Some(25),
            ..Default::default()
        };
        let reported = Cell::new(0);
        let summary = opt
            .run_with_callback(&stop, |_| reported.set(reported.get() + 1))
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::MaxGenerations);
        assert_eq!(summary.progress.generation, 25);
        assert_eq!(reported.get(), 25);
    }

    #[test]
    fn test_run_stops_on_stagnation() {
        let (mut opt, _script) = optimizer(10);
        let stop = StopConfig {
            stagnation_limit: Some(10),
            ..Default::default()
        };
        let summary = opt.run(&stop).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Stagnation);
        assert_eq!(summary.progress.iterations_without_improvement, 10);
    }

    #[test]
    fn test_cancellation() {
        let (mut opt, _script) = optimizer(10);
        let cancel = opt.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let summary = opt.run(&StopConfig::default()).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.progress.generation, 0);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let (mut a, _) = optimizer(20);
        let (mut b, _) = optimizer(20);
        for _ in 0..100 {
            a.advance().unwrap();
            b.advance().unwrap();
        }
        assert_eq!(a.progress(), b.progress());
    }
}
