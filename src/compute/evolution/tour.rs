//! Travelling-salesman tours as a sample problem.
//!
//! Fitness is the closed tour length over a rounded Euclidean distance
//! matrix. Refinement is a 2-opt pass, mutation reverses a random segment and
//! crossover is order crossover (OX1).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::prelude::*;
use rand_distr::Normal;

use crate::schema::{ConfigError, TourConfig};

use super::individual::{Individual, Problem};

/// Symmetric integer distances between cities.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    size: usize,
    distances: Vec<i64>,
}

impl DistanceMatrix {
    /// Build from city coordinates, rounding each distance to the nearest integer.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let size = points.len();
        let mut distances = vec![0; size * size];
        for (i, a) in points.iter().enumerate() {
            for (j, b) in points.iter().enumerate().skip(i + 1) {
                let d = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt().round() as i64;
                distances[i * size + j] = d;
                distances[j * size + i] = d;
            }
        }
        Self { size, distances }
    }

    /// Generate clustered cities from a tour configuration.
    pub fn generate(config: &TourConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let noise = Normal::new(0.0, config.cluster_spread)
            .map_err(|e| ConfigError::InvalidTour(e.to_string()))?;

        let centers: Vec<(f64, f64)> = (0..config.clusters)
            .map(|_| {
                (
                    rng.gen_range(0.0..config.map_size),
                    rng.gen_range(0.0..config.map_size),
                )
            })
            .collect();

        let points: Vec<(f64, f64)> = (0..config.cities)
            .map(|_| {
                let center = centers[rng.gen_range(0..centers.len())];
                let x: f64 = center.0 + rng.sample(noise);
                let y: f64 = center.1 + rng.sample(noise);
                (x.clamp(0.0, config.map_size), y.clamp(0.0, config.map_size))
            })
            .collect();

        Ok(Self::from_points(&points))
    }

    /// Number of cities.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn distance(&self, a: usize, b: usize) -> i64 {
        self.distances[a * self.size + b]
    }

    /// Length of the closed tour visiting `order`.
    pub fn tour_length(&self, order: &[usize]) -> i64 {
        if order.len() < 2 {
            return 0;
        }
        order
            .iter()
            .zip(order.iter().cycle().skip(1))
            .map(|(&a, &b)| self.distance(a, b))
            .sum()
    }
}

/// A closed tour through every city.
#[derive(Debug, Clone)]
pub struct Tour {
    id: u64,
    order: Vec<usize>,
    length: i64,
    matrix: Arc<DistanceMatrix>,
}

impl Tour {
    /// Random permutation of all cities.
    pub fn random<R: Rng + ?Sized>(id: u64, matrix: Arc<DistanceMatrix>, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..matrix.len()).collect();
        order.shuffle(rng);
        Self::from_order(id, matrix, order)
    }

    /// Tour visiting cities in the given order.
    pub fn from_order(id: u64, matrix: Arc<DistanceMatrix>, order: Vec<usize>) -> Self {
        let length = matrix.tour_length(&order);
        Self {
            id,
            order,
            length,
            matrix,
        }
    }

    /// City visiting order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn recompute_length(&mut self) {
        self.length = self.matrix.tour_length(&self.order);
    }
}

impl Individual for Tour {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }

    fn fitness(&self) -> i64 {
        self.length
    }

    /// One first-improvement 2-opt pass.
    fn optimize(&mut self) {
        let n = self.order.len();
        if n < 4 {
            return;
        }

        for i in 0..n - 2 {
            for j in (i + 2)..n {
                // Edges (i, i+1) and (j, j+1) share a city when they wrap around.
                if i == 0 && j == n - 1 {
                    continue;
                }
                let a = self.order[i];
                let b = self.order[i + 1];
                let c = self.order[j];
                let d = self.order[(j + 1) % n];

                let delta = self.matrix.distance(a, c) + self.matrix.distance(b, d)
                    - self.matrix.distance(a, b)
                    - self.matrix.distance(c, d);
                if delta < 0 {
                    self.order[i + 1..=j].reverse();
                    self.length += delta;
                }
            }
        }
    }

    fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.order.len();
        if n < 2 {
            return;
        }
        let a = rng.gen_range(0..n);
        let b = rng.gen_range(0..n);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.order[lo..=hi].reverse();
        self.recompute_length();
    }

    fn crossover<R: Rng + ?Sized>(&mut self, parent1: &Self, parent2: &Self, rng: &mut R) {
        let n = parent1.order.len();
        if n == 0 || parent2.order.len() != n {
            return;
        }

        let a = rng.gen_range(0..n);
        let b = rng.gen_range(0..n);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let mut used = vec![false; n];
        let mut child = vec![usize::MAX; n];
        for idx in lo..=hi {
            let city = parent1.order[idx];
            child[idx] = city;
            used[city] = true;
        }

        // Fill the remaining positions after the slice, in parent2's order.
        let mut position = (hi + 1) % n;
        for offset in 0..n {
            let city = parent2.order[(hi + 1 + offset) % n];
            if used[city] {
                continue;
            }
            child[position] = city;
            used[city] = true;
            position = (position + 1) % n;
        }

        self.order = child;
        self.matrix = Arc::clone(&parent1.matrix);
        self.recompute_length();
    }
}

/// Spawns random tours over a shared distance matrix.
#[derive(Debug, Clone)]
pub struct TourProblem {
    matrix: Arc<DistanceMatrix>,
    next_id: Arc<AtomicU64>,
}

impl TourProblem {
    pub fn new(matrix: Arc<DistanceMatrix>) -> Self {
        Self {
            matrix,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Problem drawing ids from an existing counter, so several optimizers
    /// never hand out the same id.
    pub fn with_id_source(matrix: Arc<DistanceMatrix>, next_id: Arc<AtomicU64>) -> Self {
        Self { matrix, next_id }
    }

    pub fn matrix(&self) -> &Arc<DistanceMatrix> {
        &self.matrix
    }
}

impl Problem for TourProblem {
    type Individual = Tour;

    fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Tour {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Tour::random(id, Arc::clone(&self.matrix), rng)
    }
}
