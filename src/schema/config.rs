//! Optimizer configuration types.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration of one steady-state optimizer instance.
///
/// Every field is fixed at construction time. Missing JSON fields fall back
/// to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Number of population slots (N). Never resized after construction.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Mutation rate restored on every improvement. A trial mutates with
    /// probability `1 / rate`.
    #[serde(default = "default_initial_mutation_rate")]
    pub initial_mutation_rate: u32,
    /// Generations without improvement before the population is regenerated.
    #[serde(default = "default_initial_cataclysm_countdown")]
    pub initial_cataclysm_countdown: u32,
    /// Fraction of the population used for the per-generation crossover and
    /// mutation counts.
    #[serde(default = "default_brood_fraction")]
    pub brood_fraction: f64,
    /// Constant added to the fractional brood count.
    #[serde(default = "default_brood_base")]
    pub brood_base: usize,
    /// Redraws allowed when picking two distinct parents and a distinct
    /// victim. The crossover is skipped once they are exhausted.
    #[serde(default = "default_max_crossover_attempts")]
    pub max_crossover_attempts: usize,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            initial_mutation_rate: default_initial_mutation_rate(),
            initial_cataclysm_countdown: default_initial_cataclysm_countdown(),
            brood_fraction: default_brood_fraction(),
            brood_base: default_brood_base(),
            max_crossover_attempts: default_max_crossover_attempts(),
            random_seed: None,
        }
    }
}

fn default_population_size() -> usize {
    10
}
fn default_initial_mutation_rate() -> u32 {
    70
}
fn default_initial_cataclysm_countdown() -> u32 {
    1000
}
fn default_brood_fraction() -> f64 {
    0.03
}
fn default_brood_base() -> usize {
    2
}
fn default_max_crossover_attempts() -> usize {
    16
}

impl OptimizerConfig {
    /// Number of crossovers attempted and mutation trials drawn per generation.
    ///
    /// `floor(N * brood_fraction + brood_base)`, so always at least `brood_base`.
    #[inline]
    pub fn brood_size(&self) -> usize {
        (self.population_size as f64 * self.brood_fraction + self.brood_base as f64).floor()
            as usize
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.initial_mutation_rate == 0 {
            return Err(ConfigError::InvalidMutationRate);
        }
        if self.initial_cataclysm_countdown == 0 {
            return Err(ConfigError::InvalidCataclysmCountdown);
        }
        if !self.brood_fraction.is_finite() || self.brood_fraction < 0.0 {
            return Err(ConfigError::InvalidBroodFraction(self.brood_fraction));
        }
        if self.max_crossover_attempts == 0 {
            return Err(ConfigError::InvalidCrossoverAttempts);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Conditions that end a run. A run with none set only stops when cancelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopConfig {
    /// Stop after this many generations.
    #[serde(default)]
    pub max_generations: Option<u64>,
    /// Stop once this many consecutive generations passed without improvement.
    #[serde(default)]
    pub stagnation_limit: Option<u64>,
    /// Stop once the best fitness is at or below this value.
    #[serde(default)]
    pub target_fitness: Option<i64>,
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 1")]
    EmptyPopulation,
    #[error("Initial mutation rate must be at least 1")]
    InvalidMutationRate,
    #[error("Initial cataclysm countdown must be at least 1")]
    InvalidCataclysmCountdown,
    #[error("Brood fraction must be finite and non-negative, got {0}")]
    InvalidBroodFraction(f64),
    #[error("Crossover attempts must be at least 1")]
    InvalidCrossoverAttempts,
    #[error("Invalid tour definition: {0}")]
    InvalidTour(String),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
