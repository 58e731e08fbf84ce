//! Top-level run document consumed by the command line tool.

use serde::{Deserialize, Serialize};

use super::{ConfigError, OptimizerConfig, StopConfig};

/// Everything needed to run the sample tour problem from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Optimizer settings shared by every instance.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Stop conditions.
    #[serde(default = "default_stop")]
    pub stop: StopConfig,
    /// Sample problem definition.
    #[serde(default)]
    pub tour: TourConfig,
    /// Independent optimizer instances run in parallel. Instance `i` uses
    /// `random_seed + i` when a seed is set.
    #[serde(default = "default_instances")]
    pub instances: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig {
                population_size: 50,
                random_seed: Some(42),
                ..Default::default()
            },
            stop: default_stop(),
            tour: TourConfig::default(),
            instances: default_instances(),
        }
    }
}

fn default_stop() -> StopConfig {
    StopConfig {
        max_generations: Some(5000),
        stagnation_limit: Some(2500),
        target_fitness: None,
    }
}

fn default_instances() -> usize {
    1
}

impl RunConfig {
    /// Validate run configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.optimizer.validate()?;
        self.tour.validate()
    }
}

/// Randomly generated travelling-salesman instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourConfig {
    /// Number of cities.
    #[serde(default = "default_city_count")]
    pub cities: usize,
    /// Number of Gaussian clusters the cities are drawn around.
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    /// Side length of the square map.
    #[serde(default = "default_map_size")]
    pub map_size: f64,
    /// Standard deviation of each cluster.
    #[serde(default = "default_cluster_spread")]
    pub cluster_spread: f64,
    /// Seed for city generation, independent from the optimizer seed.
    #[serde(default)]
    pub seed: u64,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            cities: default_city_count(),
            clusters: default_clusters(),
            map_size: default_map_size(),
            cluster_spread: default_cluster_spread(),
            seed: 0,
        }
    }
}

fn default_city_count() -> usize {
    60
}
fn default_clusters() -> usize {
    4
}
fn default_map_size() -> f64 {
    1000.0
}
fn default_cluster_spread() -> f64 {
    80.0
}

impl TourConfig {
    /// Validate tour parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cities < 4 {
            return Err(ConfigError::InvalidTour(
                "at least 4 cities are required".to_string(),
            ));
        }
        if self.clusters == 0 {
            return Err(ConfigError::InvalidTour(
                "cluster count must be non-zero".to_string(),
            ));
        }
        if !(self.map_size.is_finite() && self.map_size > 0.0) {
            return Err(ConfigError::InvalidTour(format!(
                "map size must be positive, got {}",
                self.map_size
            )));
        }
        if !(self.cluster_spread.is_finite() && self.cluster_spread >= 0.0) {
            return Err(ConfigError::InvalidTour(format!(
                "cluster spread must be non-negative, got {}",
                self.cluster_spread
            )));
        }
        Ok(())
    }
}
