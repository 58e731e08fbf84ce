//! Planet Colonizer CLI - Optimize a generated tour from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use rayon::prelude::*;

use planet_colonizer::{
    Optimizer,
    compute::evolution::{DistanceMatrix, TourProblem},
    schema::{RunConfig, RunSummary},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [instances]", args[0]);
        eprintln!();
        eprintln!("Optimize a generated travelling-salesman tour.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!("  instances    Independent optimizers to run (overrides config)");
        eprintln!();
        eprintln!("Example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let mut config: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Some(instances) = args.get(2).and_then(|s| s.parse().ok()) {
        config.instances = instances;
    }
    config.instances = config.instances.max(1);

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let matrix = DistanceMatrix::generate(&config.tour).unwrap_or_else(|e| {
        eprintln!("Error generating tour: {}", e);
        std::process::exit(1);
    });
    let matrix = Arc::new(matrix);

    println!("Planet Colonizer");
    println!("================");
    println!("Cities: {}", matrix.len());
    println!("Population: {}", config.optimizer.population_size);
    println!("Instances: {}", config.instances);
    println!(
        "Stop: max generations {:?}, stagnation limit {:?}, target {:?}",
        config.stop.max_generations, config.stop.stagnation_limit, config.stop.target_fitness
    );
    println!();

    println!("Running optimization...");
    let start = Instant::now();
    let ids = Arc::new(AtomicU64::new(0));

    let results: Vec<_> = (0..config.instances)
        .into_par_iter()
        .map(|instance| -> Result<(RunSummary<u64>, Vec<usize>), String> {
            let mut optimizer_config = config.optimizer.clone();
            optimizer_config.random_seed = optimizer_config
                .random_seed
                .map(|seed| seed.wrapping_add(instance as u64));

            let problem = TourProblem::with_id_source(Arc::clone(&matrix), Arc::clone(&ids));
            let mut optimizer =
                Optimizer::new(optimizer_config, problem).map_err(|e| e.to_string())?;

            let summary = optimizer
                .run_with_callback(&config.stop, |progress| {
                    if progress.generation % 500 == 0 {
                        log::info!(
                            "Instance {}: generation {}, best length {}, cataclysms {}",
                            instance,
                            progress.generation,
                            progress.best_fitness,
                            progress.cataclysms
                        );
                    }
                })
                .map_err(|e| e.to_string())?;

            Ok((summary, optimizer.best().order().to_vec()))
        })
        .collect();

    let elapsed = start.elapsed();

    let mut best: Option<(RunSummary<u64>, Vec<usize>)> = None;
    for (instance, result) in results.into_iter().enumerate() {
        match result {
            Ok((summary, order)) => {
                println!(
                    "  Instance {}: length={}, generations={}, cataclysms={}, stop={:?}, {:.1} gen/s",
                    instance,
                    summary.progress.best_fitness,
                    summary.progress.generation,
                    summary.progress.cataclysms,
                    summary.stop_reason,
                    summary.generations_per_second
                );
                let improves = best
                    .as_ref()
                    .is_none_or(|(b, _)| summary.progress.best_fitness < b.progress.best_fitness);
                if improves {
                    best = Some((summary, order));
                }
            }
            Err(e) => eprintln!("  Instance {}: failed: {}", instance, e),
        }
    }

    let Some((summary, order)) = best else {
        eprintln!("No instance completed");
        std::process::exit(1);
    };

    // Sanity check the reported length against the final tour.
    let length = matrix.tour_length(&order);
    println!();
    println!("Best tour:");
    println!("  Length: {}", length);
    println!("  Individual: {}", summary.progress.best_id);
    println!("  Order: {:?}", order);
    println!("Time: {:.2}s", elapsed.as_secs_f32());

    if length != summary.progress.best_fitness {
        log::warn!(
            "Reported length {} differs from recomputed length {}",
            summary.progress.best_fitness,
            length
        );
    }
}

fn print_example_config() {
    let config = RunConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error encoding example config: {}", e),
    }
}
