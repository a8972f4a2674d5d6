//! Novelty Archive CLI - Run a novelty search demo from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use novelty_archive::{
    ArchiveConfig, ArchiveError, NoveltyArchive, NoveltyItem, compute::weighted_euclidean,
};

const POPULATION: usize = 50;
const PARENTS: usize = 10;
const MUTATION_SIGMA: f32 = 0.5;
const GOAL: (f32, f32) = (20.0, 20.0);

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations] [out_dir]", args[0]);
        eprintln!();
        eprintln!("Run a novelty search over 2D random walkers.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to archive configuration file");
        eprintln!("  generations  Number of generations (default: 50)");
        eprintln!("  out_dir      Directory for the final archive and fittest list");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let generations: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50);
    let out_dir = args.get(3).map(PathBuf::from);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: ArchiveConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    println!("Novelty Archive");
    println!("===============");
    println!(
        "Threshold: {} (floor {})",
        config.initial_threshold, config.threshold_floor
    );
    println!("Neighbors: {}", config.neighbors);
    println!("Dispersion: {:?}", config.dispersion);
    println!("Generations: {}", generations);
    println!();

    let neighbors = config.neighbors;
    let mut archive: NoveltyArchive = NoveltyArchive::with_distance(config, weighted_euclidean)
        .unwrap_or_else(|e| {
            eprintln!("Error creating archive: {}", e);
            std::process::exit(1);
        });

    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, MUTATION_SIGMA).unwrap();
    let mut parents = vec![(0.0f32, 0.0f32)];
    let mut next_id = 0u64;

    println!("Running search...");
    let start = Instant::now();

    for generation in 0..generations {
        let mut candidates: Vec<NoveltyItem> = (0..POPULATION)
            .map(|_| {
                let (px, py) = parents[rng.gen_range(0..parents.len())];
                let x = px + noise.sample(&mut rng);
                let y = py + noise.sample(&mut rng);
                next_id += 1;
                NoveltyItem::from_descriptor(vec![x, y, x, y])
                    .with_fitness(fitness(x, y))
                    .with_source_id(next_id)
            })
            .collect();

        archive.score_candidates(&mut candidates, neighbors);

        for candidate in &candidates {
            archive.update_fittest(candidate);
        }

        candidates.sort_by(|a, b| b.novelty.total_cmp(&a.novelty));
        parents = candidates
            .iter()
            .take(PARENTS)
            .map(|c| (c.descriptor()[0], c.descriptor()[1]))
            .collect();

        for candidate in candidates {
            archive.add_to_generation(candidate);
        }
        if let Err(e) = archive.end_of_generation() {
            eprintln!("Error closing generation: {}", e);
            std::process::exit(1);
        }

        // Print progress every 10%
        if (generation + 1) % (generations / 10).max(1) == 0 {
            let best = archive.fittest().first().map_or(0.0, |item| item.fitness);
            println!(
                "  Generation {}/{}: archive={}, threshold={:.4}, best fitness={:.4}",
                generation + 1,
                generations,
                archive.len(),
                archive.threshold(),
                best
            );
        }
    }

    let elapsed = start.elapsed();

    println!();
    println!("Final archive:");
    println!("  Items: {}", archive.len());
    println!("  Threshold: {:.4}", archive.threshold());
    for (rank, item) in archive.fittest().iter().enumerate() {
        println!(
            "  Fittest #{}: fitness={:.4} at ({:.2}, {:.2})",
            rank + 1,
            item.fitness,
            item.descriptor()[0],
            item.descriptor()[1]
        );
    }
    println!("Time: {:.2}s", elapsed.as_secs_f32());

    if let Some(dir) = out_dir {
        let result = fs::create_dir_all(&dir)
            .map_err(ArchiveError::from)
            .and_then(|_| archive.serialize(dir.join("archive.dat")))
            .and_then(|_| archive.serialize_fittest(dir.join("fittest.dat")));
        if let Err(e) = result {
            eprintln!("Error saving archive: {}", e);
            std::process::exit(1);
        }
        println!("Saved archive to {}", dir.display());
    }
}

/// Closeness to the goal, in (0, 1].
fn fitness(x: f32, y: f32) -> f32 {
    let distance = ((x - GOAL.0).powi(2) + (y - GOAL.1).powi(2)).sqrt();
    1.0 / (1.0 + distance)
}

fn print_example_config() {
    let config = ArchiveConfig::default();

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
}
