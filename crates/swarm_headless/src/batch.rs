//! Batch runner.
//!
//! Plays many seeded games in parallel using rayon and aggregates their
//! metrics. Each game owns its simulation; nothing is shared across
//! threads but the read-only config.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::metrics::{BatchSummary, GameMetrics};
use crate::runner::{run_game, RunConfig};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run.
    pub game_count: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Settings shared by every game; its scenario seed is overridden.
    pub run: RunConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            parallel_games: 0,
            run: RunConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Create a config for `game_count` games of `run`.
    #[must_use]
    pub fn new(run: RunConfig, game_count: u32) -> Self {
        Self {
            game_count,
            run,
            ..Default::default()
        }
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Error during batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual game metrics, in seed order.
    pub games: Vec<GameMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Games that failed to start.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Run a batch of games.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        "Starting batch run"
    );

    if config.parallel_games > 0 {
        // Ignore if the global pool is already set
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok();
    }

    let results: Vec<std::result::Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_game(config.run.clone().with_seed(seed)) {
                Ok(result) => Ok(result.metrics),
                Err(e) => {
                    warn!(game = i, seed, error = %e, "Game failed to start");
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.is_ok());
    let games: Vec<GameMetrics> = games.into_iter().filter_map(|r| r.ok()).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(|r| r.err()).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        errors = errors.len(),
        seconds = duration_seconds,
        "Batch complete"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Result of replaying one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed replayed.
    pub seed: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Whether every run ended in the same state.
    pub deterministic: bool,
}

/// Play the same seed `runs` times and compare final state hashes.
///
/// # Errors
///
/// Propagates setup errors from the first failing run.
pub fn verify_determinism(run: &RunConfig, seed: u64, runs: u32) -> Result<VerifyReport> {
    let hashes = (0..runs)
        .map(|_| run_game(run.clone().with_seed(seed)).map(|r| r.metrics.final_state_hash))
        .collect::<Result<Vec<u64>>>()?;

    Ok(VerifyReport {
        seed,
        deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::math::Fixed;
    use swarm_test_utils::fixtures::small_scenario;

    fn quick_run() -> RunConfig {
        RunConfig {
            max_ticks: 60,
            dt: Fixed::from_num(0.5),
            scenario: small_scenario(0),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(quick_run(), 500).with_seed(12345);
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.run.max_ticks, 60);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(BatchConfig::new(quick_run(), 6).with_seed(10));

        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_failed_setup_is_reported() {
        let mut run = quick_run();
        run.scenario.structure_count = 1;
        let results = run_batch(BatchConfig::new(run, 2));

        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 2);
        assert_eq!(results.summary, BatchSummary::default());
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&quick_run(), 12345, 3).unwrap();
        assert!(report.deterministic);
        assert_eq!(report.hashes.len(), 3);
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new(quick_run(), 3));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("batch.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        let hashes = |r: &BatchResults| -> Vec<u64> {
            r.games.iter().map(|g| g.final_state_hash).collect()
        };
        assert_eq!(hashes(&loaded), hashes(&results));
        assert_eq!(loaded.config, results.config);
    }
}
