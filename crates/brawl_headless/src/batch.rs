//! Batch battle runner for balance testing.
//!
//! Runs many seeds of one scenario in parallel using rayon and collects
//! per-battle summaries plus aggregate win rates.

use std::path::{Path, PathBuf};
use std::time::Instant;

use brawl_core::event::Outcome;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::runner::{run_summary, BattleSummary};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name or path, for the record
    pub scenario: String,
    /// Number of battles to run
    pub battle_count: u32,
    /// Maximum parallel battles (0 = use rayon default)
    pub parallel_battles: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "skirmish".to_string(),
            battle_count: 100,
            parallel_battles: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, battle_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            battle_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Battles that reached a result.
    pub total_battles: u32,
    /// Player wins.
    pub wins: u32,
    /// Player losses.
    pub losses: u32,
    /// Draws.
    pub draws: u32,
    /// Player win rate over resolved battles (0.0 to 1.0).
    pub win_rate: f64,
    /// Average resolved events per battle.
    pub avg_steps: f64,
    /// Average units lost per battle.
    pub avg_perished: f64,
    /// Battles that logged recoverable faults.
    pub battles_with_faults: u32,
}

impl BatchSummary {
    /// Aggregate a set of battle summaries.
    #[must_use]
    pub fn from_battles(battles: &[BattleSummary]) -> Self {
        if battles.is_empty() {
            return Self::default();
        }
        let count = |outcome| battles.iter().filter(|b| b.outcome == outcome).count() as u32;
        let total = battles.len() as f64;
        let wins = count(Outcome::Win);
        Self {
            total_battles: battles.len() as u32,
            wins,
            losses: count(Outcome::Loss),
            draws: count(Outcome::Draw),
            win_rate: f64::from(wins) / total,
            avg_steps: battles.iter().map(|b| f64::from(b.steps)).sum::<f64>() / total,
            avg_perished: battles.iter().map(|b| b.perished as f64).sum::<f64>() / total,
            battles_with_faults: battles.iter().filter(|b| b.faults > 0).count() as u32,
        }
    }

    /// Check if the win rate is within an acceptable range.
    #[must_use]
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        self.win_rate >= min_rate && self.win_rate <= max_rate
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual battle summaries, in seed order
    pub battles: Vec<BattleSummary>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index
    pub battle_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Run a batch of battles
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> BatchResults {
    let start = Instant::now();

    info!(
        "Starting batch run: {} battles of '{}'",
        config.battle_count, config.scenario
    );

    // Configure thread pool if specified
    if config.parallel_battles > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_battles as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<BattleSummary, BatchError>> = (0..config.battle_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_summary(scenario, seed) {
                Ok(summary) => {
                    debug!(battle = i, seed, outcome = %summary.outcome, "Battle resolved");
                    Ok(summary)
                }
                Err(e) => {
                    warn!("Battle {} failed: {}", i, e);
                    Err(BatchError {
                        battle_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (battles, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let battles: Vec<BattleSummary> = battles.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_battles(&battles);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} battles in {:.1}s ({} failed)",
        battles.len(),
        duration_seconds,
        errors.len()
    );

    BatchResults {
        config,
        battles,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by resolving the same seed multiple times.
///
/// Every run must produce the same byte-identical timeline, or fail the
/// same way.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> bool {
    let results: Vec<Result<BattleSummary, String>> = (0..runs)
        .into_par_iter()
        .map(|_| run_summary(scenario, seed).map_err(|e| e.to_string()))
        .collect();

    results.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.battle_count, 100);
        assert_eq!(config.scenario, "skirmish");
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("custom_scenario", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345);

        assert_eq!(config.scenario, "custom_scenario");
        assert_eq!(config.battle_count, 500);
        assert_eq!(config.seed_start, 12345);
    }

    #[test]
    fn test_run_batch_mirror() {
        let results = run_batch(&Scenario::skeleton_mirror(), BatchConfig::new("mirror", 10));

        assert_eq!(results.battles.len(), 10);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.draws, 10);
        assert_eq!(results.summary.win_rate, 0.0);
        // Results come back in seed order.
        let seeds: Vec<u64> = results.battles.iter().map(|b| b.seed).collect();
        assert_eq!(seeds, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let results = run_batch(&Scenario::skirmish(), BatchConfig::new("skirmish", 20));
        let summary = &results.summary;
        assert_eq!(
            summary.wins + summary.losses + summary.draws,
            summary.total_battles
        );
        assert_eq!(summary.total_battles as usize + results.errors.len(), 20);
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&Scenario::skirmish(), 12345, 5));
        assert!(verify_determinism(&Scenario::gauntlet(), 7, 3));
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(&Scenario::skeleton_mirror(), BatchConfig::new("mirror", 5));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.battles.len(), 5);
        assert_eq!(loaded.config.scenario, "mirror");
        assert_eq!(loaded.summary, results.summary);
    }
}
