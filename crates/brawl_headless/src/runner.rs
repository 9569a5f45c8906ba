//! Single battle execution and per-battle metrics.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use brawl_core::event::Outcome;
use brawl_core::simulation::{simulate, BattleReport};
use serde::{Deserialize, Serialize};

use crate::scenario::{Scenario, ScenarioError};

/// Metrics collected from one resolved battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSummary {
    /// Battle seed.
    pub seed: u64,
    /// Final outcome.
    pub outcome: Outcome,
    /// Resolved events, including the result.
    pub steps: u32,
    /// Units that died.
    pub perished: usize,
    /// Units left on the player's side at the end.
    pub survivors_mine: usize,
    /// Units left on the opponent's side at the end.
    pub survivors_opponent: usize,
    /// Gold after the battle.
    pub gold_after: i32,
    /// Recoverable faults logged during resolution.
    pub faults: usize,
    /// Playback length in frames.
    pub total_frames: u64,
    /// Hash of the encoded timeline, for determinism checks.
    pub timeline_hash: u64,
}

impl BattleSummary {
    /// Summarize a battle report.
    pub fn from_report(seed: u64, report: &BattleReport) -> Result<Self, ScenarioError> {
        let bytes = report.timeline.to_bytes()?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);

        let last = report.timeline.entries().last();
        Ok(Self {
            seed,
            outcome: report.outcome,
            steps: report.steps,
            perished: report.timeline.perished().len(),
            survivors_mine: last.map_or(0, |entry| entry.my_units.len()),
            survivors_opponent: last.map_or(0, |entry| entry.opponent_units.len()),
            gold_after: report.context.gold,
            faults: report.faults.len(),
            total_frames: report.timeline.total_duration(),
            timeline_hash: hasher.finish(),
        })
    }
}

/// Resolve one battle of a scenario.
pub fn run_battle(scenario: &Scenario, seed: u64) -> Result<BattleReport, ScenarioError> {
    let opponents = scenario.opponent_roster(seed);
    let report = simulate(scenario.context(seed), &opponents, &scenario.balance)?;
    if !report.faults.is_empty() {
        tracing::warn!(seed, faults = report.faults.len(), "Battle resolved with faults");
    }
    Ok(report)
}

/// Resolve one battle and summarize it.
pub fn run_summary(scenario: &Scenario, seed: u64) -> Result<BattleSummary, ScenarioError> {
    let report = run_battle(scenario, seed)?;
    BattleSummary::from_report(seed, &report)
}
