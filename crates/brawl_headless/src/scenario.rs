//! Scenario loading and configuration.
//!
//! Scenarios define the rosters and balance values for headless battles.
//! Opponents are either listed explicitly or produced by the seeded
//! opponent generator for a given turn.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Skeleton rush",
//!     mine: [
//!         (kind: Skeleton, overrides: (id: 1)),
//!         (kind: Golem, overrides: (id: 2, attack: Some(2))),
//!     ],
//!     opponents: Generated(turn: 3),
//! )
//! ```

use std::path::Path;

use brawl_core::config::BalanceConfig;
use brawl_core::context::BattleContext;
use brawl_core::error::BattleError;
use brawl_core::opponent::{OpponentGenerator, ScaledOpponentGenerator};
use brawl_core::unit::{RosterUnit, UnitId, UnitKind, UnitOverrides};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("Failed to access scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to write RON: {0}")]
    WriteError(#[from] ron::Error),
    /// Battle could not be resolved.
    #[error("Battle failed: {0}")]
    Battle(#[from] BattleError),
}

/// Where the opponent roster comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpponentSetup {
    /// Explicit roster, front first.
    Roster(Vec<RosterUnit>),
    /// Roster drawn by [`ScaledOpponentGenerator`], seeded per battle.
    Generated {
        /// Turn whose scaling applies.
        turn: u32,
    },
}

impl Default for OpponentSetup {
    fn default() -> Self {
        Self::Generated { turn: 1 }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Player roster, front first.
    pub mine: Vec<RosterUnit>,
    /// Opponent roster source.
    #[serde(default)]
    pub opponents: OpponentSetup,
    /// Gold in the purse when the battle starts.
    #[serde(default)]
    pub gold: i32,
    /// Balance values. Omitted fields use the defaults.
    #[serde(default)]
    pub balance: BalanceConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        tracing::debug!(name = %scenario.name, path = %path.display(), "Loaded scenario");
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Write the scenario as pretty RON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScenarioError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "skirmish" => Some(Self::skirmish()),
            "mirror" => Some(Self::skeleton_mirror()),
            "gauntlet" => Some(Self::gauntlet()),
            _ => None,
        }
    }

    /// Resolve a scenario argument: a built-in name or a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Mixed line-up against a generated turn-3 opponent.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "skirmish".to_string(),
            description: "Mixed line-up against a generated turn-3 opponent".to_string(),
            mine: roster(&[
                UnitKind::Skeleton,
                UnitKind::Spider,
                UnitKind::Plant,
                UnitKind::OrcThief,
                UnitKind::Falcon,
            ]),
            opponents: OpponentSetup::Generated { turn: 3 },
            gold: 0,
            balance: BalanceConfig::default(),
        }
    }

    /// Skeleton against skeleton, a guaranteed draw.
    #[must_use]
    pub fn skeleton_mirror() -> Self {
        Self {
            name: "mirror".to_string(),
            description: "Two skeletons trade blows and both fall".to_string(),
            mine: roster(&[UnitKind::Skeleton]),
            opponents: OpponentSetup::Roster(vec![RosterUnit::new(
                UnitKind::Skeleton,
                UnitOverrides::new(UnitId(100)),
            )]),
            gold: 0,
            balance: BalanceConfig::default(),
        }
    }

    /// Full line-up against a late-game generated opponent.
    #[must_use]
    pub fn gauntlet() -> Self {
        Self {
            name: "gauntlet".to_string(),
            description: "Seven units against a turn-9 opponent".to_string(),
            mine: roster(&[
                UnitKind::Falcon,
                UnitKind::Golem,
                UnitKind::Lizard,
                UnitKind::Ogre,
                UnitKind::Orc,
                UnitKind::Spider,
                UnitKind::Plant,
            ]),
            opponents: OpponentSetup::Generated { turn: 9 },
            gold: 0,
            balance: BalanceConfig::default(),
        }
    }

    /// Opponent roster for a battle seed.
    #[must_use]
    pub fn opponent_roster(&self, seed: u64) -> Vec<RosterUnit> {
        match &self.opponents {
            OpponentSetup::Roster(units) => units.clone(),
            OpponentSetup::Generated { turn } => ScaledOpponentGenerator::new(seed).generate(*turn),
        }
    }

    /// Battle context for a battle seed.
    #[must_use]
    pub fn context(&self, seed: u64) -> BattleContext {
        let turn = match self.opponents {
            OpponentSetup::Generated { turn } => turn,
            OpponentSetup::Roster(_) => 1,
        };
        BattleContext::new(self.mine.clone(), seed)
            .with_gold(self.gold)
            .with_turn(turn)
    }
}

fn roster(kinds: &[UnitKind]) -> Vec<RosterUnit> {
    kinds
        .iter()
        .zip(1u32..)
        .map(|(&kind, id)| RosterUnit::new(kind, UnitOverrides::new(UnitId(id))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_scenario() {
        let scenario = Scenario::from_ron_str(
            r#"Scenario(
                name: "tiny",
                mine: [(kind: Golem, overrides: (id: 1, attack: Some(3)))],
                opponents: Roster([(kind: Skeleton, overrides: (id: 2))]),
            )"#,
        )
        .unwrap();
        assert_eq!(scenario.name, "tiny");
        assert_eq!(scenario.mine[0].overrides.attack, Some(3));
        assert_eq!(scenario.opponent_roster(0).len(), 1);
        assert_eq!(scenario.balance, BalanceConfig::default());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = Scenario::from_ron_str("Scenario(name: ");
        assert!(matches!(result, Err(ScenarioError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Scenario::load("/nonexistent/brawl.ron");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gauntlet.ron");
        let scenario = Scenario::gauntlet();
        scenario.save(&path).unwrap();
        assert_eq!(Scenario::load(&path).unwrap(), scenario);
    }

    #[test]
    fn test_generated_opponents_depend_on_seed_only() {
        let scenario = Scenario::skirmish();
        assert_eq!(scenario.opponent_roster(4), scenario.opponent_roster(4));
        assert_eq!(scenario.context(4).turn, 3);
    }

    #[test]
    fn test_builtin_names() {
        for name in ["skirmish", "mirror", "gauntlet"] {
            assert_eq!(Scenario::builtin(name).unwrap().name, name);
        }
        assert!(Scenario::builtin("unknown").is_none());
    }
}
