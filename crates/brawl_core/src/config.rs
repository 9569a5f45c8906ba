//! Balance and pacing configuration.
//!
//! Every numeric balance constant lives here rather than inside the
//! archetype hooks, so tuning a kill reward or a ranged amount is a data
//! change. All structs deserialize from RON with per-field defaults, so a
//! config file only needs to list the values it overrides.
//!
//! # Example RON
//!
//! ```ron
//! BalanceConfig(
//!     max_steps: 2000,
//!     abilities: (
//!         kill_loot_gold: 2,
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

/// Playback speed class of an event, in presentation frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSpeed {
    /// Long, readable animations.
    Slow,
    /// Default for fights and ranged attacks.
    Medium,
    /// Quick buffs and resource ticks.
    Fast,
}

/// Frame budgets for each event speed plus the fast-forward factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Frames for [`EventSpeed::Slow`].
    pub slow_frames: u32,
    /// Frames for [`EventSpeed::Medium`].
    pub medium_frames: u32,
    /// Frames for [`EventSpeed::Fast`].
    pub fast_frames: u32,
    /// Extra frames per additional target of a multi-target event.
    pub extra_target_frames: u32,
    /// Playback rate in percent. 50 doubles every duration, 200 halves it.
    pub playback_percent: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            slow_frames: 140,
            medium_frames: 100,
            fast_frames: 60,
            extra_target_frames: 20,
            playback_percent: 50,
        }
    }
}

impl PacingConfig {
    /// Duration of a single-target event of the given speed.
    #[must_use]
    pub fn duration(&self, speed: EventSpeed) -> u32 {
        self.duration_for_targets(speed, 1)
    }

    /// Duration of an event hitting `targets` units.
    #[must_use]
    pub fn duration_for_targets(&self, speed: EventSpeed, targets: usize) -> u32 {
        let base = match speed {
            EventSpeed::Slow => self.slow_frames,
            EventSpeed::Medium => self.medium_frames,
            EventSpeed::Fast => self.fast_frames,
        };
        let extra = self
            .extra_target_frames
            .saturating_mul(targets.saturating_sub(1) as u32);
        let percent = self.playback_percent.max(1);
        // Round to nearest frame.
        ((base + extra) * 100 + percent / 2) / percent
    }
}

/// Scalars used by archetype abilities.
///
/// Most abilities scale as `step * (level - 1) + base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    /// Skeleton death buff: attack given to the ally behind.
    pub skeleton_buff_base: i32,
    /// Skeleton death buff growth per level.
    pub skeleton_buff_step: i32,
    /// Plant kill buff: attack gained.
    pub plant_buff_base: i32,
    /// Plant kill buff growth per level.
    pub plant_buff_step: i32,
    /// Ogre end-of-turn health buff.
    pub ogre_buff_base: i32,
    /// Ogre end-of-turn health buff growth per level.
    pub ogre_buff_step: i32,
    /// Spider ranged damage.
    pub spider_ranged_base: i32,
    /// Spider ranged damage growth per level.
    pub spider_ranged_step: i32,
    /// Lizard death ranged damage.
    pub lizard_ranged_base: i32,
    /// Lizard death ranged damage growth per level.
    pub lizard_ranged_step: i32,
    /// Falcon before-battle ranged damage per level.
    pub falcon_ranged_per_level: i32,
    /// Armored orc flat damage reduction.
    pub armor_base: i32,
    /// Armored orc damage reduction growth per level.
    pub armor_step: i32,
    /// Gold stolen by an orc thief per kill.
    pub kill_loot_gold: i32,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            skeleton_buff_base: 2,
            skeleton_buff_step: 4,
            plant_buff_base: 1,
            plant_buff_step: 2,
            ogre_buff_base: 1,
            ogre_buff_step: 2,
            spider_ranged_base: 1,
            spider_ranged_step: 2,
            lizard_ranged_base: 1,
            lizard_ranged_step: 2,
            falcon_ranged_per_level: 4,
            armor_base: 1,
            armor_step: 2,
            kill_loot_gold: 1,
        }
    }
}

/// Planning-phase economy values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Gold at the start of a run.
    pub starting_gold: i32,
    /// Gold granted at the start of every planning turn.
    pub gold_per_turn: i32,
    /// Price of a unit in the shop.
    pub unit_cost: i32,
    /// Price of rerolling the shop.
    pub reroll_cost: i32,
    /// Gold refunded when selling a unit.
    pub sell_value: i32,
    /// Number of offers in the shop.
    pub shop_size: usize,
    /// Maximum number of units on a planning field.
    pub max_roster_size: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_gold: 10,
            gold_per_turn: 10,
            unit_cost: 3,
            reroll_cost: 1,
            sell_value: 1,
            shop_size: 5,
            max_roster_size: 10,
        }
    }
}

/// Complete balance configuration consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Maximum resolved events before a battle is declared unresolved.
    pub max_steps: u32,
    /// Experience cap for merged units.
    pub max_xp: u32,
    /// Experience per level.
    pub xp_per_level: u32,
    /// Attack and health bonus applied on merge.
    pub merge_bonus: i32,
    /// Ability scalars.
    pub abilities: AbilityConfig,
    /// Planning economy.
    pub economy: EconomyConfig,
    /// Event durations.
    pub pacing: PacingConfig,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            max_xp: 5,
            xp_per_level: 3,
            merge_bonus: 1,
            abilities: AbilityConfig::default(),
            economy: EconomyConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl BalanceConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| BattleError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        ron::from_str(&contents).map_err(|e| BattleError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parse a configuration from a RON string.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| BattleError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Level for a given amount of experience: `floor(xp / xp_per_level) + 1`.
    #[must_use]
    pub fn level_for_xp(&self, xp: u32) -> u32 {
        xp / self.xp_per_level.max(1) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        let pacing = PacingConfig::default();
        assert_eq!(pacing.duration(EventSpeed::Medium), 200);
        assert_eq!(pacing.duration(EventSpeed::Fast), 120);
        assert_eq!(pacing.duration(EventSpeed::Slow), 280);
    }

    #[test]
    fn test_multi_target_duration_grows() {
        let pacing = PacingConfig::default();
        let one = pacing.duration_for_targets(EventSpeed::Medium, 1);
        let three = pacing.duration_for_targets(EventSpeed::Medium, 3);
        assert_eq!(three - one, 80);
        assert_eq!(pacing.duration_for_targets(EventSpeed::Medium, 0), one);
    }

    #[test]
    fn test_level_for_xp() {
        let config = BalanceConfig::default();
        assert_eq!(config.level_for_xp(1), 1);
        assert_eq!(config.level_for_xp(2), 1);
        assert_eq!(config.level_for_xp(3), 2);
        assert_eq!(config.level_for_xp(5), 2);
        assert_eq!(config.level_for_xp(6), 3);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = BalanceConfig::from_ron_str(
            "BalanceConfig(max_steps: 2000, abilities: (kill_loot_gold: 3))",
        )
        .unwrap();
        assert_eq!(config.max_steps, 2000);
        assert_eq!(config.abilities.kill_loot_gold, 3);
        assert_eq!(config.abilities.skeleton_buff_base, 2);
        assert_eq!(config.economy, EconomyConfig::default());
    }

    #[test]
    fn test_bad_ron_is_config_error() {
        let err = BalanceConfig::from_ron_str("BalanceConfig(max_steps: \"many\")").unwrap_err();
        assert!(matches!(err, BattleError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("balance.ron");
        std::fs::write(&path, "BalanceConfig(max_xp: 8)").unwrap();

        let config = BalanceConfig::load(&path).unwrap();
        assert_eq!(config.max_xp, 8);

        let missing = BalanceConfig::load(dir.path().join("missing.ron"));
        assert!(matches!(missing, Err(BattleError::ConfigParse { .. })));
    }
}
