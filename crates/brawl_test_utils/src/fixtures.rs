//! Test fixtures and helpers.
//!
//! Pre-built rosters and battle contexts for consistent testing.

use brawl_core::config::BalanceConfig;
use brawl_core::context::BattleContext;
use brawl_core::unit::{RosterUnit, UnitId, UnitKind, UnitOverrides};
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In battle code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Roster entry with archetype default stats.
#[must_use]
pub fn unit(kind: UnitKind, id: u32) -> RosterUnit {
    RosterUnit::new(kind, UnitOverrides::new(UnitId(id)))
}

/// Roster entry with explicit attack and health.
#[must_use]
pub fn unit_with(kind: UnitKind, id: u32, attack: i32, health: i32) -> RosterUnit {
    RosterUnit::new(kind, UnitOverrides::new(UnitId(id)).with_stats(attack, health))
}

/// Roster from `(kind, id)` pairs, front first.
#[must_use]
pub fn roster(units: &[(UnitKind, u32)]) -> Vec<RosterUnit> {
    units.iter().map(|&(kind, id)| unit(kind, id)).collect()
}

/// Battle context for a player roster, with no gold.
#[must_use]
pub fn context(roster: Vec<RosterUnit>, seed: u64) -> BattleContext {
    BattleContext::new(roster, seed)
}

/// Default balance config.
#[must_use]
pub fn config() -> BalanceConfig {
    BalanceConfig::default()
}

/// Skeleton against skeleton: both die in the first fight.
#[must_use]
pub fn skeleton_mirror() -> (Vec<RosterUnit>, Vec<RosterUnit>) {
    (
        vec![unit_with(UnitKind::Skeleton, 1, 2, 1)],
        vec![unit_with(UnitKind::Skeleton, 2, 2, 1)],
    )
}

/// Golem against skeleton: the golem survives the first fight.
#[must_use]
pub fn golem_vs_skeleton() -> (Vec<RosterUnit>, Vec<RosterUnit>) {
    (
        vec![unit_with(UnitKind::Golem, 1, 1, 5)],
        vec![unit_with(UnitKind::Skeleton, 2, 2, 1)],
    )
}

/// Mixed line-up exercising death, kill, hit and pre-fight hooks.
#[must_use]
pub fn mixed_skirmish() -> (Vec<RosterUnit>, Vec<RosterUnit>) {
    (
        roster(&[
            (UnitKind::Skeleton, 1),
            (UnitKind::Spider, 2),
            (UnitKind::Plant, 3),
            (UnitKind::OrcThief, 4),
        ]),
        roster(&[
            (UnitKind::Orc, 10),
            (UnitKind::Lizard, 11),
            (UnitKind::Falcon, 12),
            (UnitKind::Golem, 13),
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_have_unique_ids() {
        let (mine, theirs) = mixed_skirmish();
        let mut ids: Vec<_> = mine.iter().chain(&theirs).map(RosterUnit::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), mine.len() + theirs.len());
    }

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(2), I32F32::from_num(2));
        assert_eq!(fixed_f(0.5) * fixed(2), fixed(1));
    }
}
