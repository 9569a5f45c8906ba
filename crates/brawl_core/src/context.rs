//! Battle context: the slice of run state a battle reads and writes.
//!
//! The planning layer owns gold, the turn counter and the persistent
//! roster between battles. It hands a [`BattleContext`] to the engine and
//! receives it back, with deltas applied, inside the battle report.

use serde::{Deserialize, Serialize};

use crate::abilities::archetype;
use crate::unit::{RosterUnit, UnitId};

/// Run state passed into and returned from a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleContext {
    /// Gold in the purse.
    pub gold: i32,
    /// Game progress counter.
    pub turn: u32,
    /// Persistent player roster, front first.
    pub roster: Vec<RosterUnit>,
    /// Seed for in-battle random rolls.
    pub seed: u64,
}

impl BattleContext {
    /// Context with no gold on turn 1.
    #[must_use]
    pub fn new(roster: Vec<RosterUnit>, seed: u64) -> Self {
        Self {
            gold: 0,
            turn: 1,
            roster,
            seed,
        }
    }

    /// Set the purse.
    #[must_use]
    pub fn with_gold(mut self, gold: i32) -> Self {
        self.gold = gold;
        self
    }

    /// Set the turn counter.
    #[must_use]
    pub fn with_turn(mut self, turn: u32) -> Self {
        self.turn = turn;
        self
    }

    /// Roster entry for a unit.
    #[must_use]
    pub fn roster_entry(&self, id: UnitId) -> Option<&RosterUnit> {
        self.roster.iter().find(|entry| entry.id() == id)
    }

    /// Carry a stat delta into the persistent roster.
    ///
    /// Returns `false` if the unit is not part of the roster (opponents,
    /// or units that only exist for this battle).
    pub fn persist_buff(&mut self, id: UnitId, attack: i32, health: i32) -> bool {
        let Some(entry) = self.roster.iter_mut().find(|entry| entry.id() == id) else {
            return false;
        };
        let base = archetype(entry.kind);
        let overrides = &mut entry.overrides;
        overrides.attack = Some(overrides.attack.unwrap_or(base.base_attack) + attack);
        overrides.health = Some(overrides.health.unwrap_or(base.base_health) + health);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{UnitKind, UnitOverrides};

    #[test]
    fn test_persist_buff_fills_defaults() {
        let mut context = BattleContext::new(
            vec![RosterUnit::new(UnitKind::Plant, UnitOverrides::new(UnitId(1)))],
            0,
        );
        assert!(context.persist_buff(UnitId(1), 1, 2));
        let entry = context.roster_entry(UnitId(1)).unwrap();
        assert_eq!(entry.overrides.attack, Some(2));
        assert_eq!(entry.overrides.health, Some(4));
    }

    #[test]
    fn test_persist_buff_ignores_strangers() {
        let mut context = BattleContext::new(Vec::new(), 0).with_gold(5).with_turn(3);
        assert!(!context.persist_buff(UnitId(9), 1, 1));
        assert_eq!(context.gold, 5);
        assert_eq!(context.turn, 3);
    }
}
