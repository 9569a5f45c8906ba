//! Opponent roster generation.
//!
//! The engine treats opponents as an opaque roster. Generators only have
//! to hand out ids that never collide with the player's.

use serde::{Deserialize, Serialize};

use crate::abilities::archetype;
use crate::rng::BattleRng;
use crate::unit::{Facing, RosterUnit, UnitIdAllocator, UnitKind, UnitOverrides};

/// First id handed to generated opponents.
pub const OPPONENT_ID_BASE: u32 = 1_000_000;

/// Produces opponent rosters.
pub trait OpponentGenerator {
    /// Roster for the given turn, front first.
    fn generate(&mut self, turn: u32) -> Vec<RosterUnit>;
}

/// Seeded generator whose rosters grow in size and stats with the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledOpponentGenerator {
    rng: BattleRng,
    ids: UnitIdAllocator,
    pool: Vec<UnitKind>,
    /// Units on turn 1.
    pub base_size: usize,
    /// Largest roster ever produced.
    pub max_size: usize,
    /// Turns between each extra unit.
    pub turns_per_unit: u32,
    /// Turns between each +1/+1 stat bonus.
    pub turns_per_bonus: u32,
}

impl ScaledOpponentGenerator {
    /// Generator drawing from every archetype.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: BattleRng::new(seed),
            ids: UnitIdAllocator::starting_at(OPPONENT_ID_BASE),
            pool: UnitKind::ALL.to_vec(),
            base_size: 1,
            max_size: 7,
            turns_per_unit: 1,
            turns_per_bonus: 3,
        }
    }

    /// Restrict the archetypes drawn. An empty pool falls back to golems.
    #[must_use]
    pub fn with_pool(mut self, pool: Vec<UnitKind>) -> Self {
        self.pool = pool;
        self
    }

    /// Roster size for a turn.
    #[must_use]
    pub fn size_for_turn(&self, turn: u32) -> usize {
        let grown = turn.saturating_sub(1) / self.turns_per_unit.max(1);
        (self.base_size + grown as usize).min(self.max_size)
    }

    /// Flat attack and health bonus for a turn.
    #[must_use]
    pub fn bonus_for_turn(&self, turn: u32) -> i32 {
        (turn.saturating_sub(1) / self.turns_per_bonus.max(1)) as i32
    }
}

impl OpponentGenerator for ScaledOpponentGenerator {
    fn generate(&mut self, turn: u32) -> Vec<RosterUnit> {
        let size = self.size_for_turn(turn);
        let bonus = self.bonus_for_turn(turn);
        let mut roster = Vec::with_capacity(size);
        for _ in 0..size {
            let kind = if self.pool.is_empty() {
                UnitKind::Golem
            } else {
                self.pool[self.rng.next_index(self.pool.len())]
            };
            let base = archetype(kind);
            let overrides = UnitOverrides::new(self.ids.allocate())
                .with_stats(base.base_attack + bonus, base.base_health + bonus)
                .with_facing(Facing::Left);
            roster.push(RosterUnit::new(kind, overrides));
        }
        tracing::debug!(turn, size, bonus, "Generated opponent roster");
        roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_bonus_scale() {
        let generator = ScaledOpponentGenerator::new(1);
        assert_eq!(generator.size_for_turn(1), 1);
        assert_eq!(generator.size_for_turn(4), 4);
        assert_eq!(generator.size_for_turn(40), 7);
        assert_eq!(generator.bonus_for_turn(1), 0);
        assert_eq!(generator.bonus_for_turn(4), 1);
    }

    #[test]
    fn test_same_seed_same_roster() {
        let mut a = ScaledOpponentGenerator::new(9);
        let mut b = ScaledOpponentGenerator::new(9);
        assert_eq!(a.generate(5), b.generate(5));
    }

    #[test]
    fn test_ids_never_repeat() {
        let mut generator = ScaledOpponentGenerator::new(2);
        let first = generator.generate(3);
        let second = generator.generate(3);
        for unit in &second {
            assert!(first.iter().all(|other| other.id() != unit.id()));
            assert!(unit.id().0 >= OPPONENT_ID_BASE);
        }
    }

    #[test]
    fn test_pool_restricts_kinds() {
        let mut generator = ScaledOpponentGenerator::new(2).with_pool(vec![UnitKind::Orc]);
        assert!(generator.generate(6).iter().all(|unit| unit.kind == UnitKind::Orc));
        let mut empty = ScaledOpponentGenerator::new(2).with_pool(Vec::new());
        assert!(empty.generate(2).iter().all(|unit| unit.kind == UnitKind::Golem));
    }

    #[test]
    fn test_stats_include_bonus() {
        let mut generator = ScaledOpponentGenerator::new(2).with_pool(vec![UnitKind::Golem]);
        let roster = generator.generate(7);
        let golem = &roster[0].overrides;
        assert_eq!(golem.attack, Some(3));
        assert_eq!(golem.health, Some(7));
    }
}
