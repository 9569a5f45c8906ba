//! Planning phase: shop, roster management and end of turn.
//!
//! The [`PlanningField`] owns the persistent roster between battles. It is
//! the only writer of that roster apart from the engine's buff persistence,
//! which comes back through [`PlanningField::finish_battle`].

use serde::{Deserialize, Serialize};

use crate::abilities::archetype;
use crate::config::BalanceConfig;
use crate::context::BattleContext;
use crate::error::{BattleError, Result};
use crate::event::{BattleEvent, EventKind, ResourceKind};
use crate::field::{Field, Side};
use crate::rng::BattleRng;
use crate::unit::{
    ArchetypeFactory, Facing, LifeState, RosterUnit, Unit, UnitFactory, UnitId, UnitIdAllocator,
    UnitKind, UnitOverrides,
};

/// Seeded shop offering archetypes for purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    offers: Vec<UnitKind>,
    size: usize,
    rng: BattleRng,
}

impl Shop {
    /// Shop with `size` freshly rolled offers.
    #[must_use]
    pub fn new(seed: u64, size: usize) -> Self {
        let mut shop = Self {
            offers: Vec::with_capacity(size),
            size,
            rng: BattleRng::new(seed),
        };
        shop.roll();
        shop
    }

    /// Replace every offer.
    pub fn roll(&mut self) {
        self.offers.clear();
        for _ in 0..self.size {
            let kind = UnitKind::ALL[self.rng.next_index(UnitKind::ALL.len())];
            self.offers.push(kind);
        }
    }

    /// Current offers.
    #[must_use]
    pub fn offers(&self) -> &[UnitKind] {
        &self.offers
    }

    fn take(&mut self, index: usize) -> Option<UnitKind> {
        (index < self.offers.len()).then(|| self.offers.remove(index))
    }
}

/// The player's roster and purse between battles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningField {
    field: Field,
    gold: i32,
    turn: u32,
    ids: UnitIdAllocator,
    shop: Shop,
    config: BalanceConfig,
}

impl PlanningField {
    /// Start a run.
    #[must_use]
    pub fn new(config: BalanceConfig, seed: u64) -> Self {
        Self {
            field: Field::new(Side::Mine),
            gold: config.economy.starting_gold,
            turn: 1,
            ids: UnitIdAllocator::default(),
            shop: Shop::new(seed, config.economy.shop_size),
            config,
        }
    }

    /// Gold in the purse.
    #[must_use]
    pub const fn gold(&self) -> i32 {
        self.gold
    }

    /// Turn counter.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Roster, front first.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    /// The shop.
    #[must_use]
    pub const fn shop(&self) -> &Shop {
        &self.shop
    }

    /// Balance constants in use.
    #[must_use]
    pub const fn config(&self) -> &BalanceConfig {
        &self.config
    }

    fn spend(&mut self, cost: i32) -> Result<()> {
        if self.gold < cost {
            return Err(BattleError::InsufficientGold {
                required: cost,
                available: self.gold,
            });
        }
        self.gold -= cost;
        Ok(())
    }

    /// Buy the offer at `index` and place it at the back of the roster.
    ///
    /// # Errors
    /// Fails if the offer does not exist, the roster is full or the purse
    /// is short.
    pub fn buy(&mut self, index: usize) -> Result<UnitId> {
        if index >= self.shop.offers().len() {
            return Err(BattleError::InvalidState(format!("no shop offer at {index}")));
        }
        if self.field.len() >= self.config.economy.max_roster_size {
            return Err(BattleError::InvalidState("roster is full".to_string()));
        }
        self.spend(self.config.economy.unit_cost)?;

        let kind = self
            .shop
            .take(index)
            .ok_or_else(|| BattleError::InvalidState(format!("no shop offer at {index}")))?;
        let id = self.ids.allocate();
        let unit = ArchetypeFactory.create(kind, &UnitOverrides::new(id).with_facing(Facing::Right));
        tracing::debug!(unit = %id, %kind, gold = self.gold, "Bought unit");
        self.field.push(unit);
        Ok(id)
    }

    /// Sell a unit for its refund value.
    ///
    /// # Errors
    /// Returns [`BattleError::UnknownUnit`] if the unit is not in the roster.
    pub fn sell(&mut self, id: UnitId) -> Result<Unit> {
        let unit = self
            .field
            .remove_content(id)
            .ok_or(BattleError::UnknownUnit(id))?;
        self.gold += self.config.economy.sell_value;
        Ok(unit)
    }

    /// Reorder the roster.
    ///
    /// # Errors
    /// Fails if either index is out of range.
    pub fn move_in_array(&mut self, from: usize, to: usize) -> Result<()> {
        if self.field.move_in_array(from, to) {
            Ok(())
        } else {
            Err(BattleError::InvalidState(format!(
                "cannot move slot {from} to {to} in a roster of {}",
                self.field.len()
            )))
        }
    }

    /// Merge `merging` into `base`.
    ///
    /// The survivor keeps `base`'s id and position, gets the combined
    /// experience (capped) and the better of each stat plus the merge bonus.
    ///
    /// # Errors
    /// Fails if either unit is unknown or the pair cannot merge.
    pub fn merge(&mut self, base: UnitId, merging: UnitId) -> Result<()> {
        let consumed = self.field.get(merging).ok_or(BattleError::UnknownUnit(merging))?.clone();
        let target = self.field.get(base).ok_or(BattleError::UnknownUnit(base))?;
        if !target.is_mergeable_with(&consumed, &self.config) {
            return Err(BattleError::NotMergeable { base, merging });
        }

        let bonus = self.config.merge_bonus;
        let max_xp = self.config.max_xp;
        if let Some(target) = self.field.get_mut(base) {
            target.xp = (target.xp + consumed.xp).min(max_xp);
            target.attack = target.attack.max(consumed.attack) + bonus;
            target.health = target.health.max(consumed.health) + bonus;
        }
        self.field.remove_content(merging);
        Ok(())
    }

    /// Pay to reroll the shop.
    ///
    /// # Errors
    /// Returns [`BattleError::InsufficientGold`] if the purse is short.
    pub fn reroll(&mut self) -> Result<()> {
        self.spend(self.config.economy.reroll_cost)?;
        self.shop.roll();
        Ok(())
    }

    /// Resolve every unit's end-of-turn ability, front to back.
    ///
    /// Buffs are applied to the roster and resource events to the purse.
    /// The events are returned for presentation.
    pub fn end_turn(&mut self) -> Vec<BattleEvent> {
        let ids: Vec<UnitId> = self.field.contents().iter().map(|unit| unit.id).collect();
        let mut events = Vec::new();
        for id in ids {
            let Some(unit) = self.field.get(id) else {
                continue;
            };
            let Some(hook) = archetype(unit.kind).on_end_turn else {
                continue;
            };
            let Some(mut event) = hook(unit, &self.field, &self.config) else {
                continue;
            };
            self.apply(&mut event);
            events.push(event);
        }
        events
    }

    fn apply(&mut self, event: &mut BattleEvent) {
        let tag = event.tag();
        match &mut event.kind {
            EventKind::Buff { attack, health, .. } => {
                for &id in &event.affected_unit_ids {
                    if let Some(unit) = self.field.get_mut(id) {
                        unit.attack += *attack;
                        unit.health += *health;
                    }
                }
            }
            EventKind::Resource {
                resource: ResourceKind::Gold,
                amount,
                start_amount,
                ..
            } => {
                *start_amount = self.gold;
                self.gold += *amount;
            }
            EventKind::Fight | EventKind::Ranged { .. } | EventKind::Result { .. } => {
                tracing::warn!(kind = %tag, "Ignoring battle-only event during planning");
            }
        }
    }

    /// Battle context for the upcoming fight.
    #[must_use]
    pub fn battle_context(&self, seed: u64) -> BattleContext {
        BattleContext {
            gold: self.gold,
            turn: self.turn,
            roster: self.field.contents().iter().map(RosterUnit::from_unit).collect(),
            seed,
        }
    }

    /// Take back the context returned by a battle and start the next turn.
    pub fn finish_battle(&mut self, context: BattleContext) {
        let units = context
            .roster
            .iter()
            .map(|entry| {
                let mut unit = ArchetypeFactory.from_roster(entry);
                unit.facing = Facing::Right;
                unit.life = LifeState::Alive;
                unit
            })
            .collect();
        self.field = Field::with_contents(Side::Mine, units);
        self.gold = context.gold;
        self.begin_turn();
    }

    /// Advance the turn counter, pay income and restock the shop.
    pub fn begin_turn(&mut self) {
        self.turn += 1;
        self.gold += self.config.economy.gold_per_turn;
        self.shop.roll();
        tracing::info!(turn = self.turn, gold = self.gold, "Planning turn started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planning() -> PlanningField {
        PlanningField::new(BalanceConfig::default(), 11)
    }

    fn place(planning: &mut PlanningField, kind: UnitKind) -> UnitId {
        let id = planning.ids.allocate();
        planning
            .field
            .push(ArchetypeFactory.create(kind, &UnitOverrides::new(id)));
        id
    }

    #[test]
    fn test_shop_is_seeded() {
        let a = Shop::new(5, 5);
        let b = Shop::new(5, 5);
        assert_eq!(a.offers(), b.offers());
        assert_eq!(a.offers().len(), 5);
    }

    #[test]
    fn test_buy_charges_and_places() {
        let mut planning = planning();
        let offered = planning.shop().offers()[0];
        let id = planning.buy(0).unwrap();
        assert_eq!(planning.gold(), 7);
        assert_eq!(planning.field().get(id).unwrap().kind, offered);
        assert_eq!(planning.shop().offers().len(), 4);
        assert!(planning.buy(10).is_err());
    }

    #[test]
    fn test_buy_without_gold() {
        let mut planning = planning();
        planning.gold = 2;
        assert_eq!(
            planning.buy(0),
            Err(BattleError::InsufficientGold {
                required: 3,
                available: 2
            })
        );
        assert!(planning.field().is_empty());
    }

    #[test]
    fn test_sell_refunds() {
        let mut planning = planning();
        let id = place(&mut planning, UnitKind::Golem);
        planning.sell(id).unwrap();
        assert_eq!(planning.gold(), 11);
        assert_eq!(planning.sell(id), Err(BattleError::UnknownUnit(id)));
    }

    #[test]
    fn test_merge_rules() {
        let mut planning = planning();
        let a = place(&mut planning, UnitKind::Plant);
        let b = place(&mut planning, UnitKind::Plant);
        let c = place(&mut planning, UnitKind::Orc);

        assert_eq!(
            planning.merge(a, c),
            Err(BattleError::NotMergeable { base: a, merging: c })
        );
        planning.merge(a, b).unwrap();
        let merged = planning.field().get(a).unwrap();
        assert_eq!((merged.attack, merged.health, merged.xp), (2, 3, 2));
        assert!(!planning.field().contains(b));
    }

    #[test]
    fn test_merge_caps_xp() {
        let mut planning = planning();
        let a = place(&mut planning, UnitKind::Spider);
        let b = place(&mut planning, UnitKind::Spider);
        planning.field.get_mut(a).unwrap().xp = 4;
        planning.field.get_mut(b).unwrap().xp = 3;
        planning.merge(a, b).unwrap();
        assert_eq!(planning.field().get(a).unwrap().xp, 5);
    }

    #[test]
    fn test_end_turn_applies_ogre_buff() {
        let mut planning = planning();
        place(&mut planning, UnitKind::Ogre);
        let behind = place(&mut planning, UnitKind::Golem);
        let events = planning.end_turn();
        assert_eq!(events.len(), 1);
        assert_eq!(planning.field().get(behind).unwrap().health, 6);
    }

    #[test]
    fn test_reroll_and_move() {
        let mut planning = planning();
        planning.reroll().unwrap();
        assert_eq!(planning.gold(), 9);
        let a = place(&mut planning, UnitKind::Golem);
        place(&mut planning, UnitKind::Plant);
        planning.move_in_array(0, 1).unwrap();
        assert_eq!(planning.field().contents()[1].id, a);
        assert!(planning.move_in_array(0, 5).is_err());
    }

    #[test]
    fn test_battle_round_trip() {
        let mut planning = planning();
        let id = place(&mut planning, UnitKind::Plant);
        let mut context = planning.battle_context(4);
        assert_eq!(context.roster.len(), 1);
        context.persist_buff(id, 2, 0);
        context.gold += 1;

        planning.finish_battle(context);
        assert_eq!(planning.turn(), 2);
        assert_eq!(planning.gold(), 21);
        assert_eq!(planning.field().get(id).unwrap().attack, 3);
    }
}
