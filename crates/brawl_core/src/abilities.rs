//! Archetype capability table.
//!
//! Each [`UnitKind`] maps to one static [`Archetype`] row holding its base
//! stats and an optional function for every triggered hook. Whether an
//! archetype "implements" a hook is simply whether the slot is `Some`.
//!
//! Hooks are pure: they read the unit, both fields, the balance config and
//! a pre-drawn random roll, and return the event to enqueue (or nothing).
//! The engine alone decides when to call them and what to do with the
//! result.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::BalanceConfig;
use crate::event::BattleEvent;
use crate::field::Field;
use crate::unit::{Unit, UnitId, UnitKind};

/// Read-only view handed to a battle hook.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// The unit whose hook fires.
    pub unit: &'a Unit,
    /// The unit's own field.
    pub own: &'a Field,
    /// The opposing field.
    pub enemy: &'a Field,
    /// Balance constants.
    pub config: &'a BalanceConfig,
    /// Random roll drawn by the engine for this invocation.
    pub roll: u64,
}

impl HookContext<'_> {
    /// Level of the acting unit.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.unit.level(self.config) as i32
    }

    /// `step * (level - 1) + base`.
    #[must_use]
    pub fn scaled(&self, base: i32, step: i32) -> i32 {
        scaled(self.level(), base, step)
    }
}

fn scaled(level: i32, base: i32, step: i32) -> i32 {
    step * (level - 1) + base
}

/// Battle hook returning an optional reaction.
pub type BattleHook = fn(&HookContext<'_>) -> Option<BattleEvent>;

/// Hit hook, additionally given the id of the unit that was hit.
pub type HitHook = fn(&HookContext<'_>, UnitId) -> Option<BattleEvent>;

/// Planning-phase end of turn hook.
pub type EndTurnHook = fn(&Unit, &Field, &BalanceConfig) -> Option<BattleEvent>;

/// Incoming damage modifier.
pub type DamageHook = fn(&Unit, i32, &BalanceConfig) -> i32;

/// Static description of an archetype.
#[derive(Clone, Copy)]
pub struct Archetype {
    /// Archetype tag.
    pub kind: UnitKind,
    /// Default attack.
    pub base_attack: i32,
    /// Default health.
    pub base_health: i32,
    /// Fires after this unit's attack reduces an opponent to zero health.
    pub on_kill: Option<BattleHook>,
    /// Fires when this unit reaches zero health.
    pub on_death: Option<BattleHook>,
    /// Fires for the unit in second position before the front fights.
    pub before_ally_attacks: Option<BattleHook>,
    /// Fires once at battle start.
    pub before_battle: Option<BattleHook>,
    /// Fires at the end of a planning turn.
    pub on_end_turn: Option<EndTurnHook>,
    /// Fires when this unit survives a fight and connects.
    pub on_hit_enemy: Option<HitHook>,
    /// Reduces incoming damage.
    pub calculate_damage: Option<DamageHook>,
}

impl Archetype {
    const fn plain(kind: UnitKind, base_attack: i32, base_health: i32) -> Self {
        Self {
            kind,
            base_attack,
            base_health,
            on_kill: None,
            on_death: None,
            before_ally_attacks: None,
            before_battle: None,
            on_end_turn: None,
            on_hit_enemy: None,
            calculate_damage: None,
        }
    }

    /// Whether this archetype has the given hook.
    #[must_use]
    pub const fn has_hook(&self, hook: HookKind) -> bool {
        match hook {
            HookKind::Kill => self.on_kill.is_some(),
            HookKind::Death => self.on_death.is_some(),
            HookKind::BeforeAllyAttacks => self.before_ally_attacks.is_some(),
            HookKind::BeforeBattle => self.before_battle.is_some(),
            HookKind::EndTurn => self.on_end_turn.is_some(),
            HookKind::HitEnemy => self.on_hit_enemy.is_some(),
        }
    }
}

impl std::fmt::Debug for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archetype")
            .field("kind", &self.kind)
            .field("base_attack", &self.base_attack)
            .field("base_health", &self.base_health)
            .finish_non_exhaustive()
    }
}

static SKELETON: Archetype = Archetype {
    on_death: Some(skeleton_death),
    ..Archetype::plain(UnitKind::Skeleton, 2, 1)
};

static OGRE: Archetype = Archetype {
    on_end_turn: Some(ogre_end_turn),
    ..Archetype::plain(UnitKind::Ogre, 1, 3)
};

static GOLEM: Archetype = Archetype::plain(UnitKind::Golem, 1, 5);

static PLANT: Archetype = Archetype {
    on_kill: Some(plant_kill),
    ..Archetype::plain(UnitKind::Plant, 1, 2)
};

static SPIDER: Archetype = Archetype {
    before_ally_attacks: Some(spider_before_ally_attacks),
    ..Archetype::plain(UnitKind::Spider, 2, 2)
};

static LIZARD: Archetype = Archetype {
    on_death: Some(lizard_death),
    ..Archetype::plain(UnitKind::Lizard, 1, 2)
};

static ORC: Archetype = Archetype {
    on_hit_enemy: Some(orc_hit_enemy),
    ..Archetype::plain(UnitKind::Orc, 2, 1)
};

static ORC_THIEF: Archetype = Archetype {
    on_kill: Some(orc_thief_kill),
    ..Archetype::plain(UnitKind::OrcThief, 1, 2)
};

static ARMORED_ORC: Archetype = Archetype {
    calculate_damage: Some(armored_damage),
    ..Archetype::plain(UnitKind::ArmoredOrc, 2, 2)
};

static FALCON: Archetype = Archetype {
    before_battle: Some(falcon_before_battle),
    ..Archetype::plain(UnitKind::Falcon, 1, 1)
};

/// Capability row for an archetype.
#[must_use]
pub fn archetype(kind: UnitKind) -> &'static Archetype {
    match kind {
        UnitKind::Skeleton => &SKELETON,
        UnitKind::Ogre => &OGRE,
        UnitKind::Golem => &GOLEM,
        UnitKind::Plant => &PLANT,
        UnitKind::Spider => &SPIDER,
        UnitKind::Lizard => &LIZARD,
        UnitKind::Orc => &ORC,
        UnitKind::OrcThief => &ORC_THIEF,
        UnitKind::ArmoredOrc => &ARMORED_ORC,
        UnitKind::Falcon => &FALCON,
    }
}

fn skeleton_death(ctx: &HookContext<'_>) -> Option<BattleEvent> {
    let abilities = &ctx.config.abilities;
    let target = ctx.own.next_alive_behind(ctx.unit.id)?;
    Some(BattleEvent::buff(
        ctx.unit.id,
        vec![target.id],
        ctx.scaled(abilities.skeleton_buff_base, abilities.skeleton_buff_step),
        0,
        true,
        &ctx.config.pacing,
    ))
}

fn ogre_end_turn(unit: &Unit, field: &Field, config: &BalanceConfig) -> Option<BattleEvent> {
    let index = field.position_of(unit.id)?;
    let target = field.contents().get(index + 1)?;
    let level = unit.level(config) as i32;
    let abilities = &config.abilities;
    Some(BattleEvent::buff(
        unit.id,
        vec![target.id],
        0,
        scaled(level, abilities.ogre_buff_base, abilities.ogre_buff_step),
        false,
        &config.pacing,
    ))
}

fn plant_kill(ctx: &HookContext<'_>) -> Option<BattleEvent> {
    let abilities = &ctx.config.abilities;
    Some(BattleEvent::buff(
        ctx.unit.id,
        vec![ctx.unit.id],
        ctx.scaled(abilities.plant_buff_base, abilities.plant_buff_step),
        0,
        false,
        &ctx.config.pacing,
    ))
}

fn spider_before_ally_attacks(ctx: &HookContext<'_>) -> Option<BattleEvent> {
    let abilities = &ctx.config.abilities;
    let target = ctx.enemy.get_random_content(ctx.roll)?;
    Some(BattleEvent::ranged(
        ctx.unit.id,
        vec![target.id],
        ctx.scaled(abilities.spider_ranged_base, abilities.spider_ranged_step),
        &ctx.config.pacing,
    ))
}

fn lizard_death(ctx: &HookContext<'_>) -> Option<BattleEvent> {
    let abilities = &ctx.config.abilities;
    let targets: Vec<UnitId> = ctx
        .own
        .alive()
        .chain(ctx.enemy.alive())
        .filter(|unit| unit.id != ctx.unit.id)
        .map(|unit| unit.id)
        .collect();
    if targets.is_empty() {
        return None;
    }
    Some(BattleEvent::ranged(
        ctx.unit.id,
        targets,
        ctx.scaled(abilities.lizard_ranged_base, abilities.lizard_ranged_step),
        &ctx.config.pacing,
    ))
}

fn orc_hit_enemy(ctx: &HookContext<'_>, target: UnitId) -> Option<BattleEvent> {
    let hit = ctx.enemy.get(target)?;
    if hit.health >= 0 {
        return None;
    }
    let next = ctx.enemy.next_alive_behind(target)?;
    Some(BattleEvent::ranged(
        ctx.unit.id,
        vec![next.id],
        -hit.health,
        &ctx.config.pacing,
    ))
}

fn orc_thief_kill(ctx: &HookContext<'_>) -> Option<BattleEvent> {
    let loot = ctx.config.abilities.kill_loot_gold;
    if loot == 0 {
        return None;
    }
    Some(BattleEvent::gold(ctx.unit.id, loot, &ctx.config.pacing))
}

fn armored_damage(unit: &Unit, incoming: i32, config: &BalanceConfig) -> i32 {
    let level = unit.level(config) as i32;
    let armor = scaled(level, config.abilities.armor_base, config.abilities.armor_step);
    (incoming - armor).max(0)
}

fn falcon_before_battle(ctx: &HookContext<'_>) -> Option<BattleEvent> {
    let target = ctx.enemy.alive().last()?;
    Some(BattleEvent::ranged(
        ctx.unit.id,
        vec![target.id],
        ctx.config.abilities.falcon_ranged_per_level * ctx.level(),
        &ctx.config.pacing,
    ))
}

/// Identifies a hook slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HookKind {
    /// [`Archetype::on_kill`].
    Kill,
    /// [`Archetype::on_death`].
    Death,
    /// [`Archetype::before_ally_attacks`].
    BeforeAllyAttacks,
    /// [`Archetype::before_battle`].
    BeforeBattle,
    /// [`Archetype::on_end_turn`].
    EndTurn,
    /// [`Archetype::on_hit_enemy`].
    HitEnemy,
}

/// Per-battle record of hooks that already fired.
///
/// Replaces per-unit cooldown flags. A fresh set is created for every
/// battle, so nothing has to be remembered to reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredHooks {
    fired: BTreeSet<(UnitId, HookKind)>,
}

impl FiredHooks {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a hook as fired. Returns `false` if it had already fired.
    pub fn mark(&mut self, unit: UnitId, hook: HookKind) -> bool {
        self.fired.insert((unit, hook))
    }

    /// Whether a hook has fired.
    #[must_use]
    pub fn has_fired(&self, unit: UnitId, hook: HookKind) -> bool {
        self.fired.contains(&(unit, hook))
    }

    /// Forget every firing of one hook kind, re-arming it for all units.
    pub fn clear_kind(&mut self, hook: HookKind) {
        self.fired.retain(|&(_, kind)| kind != hook);
    }

    /// Number of recorded firings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fired.len()
    }

    /// Whether nothing has fired yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::field::Side;
    use crate::unit::{ArchetypeFactory, UnitFactory, UnitOverrides};

    fn make(kind: UnitKind, id: u32) -> Unit {
        ArchetypeFactory.create(kind, &UnitOverrides::new(UnitId(id)))
    }

    fn ctx<'a>(unit: &'a Unit, own: &'a Field, enemy: &'a Field, config: &'a BalanceConfig) -> HookContext<'a> {
        HookContext {
            unit,
            own,
            enemy,
            config,
            roll: 0,
        }
    }

    #[test]
    fn test_table_covers_every_kind() {
        for kind in UnitKind::ALL {
            let row = archetype(kind);
            assert_eq!(row.kind, kind);
            assert!(row.base_health > 0);
        }
        assert!(archetype(UnitKind::Skeleton).has_hook(HookKind::Death));
        assert!(!archetype(UnitKind::Golem).has_hook(HookKind::Death));
        assert!(archetype(UnitKind::Falcon).has_hook(HookKind::BeforeBattle));
    }

    #[test]
    fn test_skeleton_buffs_next_living_ally() {
        let config = BalanceConfig::default();
        let skeleton = make(UnitKind::Skeleton, 1);
        let own = Field::with_contents(Side::Mine, vec![skeleton.clone(), make(UnitKind::Golem, 2)]);
        let enemy = Field::new(Side::Opponent);

        let event = skeleton_death(&ctx(&skeleton, &own, &enemy, &config)).unwrap();
        assert_eq!(event.affected_unit_ids, vec![UnitId(2)]);
        assert_eq!(
            event.kind,
            EventKind::Buff {
                source: UnitId(1),
                attack: 2,
                health: 0,
                until_end_of_battle_only: true,
            }
        );

        let alone = Field::with_contents(Side::Mine, vec![skeleton.clone()]);
        assert!(skeleton_death(&ctx(&skeleton, &alone, &enemy, &config)).is_none());
    }

    #[test]
    fn test_skeleton_buff_scales_with_level() {
        let config = BalanceConfig::default();
        let mut skeleton = make(UnitKind::Skeleton, 1);
        skeleton.xp = 3;
        let own = Field::with_contents(Side::Mine, vec![skeleton.clone(), make(UnitKind::Golem, 2)]);
        let enemy = Field::new(Side::Opponent);
        let event = skeleton_death(&ctx(&skeleton, &own, &enemy, &config)).unwrap();
        assert!(matches!(event.kind, EventKind::Buff { attack: 6, .. }));
    }

    #[test]
    fn test_armor_floors_at_zero() {
        let config = BalanceConfig::default();
        let armored = make(UnitKind::ArmoredOrc, 1);
        assert_eq!(armored.calculate_damage(3, &config), 2);
        assert_eq!(armored.calculate_damage(1, &config), 0);
        assert_eq!(armored.calculate_damage(0, &config), 0);
    }

    #[test]
    fn test_orc_carries_excess_damage() {
        let config = BalanceConfig::default();
        let orc = make(UnitKind::Orc, 1);
        let own = Field::with_contents(Side::Mine, vec![orc.clone()]);
        let mut hit = make(UnitKind::Skeleton, 10);
        hit.health = -3;
        let enemy = Field::with_contents(Side::Opponent, vec![hit, make(UnitKind::Golem, 11)]);

        let event = orc_hit_enemy(&ctx(&orc, &own, &enemy, &config), UnitId(10)).unwrap();
        assert_eq!(event.affected_unit_ids, vec![UnitId(11)]);
        assert!(matches!(event.kind, EventKind::Ranged { attack: 3, .. }));
    }

    #[test]
    fn test_orc_no_excess_no_event() {
        let config = BalanceConfig::default();
        let orc = make(UnitKind::Orc, 1);
        let own = Field::with_contents(Side::Mine, vec![orc.clone()]);
        let mut hit = make(UnitKind::Skeleton, 10);
        hit.health = 0;
        let enemy = Field::with_contents(Side::Opponent, vec![hit, make(UnitKind::Golem, 11)]);
        assert!(orc_hit_enemy(&ctx(&orc, &own, &enemy, &config), UnitId(10)).is_none());
    }

    #[test]
    fn test_lizard_hits_everyone_else() {
        let config = BalanceConfig::default();
        let lizard = make(UnitKind::Lizard, 1);
        let own = Field::with_contents(Side::Mine, vec![lizard.clone(), make(UnitKind::Golem, 2)]);
        let enemy = Field::with_contents(Side::Opponent, vec![make(UnitKind::Golem, 3)]);
        let event = lizard_death(&ctx(&lizard, &own, &enemy, &config)).unwrap();
        assert_eq!(event.affected_unit_ids, vec![UnitId(2), UnitId(3)]);
    }

    #[test]
    fn test_falcon_targets_last_enemy() {
        let config = BalanceConfig::default();
        let falcon = make(UnitKind::Falcon, 1);
        let own = Field::with_contents(Side::Mine, vec![falcon.clone()]);
        let enemy = Field::with_contents(
            Side::Opponent,
            vec![make(UnitKind::Golem, 3), make(UnitKind::Golem, 4)],
        );
        let event = falcon_before_battle(&ctx(&falcon, &own, &enemy, &config)).unwrap();
        assert_eq!(event.affected_unit_ids, vec![UnitId(4)]);
        assert!(matches!(event.kind, EventKind::Ranged { attack: 4, .. }));
    }

    #[test]
    fn test_ogre_buffs_unit_behind() {
        let config = BalanceConfig::default();
        let ogre = make(UnitKind::Ogre, 1);
        let field = Field::with_contents(Side::Mine, vec![ogre.clone(), make(UnitKind::Plant, 2)]);
        let event = ogre_end_turn(&ogre, &field, &config).unwrap();
        assert_eq!(event.affected_unit_ids, vec![UnitId(2)]);
        assert!(matches!(
            event.kind,
            EventKind::Buff {
                attack: 0,
                health: 1,
                until_end_of_battle_only: false,
                ..
            }
        ));
    }

    #[test]
    fn test_fired_hooks() {
        let mut fired = FiredHooks::new();
        assert!(fired.mark(UnitId(1), HookKind::BeforeBattle));
        assert!(!fired.mark(UnitId(1), HookKind::BeforeBattle));
        assert!(fired.mark(UnitId(1), HookKind::BeforeAllyAttacks));
        fired.clear_kind(HookKind::BeforeAllyAttacks);
        assert!(!fired.has_fired(UnitId(1), HookKind::BeforeAllyAttacks));
        assert!(fired.has_fired(UnitId(1), HookKind::BeforeBattle));
        assert_eq!(fired.len(), 1);
    }
}
