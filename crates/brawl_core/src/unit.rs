//! Unit identity, stats and the unit factory.
//!
//! A [`Unit`] is the canonical combatant. The engine owns units during a
//! battle and mutates their stats only while processing events. The same
//! struct is used on the planning field and (wrapped in a
//! [`LiveUnit`](crate::replay::LiveUnit)) by the replay layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::abilities::archetype;
use crate::config::BalanceConfig;

/// Stable identifier of a unit.
///
/// Survives planning ↔ battle transitions, so a unit bought in the shop
/// keeps its id through every battle it fights in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh, never reused unit ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitIdAllocator {
    next: u32,
}

impl UnitIdAllocator {
    /// Start allocating at `first`.
    #[must_use]
    pub const fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> UnitId {
        let id = UnitId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the id that will be handed out next.
    #[must_use]
    pub const fn peek(&self) -> UnitId {
        UnitId(self.next)
    }
}

impl Default for UnitIdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Archetype tag selecting default stats and triggered abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Death: buffs the ally behind for the rest of the battle.
    Skeleton,
    /// End of turn: gives the next unit extra health.
    Ogre,
    /// Plain, sturdy.
    Golem,
    /// Kill: gains attack permanently.
    Plant,
    /// Before the unit in front attacks: shoots a random enemy.
    Spider,
    /// Death: damages every other unit.
    Lizard,
    /// Hit: carries excess damage into the next enemy.
    Orc,
    /// Kill: steals gold.
    OrcThief,
    /// Takes reduced damage.
    ArmoredOrc,
    /// Battle start: shoots the last enemy.
    Falcon,
}

impl UnitKind {
    /// Every archetype, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Skeleton,
        Self::Ogre,
        Self::Golem,
        Self::Plant,
        Self::Spider,
        Self::Lizard,
        Self::Orc,
        Self::OrcThief,
        Self::ArmoredOrc,
        Self::Falcon,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Skeleton => "Skeleton",
            Self::Ogre => "Ogre",
            Self::Golem => "Golem",
            Self::Plant => "Plant",
            Self::Spider => "Spider",
            Self::Lizard => "Lizard",
            Self::Orc => "Orc",
            Self::OrcThief => "Orc Thief",
            Self::ArmoredOrc => "Armored Orc",
            Self::Falcon => "Falcon",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which way a unit faces on screen. The player's side faces right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing the opponent from the left.
    #[default]
    Right,
    /// Facing the player from the right.
    Left,
}

/// Structural life state of a canonical unit.
///
/// Kept separate from rendering visibility: a unit whose death reaction is
/// still queued stays on its field (its position matters for targeting)
/// but is no longer a valid target or actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifeState {
    /// On the field and able to act.
    #[default]
    Alive,
    /// Health reached zero; removal waits for its death reaction to resolve.
    DeathPending,
}

/// A combatant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier.
    pub id: UnitId,
    /// Archetype.
    pub kind: UnitKind,
    /// Attack. May dip below zero via debuffs; clamped when dealing damage.
    pub attack: i32,
    /// Health. Zero or below means dead.
    pub health: i32,
    /// Accumulated merge experience.
    pub xp: u32,
    /// Screen facing.
    pub facing: Facing,
    /// Structural life state.
    pub life: LifeState,
}

impl Unit {
    /// Level derived from experience.
    #[must_use]
    pub fn level(&self, config: &BalanceConfig) -> u32 {
        config.level_for_xp(self.xp)
    }

    /// Alive and on the field: a valid actor and target.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive && self.health > 0
    }

    /// Whether this unit would render.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.life == LifeState::Alive
    }

    /// Attack used for dealing damage, never negative.
    #[must_use]
    pub fn effective_attack(&self) -> i32 {
        self.attack.max(0)
    }

    /// Damage this unit actually takes from an incoming attack.
    #[must_use]
    pub fn calculate_damage(&self, incoming: i32, config: &BalanceConfig) -> i32 {
        let incoming = incoming.max(0);
        match archetype(self.kind).calculate_damage {
            Some(reduce) => reduce(self, incoming, config),
            None => incoming,
        }
    }

    /// Same archetype, both below the experience cap.
    #[must_use]
    pub fn is_mergeable_with(&self, other: &Unit, config: &BalanceConfig) -> bool {
        self.id != other.id
            && self.kind == other.kind
            && self.xp < config.max_xp
            && other.xp < config.max_xp
    }
}

/// Roster input tuple and factory overrides.
///
/// This is what the planning layer hands to the engine at battle start
/// and what the replay layer uses to rehydrate units from snapshots.
/// Missing stats fall back to the archetype defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitOverrides {
    /// Stable identifier.
    pub id: UnitId,
    /// Attack override.
    #[serde(default)]
    pub attack: Option<i32>,
    /// Health override.
    #[serde(default)]
    pub health: Option<i32>,
    /// Experience override (defaults to 1).
    #[serde(default)]
    pub xp: Option<u32>,
    /// Facing override.
    #[serde(default)]
    pub facing: Option<Facing>,
    /// Visibility override. `false` rehydrates a death-pending unit.
    #[serde(default)]
    pub visible: Option<bool>,
}

impl UnitOverrides {
    /// Overrides carrying only an id.
    #[must_use]
    pub const fn new(id: UnitId) -> Self {
        Self {
            id,
            attack: None,
            health: None,
            xp: None,
            facing: None,
            visible: None,
        }
    }

    /// Set attack and health.
    #[must_use]
    pub fn with_stats(mut self, attack: i32, health: i32) -> Self {
        self.attack = Some(attack);
        self.health = Some(health);
        self
    }

    /// Set experience.
    #[must_use]
    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = Some(xp);
        self
    }

    /// Set facing.
    #[must_use]
    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = Some(facing);
        self
    }
}

/// One entry of a roster handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterUnit {
    /// Archetype.
    pub kind: UnitKind,
    /// Stats and identity.
    pub overrides: UnitOverrides,
}

impl RosterUnit {
    /// Create a roster entry.
    #[must_use]
    pub const fn new(kind: UnitKind, overrides: UnitOverrides) -> Self {
        Self { kind, overrides }
    }

    /// Capture a unit's current state as a roster entry.
    #[must_use]
    pub fn from_unit(unit: &Unit) -> Self {
        Self {
            kind: unit.kind,
            overrides: UnitOverrides {
                id: unit.id,
                attack: Some(unit.attack),
                health: Some(unit.health),
                xp: Some(unit.xp),
                facing: Some(unit.facing),
                visible: Some(unit.is_visible()),
            },
        }
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.overrides.id
    }
}

/// Builds units from an archetype and overrides.
///
/// Must be stateless from the engine's point of view: the same inputs
/// always produce the same unit.
pub trait UnitFactory {
    /// Instantiate a unit.
    fn create(&self, kind: UnitKind, overrides: &UnitOverrides) -> Unit;

    /// Instantiate a unit from a roster entry.
    fn from_roster(&self, entry: &RosterUnit) -> Unit {
        self.create(entry.kind, &entry.overrides)
    }
}

/// Factory that fills missing stats from the archetype table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchetypeFactory;

impl UnitFactory for ArchetypeFactory {
    fn create(&self, kind: UnitKind, overrides: &UnitOverrides) -> Unit {
        let base = archetype(kind);
        Unit {
            id: overrides.id,
            kind,
            attack: overrides.attack.unwrap_or(base.base_attack),
            health: overrides.health.unwrap_or(base.base_health),
            xp: overrides.xp.unwrap_or(1),
            facing: overrides.facing.unwrap_or_default(),
            life: match overrides.visible {
                Some(false) => LifeState::DeathPending,
                _ => LifeState::Alive,
            },
        }
    }
}
