//! # Brawl Core
//!
//! Deterministic battle core for Swamp Brawl, an auto-battler.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No wall clock
//! - No system randomness (every roll comes from a seeded [`rng::BattleRng`])
//! - No floating-point math (playback cursors use fixed-point)
//!
//! A battle is resolved to completion by the [`simulation`] engine before
//! any playback starts. The resulting [`timeline::Timeline`] is then played,
//! rewound and scrubbed by the [`replay`] layer, which reconstructs live
//! fields from recorded snapshots instead of re-running the engine.
//!
//! ## Crate Structure
//!
//! - [`unit`] - Unit identity, stats and the unit factory
//! - [`abilities`] - Archetype capability table and triggered hooks
//! - [`field`] - Ordered rosters with positional targeting
//! - [`event`] - Battle events exchanged between simulation and replay
//! - [`simulation`] - Event-driven battle resolver
//! - [`timeline`] - Immutable battle record and its persistence
//! - [`replay`] - Playback cursor and snapshot sync
//! - [`planning`] - Shop, merging and end-of-turn resolution
//! - [`opponent`] - Opponent roster generation
//! - [`config`] - Balance and pacing configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod field;
pub mod math;
pub mod opponent;
pub mod planning;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod timeline;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::abilities::{archetype, Archetype, FiredHooks, HookContext, HookKind};
    pub use crate::config::{BalanceConfig, EventSpeed, PacingConfig};
    pub use crate::context::BattleContext;
    pub use crate::error::{BattleError, Result};
    pub use crate::event::{BattleEvent, EventKind, EventKindTag, Outcome, ResourceKind};
    pub use crate::field::{Field, Side};
    pub use crate::math::Fixed;
    pub use crate::opponent::{OpponentGenerator, ScaledOpponentGenerator};
    pub use crate::planning::{PlanningField, Shop};
    pub use crate::replay::{
        CursorTarget, EventAnimator, LiveField, LiveFields, LiveUnit, NoopAnimator,
        PlaybackState, ReplayPlayer, StatAnimator, SyncReport,
    };
    pub use crate::rng::BattleRng;
    pub use crate::simulation::{simulate, simulate_with, BattleEngine, BattleReport, EngineState};
    pub use crate::timeline::{ReducedUnit, Timeline, TimelineEntry};
    pub use crate::unit::{
        ArchetypeFactory, Facing, RosterUnit, Unit, UnitFactory, UnitId, UnitKind, UnitOverrides,
    };
}
