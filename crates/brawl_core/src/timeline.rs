//! The immutable record of a resolved battle.
//!
//! A [`Timeline`] is the only artifact of simulation the presentation layer
//! consumes. Each [`TimelineEntry`] pairs an event with reduced snapshots of
//! both fields taken *before* the event was processed, so playback can
//! reconstruct any point without re-running the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};
use crate::event::{BattleEvent, Outcome};
use crate::field::{Field, Side};
use crate::unit::{Facing, UnitId, UnitKind, UnitOverrides};

/// Timeline file format version for compatibility.
pub const TIMELINE_VERSION: u32 = 1;

/// Per-unit state recorded alongside an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReducedUnit {
    /// Stable identifier.
    pub id: UnitId,
    /// Archetype.
    pub kind: UnitKind,
    /// Attack at the time of the snapshot.
    pub attack: i32,
    /// Health at the time of the snapshot.
    pub health: i32,
    /// Screen facing.
    pub facing: Facing,
    /// Experience.
    pub xp: u32,
    /// Index on its field.
    pub position: usize,
    /// False while the unit's death reaction is pending.
    pub visible: bool,
}

impl ReducedUnit {
    /// Overrides that rebuild exactly this unit through a
    /// [`UnitFactory`](crate::unit::UnitFactory).
    #[must_use]
    pub fn to_overrides(&self) -> UnitOverrides {
        UnitOverrides {
            id: self.id,
            attack: Some(self.attack),
            health: Some(self.health),
            xp: Some(self.xp),
            facing: Some(self.facing),
            visible: Some(self.visible),
        }
    }
}

/// Capture the reduced state of every unit on a field, in order.
#[must_use]
pub fn snapshot(field: &Field) -> Vec<ReducedUnit> {
    field
        .contents()
        .iter()
        .enumerate()
        .map(|(position, unit)| ReducedUnit {
            id: unit.id,
            kind: unit.kind,
            attack: unit.attack,
            health: unit.health,
            facing: unit.facing,
            xp: unit.xp,
            position,
            visible: unit.is_visible(),
        })
        .collect()
}

/// An event plus both fields as they were before it was processed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// The resolved event.
    pub event: BattleEvent,
    /// Player's field before the event.
    pub my_units: Vec<ReducedUnit>,
    /// Opponent's field before the event.
    pub opponent_units: Vec<ReducedUnit>,
}

impl TimelineEntry {
    /// Snapshot for one side.
    #[must_use]
    pub fn units(&self, side: Side) -> &[ReducedUnit] {
        match side {
            Side::Mine => &self.my_units,
            Side::Opponent => &self.opponent_units,
        }
    }
}

/// Ordered, append-only sequence of timeline entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeline {
    version: u32,
    entries: Vec<TimelineEntry>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Empty timeline.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: TIMELINE_VERSION,
            entries: Vec::new(),
        }
    }

    /// Only the engine appends.
    pub(crate) fn push(&mut self, entry: TimelineEntry) {
        self.entries.push(entry);
    }

    /// Entry at `index`.
    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcome of the terminal entry, if the battle finished.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.entries.last().and_then(|entry| entry.event.outcome())
    }

    /// Every perished id across all entries.
    #[must_use]
    pub fn perished(&self) -> Vec<UnitId> {
        self.entries
            .iter()
            .flat_map(|entry| entry.event.perished_unit_ids.iter().copied())
            .collect()
    }

    /// Sum of frame durations.
    #[must_use]
    pub fn total_duration(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| u64::from(entry.event.duration))
            .sum()
    }

    /// Encode to bytes.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| {
            BattleError::Serialization(format!("Failed to serialize timeline: {e}"))
        })
    }

    /// Decode from bytes produced by [`Timeline::to_bytes`].
    ///
    /// # Errors
    /// Returns an error if decoding fails or the version differs.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let timeline: Self = bincode::deserialize(bytes).map_err(|e| {
            BattleError::Serialization(format!("Failed to deserialize timeline: {e}"))
        })?;
        if timeline.version != TIMELINE_VERSION {
            return Err(BattleError::VersionMismatch {
                expected: TIMELINE_VERSION,
                found: timeline.version,
            });
        }
        Ok(timeline)
    }

    /// Save to a file.
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            BattleError::Serialization(format!("Failed to write timeline file: {e}"))
        })
    }

    /// Load from a file.
    ///
    /// # Errors
    /// Returns an error if reading, decoding or the version check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            BattleError::Serialization(format!("Failed to read timeline file: {e}"))
        })?;
        Self::from_bytes(&bytes)
    }
}
