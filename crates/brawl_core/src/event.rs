//! Battle events: the wire format between simulation and replay.
//!
//! Every resolved action in a battle is a [`BattleEvent`]. The variant set
//! is closed: frontline fights, stat buffs, ranged damage, economy ticks
//! and the terminal result. All variants share an envelope of affected
//! ids, a playback duration and the ids of units that perished as a
//! direct consequence of the event.
//!
//! Once an event is placed in a [`Timeline`](crate::timeline::Timeline)
//! it is never mutated again.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{EventSpeed, PacingConfig};
use crate::unit::UnitId;

/// Final result of a battle, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Only the player's units remain.
    Win,
    /// Only the opponent's units remain.
    Loss,
    /// Both fields were emptied.
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => f.write_str("Win"),
            Self::Loss => f.write_str("Loss"),
            Self::Draw => f.write_str("Draw"),
        }
    }
}

/// Economy resource affected by a [`EventKind::Resource`] event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Shop currency.
    Gold,
}

/// Variant-specific payload of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The two frontline units trade attacks simultaneously.
    Fight,
    /// Attack/health delta applied to every affected unit.
    Buff {
        /// Unit that caused the buff.
        source: UnitId,
        /// Attack delta.
        attack: i32,
        /// Health delta.
        health: i32,
        /// Battle-scoped buffs are not persisted to the roster.
        until_end_of_battle_only: bool,
    },
    /// Damage dealt to every affected unit from a distance.
    Ranged {
        /// Unit that fired.
        source: UnitId,
        /// Raw damage before the target's damage reduction.
        attack: i32,
    },
    /// Economy effect.
    Resource {
        /// Unit that produced the resource.
        source: UnitId,
        /// Which resource changes.
        resource: ResourceKind,
        /// Delta applied.
        amount: i32,
        /// Purse value when the event was processed.
        start_amount: i32,
    },
    /// Terminal marker.
    Result {
        /// Final outcome.
        outcome: Outcome,
    },
}

/// Payload-free discriminant of [`EventKind`], used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKindTag {
    /// [`EventKind::Fight`].
    Fight,
    /// [`EventKind::Buff`].
    Buff,
    /// [`EventKind::Ranged`].
    Ranged,
    /// [`EventKind::Resource`].
    Resource,
    /// [`EventKind::Result`].
    Result,
}

impl fmt::Display for EventKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fight => "Fight",
            Self::Buff => "Buff",
            Self::Ranged => "Ranged",
            Self::Resource => "Resource",
            Self::Result => "Result",
        };
        f.write_str(name)
    }
}

impl EventKind {
    /// Discriminant of this kind.
    #[must_use]
    pub const fn tag(&self) -> EventKindTag {
        match self {
            Self::Fight => EventKindTag::Fight,
            Self::Buff { .. } => EventKindTag::Buff,
            Self::Ranged { .. } => EventKindTag::Ranged,
            Self::Resource { .. } => EventKindTag::Resource,
            Self::Result { .. } => EventKindTag::Result,
        }
    }

    /// Playback speed class.
    #[must_use]
    pub const fn speed(&self) -> EventSpeed {
        match self {
            Self::Fight | Self::Ranged { .. } => EventSpeed::Medium,
            Self::Buff { .. } | Self::Resource { .. } => EventSpeed::Fast,
            Self::Result { .. } => EventSpeed::Slow,
        }
    }

    /// Unit credited with the event, if any.
    #[must_use]
    pub const fn source(&self) -> Option<UnitId> {
        match self {
            Self::Buff { source, .. }
            | Self::Ranged { source, .. }
            | Self::Resource { source, .. } => Some(*source),
            Self::Fight | Self::Result { .. } => None,
        }
    }
}

/// One resolved game action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleEvent {
    /// Variant payload.
    pub kind: EventKind,
    /// Units the event acts on, in order.
    pub affected_unit_ids: Vec<UnitId>,
    /// Playback length in frames.
    pub duration: u32,
    /// Units that died as a direct result of this event.
    pub perished_unit_ids: Vec<UnitId>,
}

impl BattleEvent {
    fn with_kind(kind: EventKind, affected_unit_ids: Vec<UnitId>, pacing: &PacingConfig) -> Self {
        let duration = pacing.duration_for_targets(kind.speed(), affected_unit_ids.len());
        Self {
            kind,
            affected_unit_ids,
            duration,
            perished_unit_ids: Vec::new(),
        }
    }

    /// Frontline fight between my unit and the opponent's unit.
    #[must_use]
    pub fn fight(mine: UnitId, theirs: UnitId, pacing: &PacingConfig) -> Self {
        Self::with_kind(EventKind::Fight, vec![mine, theirs], pacing)
    }

    /// Stat buff.
    #[must_use]
    pub fn buff(
        source: UnitId,
        targets: Vec<UnitId>,
        attack: i32,
        health: i32,
        until_end_of_battle_only: bool,
        pacing: &PacingConfig,
    ) -> Self {
        Self::with_kind(
            EventKind::Buff {
                source,
                attack,
                health,
                until_end_of_battle_only,
            },
            targets,
            pacing,
        )
    }

    /// Ranged attack on one or more targets.
    #[must_use]
    pub fn ranged(source: UnitId, targets: Vec<UnitId>, attack: i32, pacing: &PacingConfig) -> Self {
        Self::with_kind(EventKind::Ranged { source, attack }, targets, pacing)
    }

    /// Gold gain credited to `source`.
    ///
    /// `start_amount` is stamped when the event is processed.
    #[must_use]
    pub fn gold(source: UnitId, amount: i32, pacing: &PacingConfig) -> Self {
        Self::with_kind(
            EventKind::Resource {
                source,
                resource: ResourceKind::Gold,
                amount,
                start_amount: 0,
            },
            vec![source],
            pacing,
        )
    }

    /// Terminal result marker.
    #[must_use]
    pub fn result(outcome: Outcome, pacing: &PacingConfig) -> Self {
        Self::with_kind(EventKind::Result { outcome }, Vec::new(), pacing)
    }

    /// Discriminant of this event.
    #[must_use]
    pub const fn tag(&self) -> EventKindTag {
        self.kind.tag()
    }

    /// Outcome, if this is the terminal event.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.kind {
            EventKind::Result { outcome } => Some(outcome),
            _ => None,
        }
    }

    /// Whether this is the terminal event.
    #[must_use]
    pub const fn is_result(&self) -> bool {
        self.outcome().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fight_envelope() {
        let pacing = PacingConfig::default();
        let event = BattleEvent::fight(UnitId(1), UnitId(2), &pacing);
        assert_eq!(event.tag(), EventKindTag::Fight);
        assert_eq!(event.affected_unit_ids, vec![UnitId(1), UnitId(2)]);
        assert!(event.perished_unit_ids.is_empty());
        // Two targets add one extra-target step on top of Medium.
        assert_eq!(event.duration, 240);
        assert!(!event.is_result());
    }

    #[test]
    fn test_gold_targets_source() {
        let pacing = PacingConfig::default();
        let event = BattleEvent::gold(UnitId(4), 2, &pacing);
        assert_eq!(event.affected_unit_ids, vec![UnitId(4)]);
        assert_eq!(event.kind.source(), Some(UnitId(4)));
        assert_eq!(event.duration, pacing.duration(EventSpeed::Fast));
    }

    #[test]
    fn test_result_outcome() {
        let event = BattleEvent::result(Outcome::Draw, &PacingConfig::default());
        assert_eq!(event.outcome(), Some(Outcome::Draw));
        assert!(event.affected_unit_ids.is_empty());
        assert_eq!(event.kind.source(), None);
    }

    #[test]
    fn test_ranged_duration_scales_with_targets() {
        let pacing = PacingConfig::default();
        let one = BattleEvent::ranged(UnitId(1), vec![UnitId(2)], 1, &pacing);
        let three = BattleEvent::ranged(UnitId(1), vec![UnitId(2), UnitId(3), UnitId(4)], 1, &pacing);
        assert!(three.duration > one.duration);
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(EventKindTag::Resource.to_string(), "Resource");
        assert_eq!(Outcome::Loss.to_string(), "Loss");
    }
}
