//! Error types for battle resolution and roster management.

use thiserror::Error;

use crate::event::EventKindTag;
use crate::unit::UnitId;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for all battle core errors.
///
/// Every variant is recoverable at the scope of a single battle: the
/// calling scene can always discard the battle and return to planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// An event referenced a unit that is not on either field.
    #[error("{event} event references missing unit {unit}")]
    MissingUnit {
        /// The unit that could not be found.
        unit: UnitId,
        /// Kind of the event being processed.
        event: EventKindTag,
    },

    /// The step limit was exhausted before a result was produced.
    #[error("Battle did not reach finality within {steps} steps")]
    DidNotReachFinality {
        /// Number of steps executed before giving up.
        steps: u32,
    },

    /// The same unit id appears more than once across both rosters.
    #[error("Duplicate unit ID: {0}")]
    DuplicateUnitId(UnitId),

    /// A planning operation named a unit that is not in the roster.
    #[error("Unknown unit ID: {0}")]
    UnknownUnit(UnitId),

    /// Not enough gold for a purchase or reroll.
    #[error("Insufficient gold: need {required}, have {available}")]
    InsufficientGold {
        /// Gold required.
        required: i32,
        /// Gold available.
        available: i32,
    },

    /// The two units cannot be merged.
    #[error("Unit {merging} cannot be merged into unit {base}")]
    NotMergeable {
        /// Unit that would absorb the other.
        base: UnitId,
        /// Unit that would be consumed.
        merging: UnitId,
    },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Encoding or decoding a timeline failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A stored timeline was written by an incompatible version.
    #[error("Timeline version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the data.
        found: u32,
    },

    /// Invalid battle state.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
