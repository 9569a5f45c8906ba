//! Ordered rosters facing each other in battle.
//!
//! Position in a [`Field`] is gameplay: index 0 is the frontline, index 1
//! is the unit waiting behind it. Removing a unit shifts everyone behind
//! it forward, so callers must re-read [`Field::front`] and
//! [`Field::second`] after every mutation instead of caching indices.
//!
//! Lookups are linear scans. Rosters hold at most a handful of units.

use serde::{Deserialize, Serialize};

use crate::unit::{Unit, UnitId};

/// Which side of the battle a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The player's roster.
    Mine,
    /// The generated opponent roster.
    Opponent,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Mine => Self::Opponent,
            Self::Opponent => Self::Mine,
        }
    }
}

/// Ordered collection of units on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    side: Side,
    contents: Vec<Unit>,
}

impl Field {
    /// Create an empty field.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self {
            side,
            contents: Vec::new(),
        }
    }

    /// Create a field holding `contents` in order.
    #[must_use]
    pub fn with_contents(side: Side, contents: Vec<Unit>) -> Self {
        Self { side, contents }
    }

    /// Side this field belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Units in positional order.
    #[must_use]
    pub fn contents(&self) -> &[Unit] {
        &self.contents
    }

    /// Number of units, including death-pending ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the field holds no units at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Whether a unit with this id is on the field.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.contents.iter().any(|unit| unit.id == id)
    }

    /// Index of a unit.
    #[must_use]
    pub fn position_of(&self, id: UnitId) -> Option<usize> {
        self.contents.iter().position(|unit| unit.id == id)
    }

    /// Look up a unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.contents.iter().find(|unit| unit.id == id)
    }

    /// Look up a unit mutably.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.contents.iter_mut().find(|unit| unit.id == id)
    }

    /// Iterate mutably in positional order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.contents.iter_mut()
    }

    /// Frontline unit.
    #[must_use]
    pub fn front(&self) -> Option<&Unit> {
        self.contents.first()
    }

    /// Unit directly behind the frontline.
    #[must_use]
    pub fn second(&self) -> Option<&Unit> {
        self.contents.get(1)
    }

    /// Rearmost unit.
    #[must_use]
    pub fn last(&self) -> Option<&Unit> {
        self.contents.last()
    }

    /// First living unit behind `id`, if any.
    #[must_use]
    pub fn next_alive_behind(&self, id: UnitId) -> Option<&Unit> {
        let index = self.position_of(id)?;
        self.contents[index + 1..].iter().find(|unit| unit.is_alive())
    }

    /// Living units in positional order.
    pub fn alive(&self) -> impl Iterator<Item = &Unit> {
        self.contents.iter().filter(|unit| unit.is_alive())
    }

    /// Pick a living unit using a caller-supplied roll.
    ///
    /// The roll comes from the battle's seeded generator, so the choice
    /// is reproducible.
    #[must_use]
    pub fn get_random_content(&self, roll: u64) -> Option<&Unit> {
        let alive: Vec<&Unit> = self.alive().collect();
        if alive.is_empty() {
            return None;
        }
        Some(alive[(roll % alive.len() as u64) as usize])
    }

    /// Append a unit at the back.
    pub fn push(&mut self, unit: Unit) {
        self.contents.push(unit);
    }

    /// Insert a unit at `index`, clamped to the back.
    pub fn insert(&mut self, index: usize, unit: Unit) {
        let index = index.min(self.contents.len());
        self.contents.insert(index, unit);
    }

    /// Remove a unit by id, shifting the units behind it forward.
    pub fn remove_content(&mut self, id: UnitId) -> Option<Unit> {
        let index = self.position_of(id)?;
        Some(self.contents.remove(index))
    }

    /// Move the unit at `from` to `to`, shifting the others.
    pub fn move_in_array(&mut self, from: usize, to: usize) -> bool {
        if from >= self.contents.len() || to >= self.contents.len() {
            return false;
        }
        let unit = self.contents.remove(from);
        self.contents.insert(to, unit);
        true
    }

    /// Ids of units whose health has reached zero, in positional order.
    #[must_use]
    pub fn depleted_ids(&self) -> Vec<UnitId> {
        self.contents
            .iter()
            .filter(|unit| unit.health <= 0)
            .map(|unit| unit.id)
            .collect()
    }
}
