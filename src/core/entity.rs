//! Card instance identification.
//!
//! Every physical card in a game (leader, deck cards, DON!! cards) gets a
//! unique `EntityId` when the decks are constructed. Instances are never
//! deleted, so ids are dense and allocated sequentially from zero.
//!
//! ## Usage
//!
//! ```
//! use opcg_rules::core::EntityId;
//!
//! let card = EntityId::new(10);
//! assert_eq!(card.raw(), 10);
//! assert_eq!(card.index(), 10);
//! assert_eq!(format!("{}", card), "Entity(10)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a card instance.
///
/// Doubles as the index into the game's instance table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Position of this instance in the instance table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
