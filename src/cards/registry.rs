//! The card pool a game draws its definitions from.
//!
//! Built once before a game, then wrapped in an `Arc` and read through the
//! game state. Instances only store a `CardId`; every printed value comes
//! from here.

use rustc_hash::FxHashMap;

use super::definition::{CardCategory, CardDefinition, CardId};

/// Printed cards by id.
///
/// ## Example
///
/// ```
/// use opcg_rules::cards::{CardCategory, CardDefinition, CardId, CardRegistry};
///
/// let pool = CardRegistry::new()
///     .with_card(CardDefinition::leader(CardId::new(1), "Captain", 5000, 5))
///     .with_card(CardDefinition::don(CardId::new(2)));
///
/// assert_eq!(pool.get(CardId::new(1)).map(|c| c.life), Some(5));
/// assert_eq!(pool.category(CardId::new(2)), Some(CardCategory::Don));
/// assert_eq!(pool.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    pool: FxHashMap<CardId, CardDefinition>,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a printed card to the pool.
    ///
    /// Panics on a reused id.
    pub fn register(&mut self, card: CardDefinition) {
        if self.pool.contains_key(&card.id) {
            panic!("{} already registered as '{}'", card.id, self.pool[&card.id].name);
        }
        self.pool.insert(card.id, card);
    }

    #[must_use]
    pub fn with_card(mut self, card: CardDefinition) -> Self {
        self.register(card);
        self
    }

    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.pool.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.pool.contains_key(&id)
    }

    /// Category of a printed card, if known.
    #[must_use]
    pub fn category(&self, id: CardId) -> Option<CardCategory> {
        self.pool.get(&id).map(|c| c.category)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
