//! Deck lists used to build a game.

use serde::{Deserialize, Serialize};

use super::definition::{CardCategory, CardId};
use super::registry::CardRegistry;
use crate::error::EngineError;

/// One player's deck: a leader, the main deck and the DON!! card to copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub leader: CardId,
    /// Main deck, listed bottom to top before shuffling.
    pub cards: Vec<CardId>,
    /// Definition used for every card of the DON!! deck.
    pub don: CardId,
}

impl DeckList {
    #[must_use]
    pub fn new(leader: CardId, cards: Vec<CardId>, don: CardId) -> Self {
        Self { leader, cards, don }
    }

    /// Check every reference against the registry.
    pub fn validate(&self, registry: &CardRegistry) -> Result<(), EngineError> {
        match registry.get(self.leader) {
            Some(def) if def.category == CardCategory::Leader => {}
            Some(def) => {
                return Err(EngineError::InvalidDeck(format!(
                    "{} is a {:?}, not a leader",
                    def.name, def.category
                )))
            }
            None => {
                return Err(EngineError::InvalidDeck(format!(
                    "unknown leader {}",
                    self.leader
                )))
            }
        }

        match registry.category(self.don) {
            Some(CardCategory::Don) => {}
            _ => {
                return Err(EngineError::InvalidDeck(format!(
                    "{} is not a DON!! card",
                    self.don
                )))
            }
        }

        for id in &self.cards {
            match registry.get(*id) {
                Some(def)
                    if !matches!(def.category, CardCategory::Leader | CardCategory::Don) => {}
                Some(def) => {
                    return Err(EngineError::InvalidDeck(format!(
                        "{} cannot be in the main deck",
                        def.name
                    )))
                }
                None => {
                    return Err(EngineError::InvalidDeck(format!("unknown card {}", id)));
                }
            }
        }
        Ok(())
    }
}
