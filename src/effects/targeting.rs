//! Effect targeting.
//!
//! A `TargetSpec` describes which cards in play an effect may pick:
//! whose side, leaders and/or characters, optional power/cost/orientation
//! caps, and how many. Candidates are always listed in board order
//! (the controller's side first, leader before characters, characters left
//! to right) so that default choices are deterministic.

use serde::{Deserialize, Serialize};

use crate::cards::CardState;
use crate::core::{EntityId, GameState, PlayerId};

/// Which side of the board a target may be on, relative to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetSide {
    Own,
    Opponent,
    Either,
}

/// Targeting requirements.
///
/// ## Example
///
/// ```
/// use opcg_rules::cards::CardState;
/// use opcg_rules::effects::{TargetSide, TargetSpec};
///
/// // "K.O. up to 1 of your opponent's rested characters with 4000 power or less"
/// let spec = TargetSpec::characters(TargetSide::Opponent)
///     .with_max_power(4000)
///     .with_state(CardState::Rested);
///
/// assert_eq!(spec.count, 1);
/// assert!(!spec.leaders);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub side: TargetSide,
    pub leaders: bool,
    pub characters: bool,
    /// Only the effect's own source.
    pub this_card: bool,
    pub max_power: Option<i64>,
    pub max_cost: Option<u32>,
    pub state: Option<CardState>,
    /// Maximum number of targets.
    pub count: u8,
}

impl TargetSpec {
    /// The source card itself.
    #[must_use]
    pub fn this_card() -> Self {
        Self {
            side: TargetSide::Own,
            leaders: true,
            characters: true,
            this_card: true,
            max_power: None,
            max_cost: None,
            state: None,
            count: 1,
        }
    }

    /// One character on the given side.
    #[must_use]
    pub fn characters(side: TargetSide) -> Self {
        Self {
            side,
            leaders: false,
            characters: true,
            this_card: false,
            max_power: None,
            max_cost: None,
            state: None,
            count: 1,
        }
    }

    /// One leader or character on the given side.
    #[must_use]
    pub fn leader_or_character(side: TargetSide) -> Self {
        Self {
            leaders: true,
            ..Self::characters(side)
        }
    }

    /// The leader on the given side.
    #[must_use]
    pub fn leader(side: TargetSide) -> Self {
        Self {
            characters: false,
            ..Self::leader_or_character(side)
        }
    }

    #[must_use]
    pub fn with_max_power(mut self, power: i64) -> Self {
        self.max_power = Some(power);
        self
    }

    #[must_use]
    pub fn with_max_cost(mut self, cost: u32) -> Self {
        self.max_cost = Some(cost);
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: CardState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    /// Legal targets in board order.
    #[must_use]
    pub fn candidates(&self, state: &GameState, controller: PlayerId, source: EntityId) -> Vec<EntityId> {
        if self.this_card {
            return state
                .card(source)
                .filter(|c| c.is_in_play() && c.controller == controller)
                .filter(|_| self.matches(state, source))
                .map(|c| vec![c.entity_id])
                .unwrap_or_default();
        }

        let sides: &[PlayerId] = match self.side {
            TargetSide::Own => &[controller],
            TargetSide::Opponent => &[controller.opponent()],
            TargetSide::Either => &[controller, controller.opponent()],
        };

        let mut out = Vec::new();
        for &player in sides {
            let board = state.player(player);
            if self.leaders {
                out.extend(board.leader().filter(|&id| self.matches(state, id)));
            }
            if self.characters {
                out.extend(
                    board
                        .characters()
                        .iter()
                        .copied()
                        .filter(|&id| self.matches(state, id)),
                );
            }
        }
        out
    }

    /// Whether a card satisfies the power/cost/orientation filters.
    #[must_use]
    pub fn matches(&self, state: &GameState, card: EntityId) -> bool {
        let (Some(instance), Some(def)) = (state.card(card), state.definition_of(card)) else {
            return false;
        };
        if let Some(max) = self.max_power {
            if state.power_of(card) > max {
                return false;
            }
        }
        if let Some(max) = self.max_cost {
            if def.cost > max {
                return false;
            }
        }
        if let Some(required) = self.state {
            if instance.state != required {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let spec = TargetSpec::leader(TargetSide::Own);
        assert!(spec.leaders);
        assert!(!spec.characters);

        let spec = TargetSpec::leader_or_character(TargetSide::Either).with_count(2);
        assert!(spec.leaders && spec.characters);
        assert_eq!(spec.count, 2);

        let spec = TargetSpec::this_card();
        assert!(spec.this_card);
    }

    #[test]
    fn test_filters_builder() {
        let spec = TargetSpec::characters(TargetSide::Opponent)
            .with_max_cost(3)
            .with_max_power(5000)
            .with_state(CardState::Active);
        assert_eq!(spec.max_cost, Some(3));
        assert_eq!(spec.max_power, Some(5000));
        assert_eq!(spec.state, Some(CardState::Active));
    }
}
