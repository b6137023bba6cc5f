//! Effect conditions.
//!
//! A condition is checked twice: when an auto effect would trigger, and again
//! when its instance is popped off the stack. A condition that fails at
//! resolution makes the effect fizzle; it is not an error.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GameState, PlayerId};

/// A predicate over the game state, seen from the effect's controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// Always holds.
    Always,

    /// It is the controller's turn.
    YourTurn,

    /// It is the opponent's turn.
    OpponentTurn,

    /// The controller has at least N DON!! on the field
    /// (cost area plus attached).
    DonAtLeast(u32),

    /// The controller has at most N life cards.
    LifeAtMost(u32),

    /// The controller has at most N cards in hand.
    HandAtMost(u32),

    /// The source card is still in play.
    SourceInPlay,

    All(Vec<Condition>),

    Any(Vec<Condition>),

    Not(Box<Condition>),
}

impl Condition {
    /// Create an AND condition.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Create an OR condition.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Negate a condition.
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }
}

/// Evaluates conditions against a game state.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate `condition` for an effect of `source` controlled by `controller`.
    #[must_use]
    pub fn evaluate(
        condition: &Condition,
        state: &GameState,
        controller: PlayerId,
        source: EntityId,
    ) -> bool {
        match condition {
            Condition::Always => true,
            Condition::YourTurn => state.active_player() == controller,
            Condition::OpponentTurn => state.active_player() != controller,
            Condition::DonAtLeast(n) => Self::don_on_field(state, controller) >= *n as usize,
            Condition::LifeAtMost(n) => state.player(controller).life().len() <= *n as usize,
            Condition::HandAtMost(n) => state.player(controller).hand().len() <= *n as usize,
            Condition::SourceInPlay => state.card(source).is_some_and(|c| c.is_in_play()),
            Condition::All(conds) => conds
                .iter()
                .all(|c| Self::evaluate(c, state, controller, source)),
            Condition::Any(conds) => conds
                .iter()
                .any(|c| Self::evaluate(c, state, controller, source)),
            Condition::Not(cond) => !Self::evaluate(cond, state, controller, source),
        }
    }

    fn don_on_field(state: &GameState, player: PlayerId) -> usize {
        let board = state.player(player);
        let attached: usize = board
            .leader()
            .into_iter()
            .chain(board.characters().iter().copied())
            .filter_map(|id| state.card(id))
            .map(|c| c.attached_don.len())
            .sum();
        board.cost_area().len() + attached
    }
}
