//! The contract between the engine and whoever makes a player's choices.
//!
//! Implementations can be human front-ends, scripted fixtures, replays or AI
//! policies. The engine never trusts an answer: the `DecisionGate` bounds
//! every call with a timeout and checks the choice against the options it
//! offered.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GameAction, GameState};
use crate::effects::{EffectId, EffectInstance};
use crate::error::DecisionError;

/// What a defender can do during the counter step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterAction {
    /// Trash a card from hand and add its printed counter value to the
    /// battle target until the battle ends.
    UseCounter { card: EntityId },

    /// Pay for and play an event's counter-window effect from hand.
    PlayCounterEvent { card: EntityId, effect: EffectId },
}

impl CounterAction {
    /// The hand card this action uses.
    #[must_use]
    pub fn card(&self) -> EntityId {
        match self {
            CounterAction::UseCounter { card } | CounterAction::PlayCounterEvent { card, .. } => {
                *card
            }
        }
    }
}

/// Decision provider for one seat.
///
/// Methods that take a list of options fail with `DecisionError::NoOptions`
/// when it is empty; the gate never calls them that way.
#[async_trait]
pub trait Player: Send + Sync {
    /// Pick a main-phase action from `legal`.
    async fn choose_action(
        &self,
        legal: &[GameAction],
        state: &GameState,
    ) -> Result<GameAction, DecisionError>;

    /// Whether to return `hand` and redraw.
    async fn choose_mulligan(
        &self,
        hand: &[EntityId],
        state: &GameState,
    ) -> Result<bool, DecisionError>;

    /// Pick a blocker against `attacker`, or `None` to take the hit.
    async fn choose_blocker(
        &self,
        legal: &[EntityId],
        attacker: EntityId,
        state: &GameState,
    ) -> Result<Option<EntityId>, DecisionError>;

    /// Pick a counter action, or `None` to pass.
    async fn choose_counter_action(
        &self,
        options: &[CounterAction],
        state: &GameState,
    ) -> Result<Option<CounterAction>, DecisionError>;

    /// Pick one target for `effect`.
    async fn choose_target(
        &self,
        legal: &[EntityId],
        effect: &EffectInstance,
        state: &GameState,
    ) -> Result<EntityId, DecisionError>;

    /// Pick one value for `effect`.
    async fn choose_value(
        &self,
        options: &[i64],
        effect: &EffectInstance,
        state: &GameState,
    ) -> Result<i64, DecisionError>;
}
