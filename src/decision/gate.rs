//! Bounded, validated access to the players' decision providers.
//!
//! Every question goes through `tokio::time::timeout`. A timeout, a provider
//! error or an answer outside the offered options is a fault: it is logged,
//! surfaced as a `GameEvent::Error`, and replaced by the safe default for
//! that category.
//!
//! | Category | Default           |
//! |----------|-------------------|
//! | action   | `EndPhase`        |
//! | mulligan | keep hand         |
//! | blocker  | no block          |
//! | counter  | pass              |
//! | target   | first legal       |
//! | value    | first legal       |

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::player::{CounterAction, Player};
use crate::core::{DecisionTimeouts, EntityId, GameAction, GameState, PlayerId, PlayerMap};
use crate::effects::EffectInstance;
use crate::error::DecisionError;
use crate::triggers::GameEvent;

/// Routes decisions to the right seat under a time limit.
#[derive(Clone)]
pub struct DecisionGate {
    players: PlayerMap<Arc<dyn Player>>,
    timeouts: DecisionTimeouts,
}

impl DecisionGate {
    #[must_use]
    pub fn new(players: PlayerMap<Arc<dyn Player>>, timeouts: DecisionTimeouts) -> Self {
        Self { players, timeouts }
    }

    #[must_use]
    pub fn timeouts(&self) -> &DecisionTimeouts {
        &self.timeouts
    }

    /// The provider seated at `player`.
    #[must_use]
    pub fn provider(&self, player: PlayerId) -> &Arc<dyn Player> {
        &self.players[player]
    }

    /// Ask for a main-phase action.
    pub async fn choose_action(
        &self,
        state: &mut GameState,
        player: PlayerId,
        legal: &[GameAction],
    ) -> GameAction {
        if legal.is_empty() {
            return GameAction::EndPhase;
        }
        let limit = self.timeouts.action;
        let answer = bounded(limit, self.players[player].choose_action(legal, state)).await;
        match answer.and_then(|a| offered(a, legal)) {
            Ok(action) => action,
            Err(err) => {
                fault(state, player, "action", &err);
                GameAction::EndPhase
            }
        }
    }

    /// Ask whether to mulligan the current hand.
    pub async fn choose_mulligan(&self, state: &mut GameState, player: PlayerId) -> bool {
        let hand = state.player(player).hand().to_vec();
        let limit = self.timeouts.mulligan;
        match bounded(limit, self.players[player].choose_mulligan(&hand, state)).await {
            Ok(mulligan) => mulligan,
            Err(err) => {
                fault(state, player, "mulligan", &err);
                false
            }
        }
    }

    /// Ask the defender for a blocker. Never asks when `legal` is empty.
    pub async fn choose_blocker(
        &self,
        state: &mut GameState,
        player: PlayerId,
        legal: &[EntityId],
        attacker: EntityId,
    ) -> Option<EntityId> {
        if legal.is_empty() {
            return None;
        }
        let limit = self.timeouts.blocker;
        let answer =
            bounded(limit, self.players[player].choose_blocker(legal, attacker, state)).await;
        match answer.and_then(|choice| match choice {
            Some(blocker) => offered(blocker, legal).map(Some),
            None => Ok(None),
        }) {
            Ok(choice) => choice,
            Err(err) => {
                fault(state, player, "blocker", &err);
                None
            }
        }
    }

    /// Ask the defender for a counter action, or a pass.
    pub async fn choose_counter_action(
        &self,
        state: &mut GameState,
        player: PlayerId,
        options: &[CounterAction],
    ) -> Option<CounterAction> {
        if options.is_empty() {
            return None;
        }
        let limit = self.timeouts.counter;
        let answer = bounded(limit, self.players[player].choose_counter_action(options, state)).await;
        match answer.and_then(|choice| match choice {
            Some(action) => offered(action, options).map(Some),
            None => Ok(None),
        }) {
            Ok(choice) => choice,
            Err(err) => {
                fault(state, player, "counter", &err);
                None
            }
        }
    }

    /// Ask the effect's controller for one target. `None` only when `legal`
    /// is empty.
    pub async fn choose_target(
        &self,
        state: &mut GameState,
        legal: &[EntityId],
        effect: &EffectInstance,
    ) -> Option<EntityId> {
        let first = legal.first().copied()?;
        let player = effect.controller;
        let limit = self.timeouts.target;
        let answer = bounded(limit, self.players[player].choose_target(legal, effect, state)).await;
        match answer.and_then(|t| offered(t, legal)) {
            Ok(target) => Some(target),
            Err(err) => {
                fault(state, player, "target", &err);
                Some(first)
            }
        }
    }

    /// Ask the effect's controller for one value. `None` only when
    /// `options` is empty.
    pub async fn choose_value(
        &self,
        state: &mut GameState,
        options: &[i64],
        effect: &EffectInstance,
    ) -> Option<i64> {
        let first = options.first().copied()?;
        let player = effect.controller;
        let limit = self.timeouts.value;
        let answer = bounded(limit, self.players[player].choose_value(options, effect, state)).await;
        match answer.and_then(|v| offered(v, options)) {
            Ok(value) => Some(value),
            Err(err) => {
                fault(state, player, "value", &err);
                Some(first)
            }
        }
    }
}

impl fmt::Debug for DecisionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionGate")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

async fn bounded<T>(
    limit: Duration,
    answer: impl Future<Output = Result<T, DecisionError>>,
) -> Result<T, DecisionError> {
    match tokio::time::timeout(limit, answer).await {
        Ok(result) => result,
        Err(_) => Err(DecisionError::Timeout(limit)),
    }
}

fn offered<T: PartialEq + fmt::Debug>(choice: T, options: &[T]) -> Result<T, DecisionError> {
    if options.contains(&choice) {
        Ok(choice)
    } else {
        Err(DecisionError::InvalidChoice(format!("{choice:?}")))
    }
}

fn fault(state: &mut GameState, player: PlayerId, category: &str, err: &DecisionError) {
    warn!(%player, category, %err, "decision fault, using default");
    state.emit(GameEvent::Error {
        player: Some(player),
        message: format!("{category} decision: {err}"),
    });
}
