//! Bundled decision providers.
//!
//! - `FirstLegalPlayer`: always the first option, keeps every hand
//! - `ScriptedPlayer`: answers from queues, for fixtures and replays
//! - `RandomPlayer`: seeded uniform choices, for property tests and soak runs

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::player::{CounterAction, Player};
use crate::core::{EntityId, GameAction, GameRng, GameState};
use crate::effects::EffectInstance;
use crate::error::DecisionError;

fn first<T: Copy>(options: &[T]) -> Result<T, DecisionError> {
    options.first().copied().ok_or(DecisionError::NoOptions)
}

/// Picks the first option every time.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstLegalPlayer;

#[async_trait]
impl Player for FirstLegalPlayer {
    async fn choose_action(
        &self,
        legal: &[GameAction],
        _state: &GameState,
    ) -> Result<GameAction, DecisionError> {
        legal.first().cloned().ok_or(DecisionError::NoOptions)
    }

    async fn choose_mulligan(
        &self,
        _hand: &[EntityId],
        _state: &GameState,
    ) -> Result<bool, DecisionError> {
        Ok(false)
    }

    async fn choose_blocker(
        &self,
        legal: &[EntityId],
        _attacker: EntityId,
        _state: &GameState,
    ) -> Result<Option<EntityId>, DecisionError> {
        first(legal).map(Some)
    }

    async fn choose_counter_action(
        &self,
        options: &[CounterAction],
        _state: &GameState,
    ) -> Result<Option<CounterAction>, DecisionError> {
        first(options).map(Some)
    }

    async fn choose_target(
        &self,
        legal: &[EntityId],
        _effect: &EffectInstance,
        _state: &GameState,
    ) -> Result<EntityId, DecisionError> {
        first(legal)
    }

    async fn choose_value(
        &self,
        options: &[i64],
        _effect: &EffectInstance,
        _state: &GameState,
    ) -> Result<i64, DecisionError> {
        first(options)
    }
}

#[derive(Debug, Default)]
struct Script {
    actions: VecDeque<GameAction>,
    mulligans: VecDeque<bool>,
    blockers: VecDeque<Option<EntityId>>,
    counters: VecDeque<Option<CounterAction>>,
    targets: VecDeque<EntityId>,
    values: VecDeque<i64>,
}

/// Answers from pre-loaded queues.
///
/// Answers are returned as queued, legal or not; the gate is responsible for
/// rejecting them. When a queue runs dry the player falls back to: `EndPhase`
/// (or the first legal action), keep hand, no block, no counter, first
/// target, first value.
///
/// ## Example
///
/// ```
/// use opcg_rules::core::{EntityId, GameAction};
/// use opcg_rules::decision::ScriptedPlayer;
///
/// let player = ScriptedPlayer::new()
///     .with_action(GameAction::PlayCard { card: EntityId::new(12) })
///     .with_blocker(None)
///     .with_value(1);
/// assert_eq!(player.pending(), 3);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedPlayer {
    script: Mutex<Script>,
    delay: Option<Duration>,
}

impl ScriptedPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_action(self, action: GameAction) -> Self {
        self.edit(|s| s.actions.push_back(action))
    }

    #[must_use]
    pub fn with_actions(self, actions: impl IntoIterator<Item = GameAction>) -> Self {
        self.edit(|s| s.actions.extend(actions))
    }

    #[must_use]
    pub fn with_mulligan(self, mulligan: bool) -> Self {
        self.edit(|s| s.mulligans.push_back(mulligan))
    }

    #[must_use]
    pub fn with_blocker(self, blocker: Option<EntityId>) -> Self {
        self.edit(|s| s.blockers.push_back(blocker))
    }

    #[must_use]
    pub fn with_counter(self, counter: Option<CounterAction>) -> Self {
        self.edit(|s| s.counters.push_back(counter))
    }

    #[must_use]
    pub fn with_target(self, target: EntityId) -> Self {
        self.edit(|s| s.targets.push_back(target))
    }

    #[must_use]
    pub fn with_value(self, value: i64) -> Self {
        self.edit(|s| s.values.push_back(value))
    }

    /// Answers not yet consumed, across all queues.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.with_script(|s| {
            s.actions.len()
                + s.mulligans.len()
                + s.blockers.len()
                + s.counters.len()
                + s.targets.len()
                + s.values.len()
        })
    }

    fn edit(mut self, f: impl FnOnce(&mut Script)) -> Self {
        let script = self
            .script
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(script);
        self
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut script)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Player for ScriptedPlayer {
    async fn choose_action(
        &self,
        legal: &[GameAction],
        _state: &GameState,
    ) -> Result<GameAction, DecisionError> {
        self.pause().await;
        if let Some(action) = self.with_script(|s| s.actions.pop_front()) {
            return Ok(action);
        }
        if legal.contains(&GameAction::EndPhase) {
            return Ok(GameAction::EndPhase);
        }
        legal.first().cloned().ok_or(DecisionError::NoOptions)
    }

    async fn choose_mulligan(
        &self,
        _hand: &[EntityId],
        _state: &GameState,
    ) -> Result<bool, DecisionError> {
        self.pause().await;
        Ok(self.with_script(|s| s.mulligans.pop_front()).unwrap_or(false))
    }

    async fn choose_blocker(
        &self,
        legal: &[EntityId],
        _attacker: EntityId,
        _state: &GameState,
    ) -> Result<Option<EntityId>, DecisionError> {
        if legal.is_empty() {
            return Err(DecisionError::NoOptions);
        }
        self.pause().await;
        Ok(self.with_script(|s| s.blockers.pop_front()).flatten())
    }

    async fn choose_counter_action(
        &self,
        options: &[CounterAction],
        _state: &GameState,
    ) -> Result<Option<CounterAction>, DecisionError> {
        if options.is_empty() {
            return Err(DecisionError::NoOptions);
        }
        self.pause().await;
        Ok(self.with_script(|s| s.counters.pop_front()).flatten())
    }

    async fn choose_target(
        &self,
        legal: &[EntityId],
        _effect: &EffectInstance,
        _state: &GameState,
    ) -> Result<EntityId, DecisionError> {
        let fallback = first(legal)?;
        self.pause().await;
        Ok(self.with_script(|s| s.targets.pop_front()).unwrap_or(fallback))
    }

    async fn choose_value(
        &self,
        options: &[i64],
        _effect: &EffectInstance,
        _state: &GameState,
    ) -> Result<i64, DecisionError> {
        let fallback = first(options)?;
        self.pause().await;
        Ok(self.with_script(|s| s.values.pop_front()).unwrap_or(fallback))
    }
}

/// Uniform random choices from a seeded RNG.
#[derive(Debug)]
pub struct RandomPlayer {
    rng: Mutex<GameRng>,
}

impl RandomPlayer {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(GameRng::new(seed)),
        }
    }

    /// Index in `0..len`, or `None` if `len` is zero.
    fn pick(&self, len: usize) -> Option<usize> {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rng.index(len)
    }

    fn pick_from<T: Clone>(&self, options: &[T]) -> Result<T, DecisionError> {
        self.pick(options.len())
            .and_then(|i| options.get(i).cloned())
            .ok_or(DecisionError::NoOptions)
    }

    /// `None` or one of `options`, uniformly.
    fn maybe_pick<T: Copy>(&self, options: &[T]) -> Result<Option<T>, DecisionError> {
        if options.is_empty() {
            return Err(DecisionError::NoOptions);
        }
        Ok(self
            .pick(options.len() + 1)
            .and_then(|i| options.get(i).copied()))
    }
}

#[async_trait]
impl Player for RandomPlayer {
    async fn choose_action(
        &self,
        legal: &[GameAction],
        _state: &GameState,
    ) -> Result<GameAction, DecisionError> {
        self.pick_from(legal)
    }

    async fn choose_mulligan(
        &self,
        _hand: &[EntityId],
        _state: &GameState,
    ) -> Result<bool, DecisionError> {
        Ok(self.pick(2) == Some(1))
    }

    async fn choose_blocker(
        &self,
        legal: &[EntityId],
        _attacker: EntityId,
        _state: &GameState,
    ) -> Result<Option<EntityId>, DecisionError> {
        self.maybe_pick(legal)
    }

    async fn choose_counter_action(
        &self,
        options: &[CounterAction],
        _state: &GameState,
    ) -> Result<Option<CounterAction>, DecisionError> {
        self.maybe_pick(options)
    }

    async fn choose_target(
        &self,
        legal: &[EntityId],
        _effect: &EffectInstance,
        _state: &GameState,
    ) -> Result<EntityId, DecisionError> {
        self.pick_from(legal)
    }

    async fn choose_value(
        &self,
        options: &[i64],
        _effect: &EffectInstance,
        _state: &GameState,
    ) -> Result<i64, DecisionError> {
        self.pick_from(options)
    }
}
