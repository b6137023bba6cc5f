//! The turn/phase state machine.
//!
//! ```text
//! Setup (shuffle, hands, mulligans, life)
//!   │
//!   ▼
//! ┌─► Refresh ─► Draw ─► Don ─► Main (loop) ─► End ─┐
//! └─────────────────────────────────────────────────┘
//!   │
//!   ▼
//! GameOver
//! ```
//!
//! Every mutation goes through the zone manager, the effect system or the
//! battle resolver. The engine publishes new event-log records to its
//! subscribers after setup, after each applied or refused action, and at
//! each phase boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::bus::EventBus;
use super::legal::LegalActions;
use crate::battle::BattleResolver;
use crate::cards::{CardCategory, CardRegistry, CardState, DeckList, Expiry};
use crate::core::{
    EngineConfig, EntityId, GameAction, GameState, Phase, PlayerId, PlayerMap, PlayerState, Zone,
    FLAG_DECKED_OUT, FLAG_MULLIGANED,
};
use crate::decision::{CounterAction, DecisionGate, Player};
use crate::effects::{ActivationWindow, CostExpr, CostPayment, EffectOrigin, EffectSystem, ScriptRegistry};
use crate::error::{EngineError, Result};
use crate::triggers::{EventRecord, GameEvent, GameOverReason};
use crate::zones::{ZoneManager, ZonePosition};

/// Result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    Winner(PlayerId),
    /// Both players lost at the same check.
    Draw,
    /// Ended by the loop guard.
    Aborted,
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameResult::Winner(p) if *p == player)
    }
}

/// Drives one game.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use opcg_rules::cards::{CardDefinition, CardId, CardRegistry, DeckList};
/// use opcg_rules::core::{EngineConfig, PlayerMap};
/// use opcg_rules::decision::{FirstLegalPlayer, Player};
/// use opcg_rules::rules::GameEngine;
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let registry = Arc::new(
///     CardRegistry::new()
///         .with_card(CardDefinition::leader(CardId::new(1), "Captain", 5000, 2))
///         .with_card(CardDefinition::don(CardId::new(2)))
///         .with_card(CardDefinition::character(CardId::new(3), "Swabbie", 1, 2000)),
/// );
/// let deck = DeckList::new(CardId::new(1), vec![CardId::new(3); 20], CardId::new(2));
/// let seat: Arc<dyn Player> = Arc::new(FirstLegalPlayer);
///
/// let mut engine = GameEngine::new(
///     EngineConfig::default().with_seed(3),
///     registry,
///     PlayerMap::with_value(deck),
///     PlayerMap::with_value(seat),
/// )
/// .unwrap();
/// let result = engine.run().await.unwrap();
/// assert!(engine.state().is_game_over());
/// assert_eq!(engine.state().result(), Some(result));
/// # });
/// ```
#[derive(Debug)]
pub struct GameEngine {
    state: GameState,
    gate: DecisionGate,
    bus: EventBus,
}

impl GameEngine {
    /// Build a game from two deck lists. Nothing is shuffled or dealt until
    /// `setup` (or `run`).
    pub fn new(
        config: EngineConfig,
        registry: Arc<CardRegistry>,
        decks: PlayerMap<DeckList>,
        players: PlayerMap<Arc<dyn Player>>,
    ) -> Result<Self> {
        let timeouts = config.timeouts;
        let mut state = GameState::new(config, registry);
        for (player, deck) in decks.iter() {
            state.add_deck(player, deck)?;
        }
        Ok(Self {
            state,
            gate: DecisionGate::new(players, timeouts),
            bus: EventBus::new(),
        })
    }

    /// Drive an existing state, e.g. a fixture built with `spawn_card`.
    #[must_use]
    pub fn from_state(state: GameState, players: PlayerMap<Arc<dyn Player>>) -> Self {
        let timeouts = state.config().timeouts;
        Self {
            state,
            gate: DecisionGate::new(players, timeouts),
            bus: EventBus::new(),
        }
    }

    /// Install custom effect scripts (builder pattern).
    #[must_use]
    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.state.scripts = Arc::new(scripts);
        self
    }

    // === Queries ===

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.state.result()
    }

    /// Receive every event-log record exactly once, starting with whatever
    /// has already been published.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EventRecord> {
        self.bus.subscribe(&self.state.events)
    }

    #[must_use]
    pub fn legal_actions(&self, player: PlayerId) -> Vec<GameAction> {
        LegalActions::enumerate(&self.state, player)
    }

    #[must_use]
    pub fn legal_attack_targets(&self, attacker: EntityId) -> Vec<EntityId> {
        BattleResolver::legal_attack_targets(&self.state, attacker)
    }

    #[must_use]
    pub fn legal_blockers(&self, attacker: EntityId, target: EntityId) -> Vec<EntityId> {
        BattleResolver::legal_blockers(&self.state, attacker, target)
    }

    #[must_use]
    pub fn counter_options(&self, player: PlayerId) -> Vec<CounterAction> {
        BattleResolver::counter_options(&self.state, player)
    }

    // === Game loop ===

    /// Play to the end. Returns the result, or the error that aborted it.
    pub async fn run(&mut self) -> Result<GameResult> {
        self.setup().await?;
        while !self.state.is_game_over() {
            self.play_turn().await?;
        }
        self.state
            .result()
            .ok_or_else(|| EngineError::IllegalAction("game ended without a result".into()))
    }

    /// Shuffle, deal opening hands, offer mulligans and deal life.
    /// Does nothing if the game has already started.
    pub async fn setup(&mut self) -> Result<()> {
        if self.state.started {
            return Ok(());
        }
        self.state.started = true;
        self.state.phase = Phase::Setup;
        let first = self.state.config().first_player;
        self.state.active_player = first;
        let hand_size = self.state.config().starting_hand_size;

        for player in PlayerId::all() {
            self.state.shuffle_deck(player);
        }
        self.state.emit(GameEvent::GameStarted {
            first_player: first,
        });
        info!(%first, seed = self.state.config().seed, "game started");

        for player in PlayerId::all() {
            self.draw_cards(player, hand_size)?;
        }

        for player in [first, first.opponent()] {
            let mulliganed = self.gate.choose_mulligan(&mut self.state, player).await;
            if mulliganed {
                let hand = self.state.player(player).hand().to_vec();
                for card in hand {
                    ZoneManager::move_card(
                        &mut self.state,
                        card,
                        Zone::Hand,
                        Zone::Deck,
                        player,
                        ZonePosition::Top,
                    )?;
                }
                self.state.shuffle_deck(player);
                self.draw_cards(player, hand_size)?;
                self.state.player_mut(player).set_flag(FLAG_MULLIGANED, 1);
            }
            self.state.emit(GameEvent::MulliganResolved { player, mulliganed });
            debug!(%player, mulliganed, "mulligan resolved");
        }

        for player in PlayerId::all() {
            let life = self
                .state
                .player(player)
                .leader()
                .and_then(|leader| self.state.definition_of(leader))
                .map_or(0, |def| def.life);
            for _ in 0..life {
                let Some(card) = self.state.player(player).deck().last().copied() else {
                    break;
                };
                ZoneManager::move_card(
                    &mut self.state,
                    card,
                    Zone::Deck,
                    Zone::Life,
                    player,
                    ZonePosition::Top,
                )?;
            }
        }

        self.state.turn = 0;
        self.publish();
        Ok(())
    }

    /// Play one full turn of the active player.
    pub async fn play_turn(&mut self) -> Result<()> {
        if self.state.is_game_over() {
            return Ok(());
        }
        self.state.turn += 1;
        let turn = self.state.turn;
        let active = self.state.active_player;
        debug!(turn, %active, "turn started");

        // Refresh
        self.enter_phase(Phase::Refresh);
        ZoneManager::return_attached_don(&mut self.state, active);
        for zone in [Zone::CostArea, Zone::Leader, Zone::Character, Zone::Stage] {
            let cards = self.state.player(active).zone(zone).to_vec();
            for card in cards {
                ZoneManager::set_card_state(&mut self.state, card, CardState::Active)?;
            }
        }
        for card in self.state.cards.iter_mut() {
            card.reset_turn_flags();
        }
        self.state.emit(GameEvent::TurnStarted {
            player: active,
            turn,
        });
        self.settle().await?;
        if self.state.is_game_over() {
            return Ok(());
        }

        // Draw
        self.enter_phase(Phase::Draw);
        if turn > 1 {
            if self.state.player(active).deck().is_empty() {
                self.state.player_mut(active).set_flag(FLAG_DECKED_OUT, 1);
                warn!(player = %active, "decked out");
                self.check_win();
                self.publish();
                return Ok(());
            }
            ZoneManager::draw(&mut self.state, active)?;
        }

        // Don
        self.enter_phase(Phase::Don);
        let config = self.state.config();
        let don = if turn == 1 { config.first_turn_don } else { config.don_per_turn };
        for _ in 0..don {
            let Some(card) = self.state.player(active).don_deck().last().copied() else {
                break;
            };
            ZoneManager::move_to_cost_area(
                &mut self.state,
                card,
                Zone::DonDeck,
                active,
                CardState::Active,
            )?;
            self.state.emit(GameEvent::DonAdded {
                player: active,
                don: card,
            });
        }
        self.publish();

        // Main
        self.enter_phase(Phase::Main);
        self.publish();
        while !self.state.is_game_over() {
            let legal = LegalActions::enumerate(&self.state, active);
            if legal.is_empty() {
                break;
            }
            let action = self.gate.choose_action(&mut self.state, active, &legal).await;
            let ends_phase = action.ends_phase();
            if let Err(err @ EngineError::LoopGuardExceeded { .. }) =
                self.apply_action(active, action).await
            {
                return Err(err);
            }
            if ends_phase {
                break;
            }
        }
        if self.state.is_game_over() {
            return Ok(());
        }

        // End
        self.enter_phase(Phase::End);
        self.settle().await?;
        for card in self.state.cards.iter_mut() {
            card.expire(Expiry::EndOfTurn);
        }
        self.check_win();
        self.publish();
        if !self.state.is_game_over() {
            self.state.active_player = active.opponent();
        }
        Ok(())
    }

    /// Validate and apply one main-phase action for `player`.
    ///
    /// Every call counts once towards the loop guard, refused or not. A
    /// refused action changes nothing else except for an `Error` event. An
    /// applied one is recorded, resolved (including any battle and the
    /// triggers it raises) and followed by a win check.
    pub async fn apply_action(&mut self, player: PlayerId, action: GameAction) -> Result<()> {
        let limits = self.state.config().loop_guard;
        let counted = self.state.loop_guard.record(action.kind(), &limits);

        if let Err(err) = LegalActions::validate(&self.state, player, &action) {
            warn!(%player, ?action, %err, "action refused");
            self.state.emit(GameEvent::Error {
                player: Some(player),
                message: err.to_string(),
            });
            if let Err(guard) = counted {
                return Err(self.abort(guard));
            }
            self.publish();
            return Err(err);
        }
        if let Err(err) = counted {
            return Err(self.abort(err));
        }
        self.state.record_action(player, action.clone());
        debug!(%player, ?action, "applying action");

        if let Err(err) = self.execute(player, action).await {
            return Err(self.abort(err));
        }
        if let Err(err) = EffectSystem::resolve_stack(&mut self.state, &self.gate).await {
            return Err(self.abort(err));
        }
        self.check_win();
        self.publish();
        Ok(())
    }

    /// Play a card from `player`'s hand.
    pub async fn play_card(&mut self, player: PlayerId, card: EntityId) -> Result<()> {
        self.apply_action(player, GameAction::PlayCard { card }).await
    }

    async fn execute(&mut self, player: PlayerId, action: GameAction) -> Result<()> {
        match action {
            GameAction::PlayCard { card } => self.put_into_play(player, card),

            GameAction::GiveDon { target } => {
                let don = ZoneManager::active_don(&self.state, player)
                    .first()
                    .copied()
                    .ok_or(EngineError::InsufficientCost {
                        required: 1,
                        available: 0,
                    })?;
                ZoneManager::attach_don(&mut self.state, don, target)?;
                self.state.emit(GameEvent::DonGiven { player, don, target });
                Ok(())
            }

            GameAction::DeclareAttack { attacker, target } => {
                let outcome =
                    BattleResolver::attack(&mut self.state, &self.gate, attacker, target).await?;
                debug!(%attacker, %target, ?outcome, "battle finished");
                Ok(())
            }

            GameAction::ActivateEffect { card, effect } => {
                EffectSystem::activate_effect(&mut self.state, player, card, effect)?;
                Ok(())
            }

            GameAction::PassPriority | GameAction::EndPhase => Ok(()),
        }
    }

    fn put_into_play(&mut self, player: PlayerId, card: EntityId) -> Result<()> {
        let def = self
            .state
            .definition_of(card)
            .cloned()
            .ok_or_else(|| EngineError::IllegalAction(format!("unknown card {card}")))?;

        if !CostPayment::pay(&mut self.state, &CostExpr::RestDon(def.cost), player, None) {
            return Err(EngineError::InsufficientCost {
                required: def.cost,
                available: ZoneManager::active_don(&self.state, player).len() as u32,
            });
        }

        let zone = match def.category {
            CardCategory::Character => Zone::Character,
            CardCategory::Stage => Zone::Stage,
            CardCategory::Event => Zone::Trash,
            CardCategory::Leader | CardCategory::Don => {
                return Err(EngineError::IllegalAction(format!(
                    "{:?} cards cannot be played",
                    def.category
                )))
            }
        };
        ZoneManager::move_card(&mut self.state, card, Zone::Hand, zone, player, ZonePosition::Top)?;
        self.state.emit(GameEvent::CardPlayed { player, card, zone });
        debug!(%player, %card, name = %def.name, ?zone, "card played");

        if def.category == CardCategory::Event {
            for effect in def.activated_effects(ActivationWindow::Main) {
                EffectSystem::enqueue_effect(
                    &mut self.state,
                    effect.clone(),
                    card,
                    player,
                    EffectOrigin::Activated,
                );
            }
        }
        Ok(())
    }

    // === Helpers ===

    fn enter_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        let player = self.state.active_player;
        self.state.emit(GameEvent::PhaseChanged { player, phase });
        debug!(turn = self.state.turn, %player, ?phase, "phase");
    }

    /// Drain the stack, then check for a winner and publish.
    async fn settle(&mut self) -> Result<()> {
        if let Err(err) = EffectSystem::resolve_stack(&mut self.state, &self.gate).await {
            return Err(self.abort(err));
        }
        self.check_win();
        self.publish();
        Ok(())
    }

    /// Draw up to `count`, stopping at an empty deck.
    fn draw_cards(&mut self, player: PlayerId, count: usize) -> Result<()> {
        for _ in 0..count {
            if self.state.player(player).deck().is_empty() {
                break;
            }
            ZoneManager::draw(&mut self.state, player)?;
        }
        Ok(())
    }

    /// End the game if a player has no life left or decked out.
    fn check_win(&mut self) {
        if self.state.is_game_over() || !self.state.started {
            return;
        }
        let lost = |board: &PlayerState| {
            board.life().is_empty() || board.flag(FLAG_DECKED_OUT) != 0
        };
        let losers: Vec<PlayerId> = PlayerId::all()
            .filter(|&p| lost(self.state.player(p)))
            .collect();

        let (result, winner) = match losers.as_slice() {
            [] => return,
            [loser] => (GameResult::Winner(loser.opponent()), Some(loser.opponent())),
            _ => (GameResult::Draw, None),
        };
        let reason = if losers
            .iter()
            .any(|&p| self.state.player(p).life().is_empty())
        {
            GameOverReason::LifeDepleted
        } else {
            GameOverReason::DeckedOut
        };
        self.finish(result, winner, reason);
    }

    fn finish(&mut self, result: GameResult, winner: Option<PlayerId>, reason: GameOverReason) {
        self.state.game_over = true;
        self.state.winner = winner;
        self.state.result = Some(result);
        self.state.phase = Phase::GameOver;
        self.state.battle = None;
        self.state.stack.clear();
        self.state.emit(GameEvent::GameOver { winner, reason });
        info!(?result, ?reason, turn = self.state.turn, "game over");
    }

    /// End the match abnormally on a loop-guard trip. Other errors are
    /// passed through untouched.
    fn abort(&mut self, err: EngineError) -> EngineError {
        if matches!(err, EngineError::LoopGuardExceeded { .. }) && !self.state.is_game_over() {
            error!(%err, turn = self.state.turn, "match aborted");
            self.finish(GameResult::Aborted, None, GameOverReason::LoopGuard);
        }
        self.publish();
        err
    }

    fn publish(&mut self) {
        self.bus.publish(&self.state.events);
    }
}
