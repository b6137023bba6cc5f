//! Battle resolver: attack declaration through damage.
//!
//! ```text
//! declare ──► [When Attacking / On Opponent's Attack]
//!    │
//!    ▼
//! block step ──► [On Block]
//!    │
//!    ▼
//! counter step (repeat until the defender passes)
//!    │
//!    ▼
//! damage step ──► K.O. / life damage / repelled
//!    │
//!    ▼
//! battle end (EndOfBattle modifiers expire)
//! ```
//!
//! The queries (`legal_attack_targets`, `legal_blockers`, `counter_options`,
//! `damage_outcome`) are pure and never touch the state.

use tracing::debug;

use super::{Battle, BattleOutcome, BattleStep};
use crate::cards::{CardCategory, CardState, Expiry, Keyword, Modifier};
use crate::core::{ActionKind, EntityId, GameState, Phase, PlayerId, Zone};
use crate::decision::{CounterAction, DecisionGate};
use crate::effects::{
    ActivationWindow, CostExpr, CostPayment, EffectInstance, EffectOrigin, EffectSystem,
};
use crate::error::{EngineError, Result};
use crate::triggers::{ConditionEvaluator, GameEvent};
use crate::zones::{ZoneManager, ZonePosition};

/// Runs battles.
pub struct BattleResolver;

impl BattleResolver {
    // === Queries ===

    /// Whether a card may declare an attack right now.
    #[must_use]
    pub fn can_attack(state: &GameState, attacker: EntityId) -> bool {
        if state.is_game_over() || state.phase() != Phase::Main || state.battle().is_some() {
            return false;
        }
        if state.is_first_turn() && !state.config().allow_first_turn_attacks {
            return false;
        }
        let Some(card) = state.card(attacker) else {
            return false;
        };
        if !matches!(card.zone, Zone::Leader | Zone::Character)
            || card.controller != state.active_player()
            || !card.is_active()
        {
            return false;
        }

        let summoning_sick = card.zone == Zone::Character
            && card.entered_turn == Some(state.turn())
            && !state.has_keyword(attacker, Keyword::Rush);
        if summoning_sick {
            return false;
        }

        let limit = if state.has_keyword(attacker, Keyword::ExtraAttack) { 2 } else { 1 };
        card.flags.attacks_made < limit
    }

    /// Legal targets for `attacker`: the opponent's leader, then the
    /// opponent's RESTED characters. Empty if the card cannot attack.
    #[must_use]
    pub fn legal_attack_targets(state: &GameState, attacker: EntityId) -> Vec<EntityId> {
        if !Self::can_attack(state, attacker) {
            return Vec::new();
        }
        let opponent = state.active_player().opponent();
        let board = state.player(opponent);

        let mut targets: Vec<EntityId> = board.leader().into_iter().collect();
        targets.extend(
            board
                .characters()
                .iter()
                .copied()
                .filter(|&id| state.card(id).is_some_and(|c| c.is_rested())),
        );
        targets
    }

    /// Characters of the target's controller that may block: ACTIVE, with
    /// Blocker, and not the current target. Empty against Unblockable.
    #[must_use]
    pub fn legal_blockers(state: &GameState, attacker: EntityId, target: EntityId) -> Vec<EntityId> {
        if state.has_keyword(attacker, Keyword::Unblockable) {
            return Vec::new();
        }
        let Some(defender) = state.card(target).map(|c| c.controller) else {
            return Vec::new();
        };
        state
            .player(defender)
            .characters()
            .iter()
            .copied()
            .filter(|&id| id != target)
            .filter(|&id| {
                state.card(id).is_some_and(|c| c.is_active())
                    && state.has_keyword(id, Keyword::Blocker)
            })
            .collect()
    }

    /// Counter actions available to `player` during the current battle, in
    /// hand order.
    #[must_use]
    pub fn counter_options(state: &GameState, player: PlayerId) -> Vec<CounterAction> {
        let Some(battle) = state.battle() else {
            return Vec::new();
        };
        if battle.defending_player != player {
            return Vec::new();
        }

        let mut options = Vec::new();
        for &card in state.player(player).hand() {
            let Some(def) = state.definition_of(card) else {
                continue;
            };
            if def.counter > 0 {
                options.push(CounterAction::UseCounter { card });
            }
            if def.category != CardCategory::Event {
                continue;
            }
            if !CostPayment::can_pay(state, &CostExpr::RestDon(def.cost), player, None) {
                continue;
            }
            for effect in def.activated_effects(ActivationWindow::Counter) {
                let holds = effect
                    .condition
                    .as_ref()
                    .map_or(true, |c| ConditionEvaluator::evaluate(c, state, player, card));
                if holds {
                    options.push(CounterAction::PlayCounterEvent {
                        card,
                        effect: effect.id,
                    });
                }
            }
        }
        options
    }

    /// Whether an attack with `attacker_power` hits a target with
    /// `defender_power`.
    ///
    /// ```
    /// use opcg_rules::battle::BattleResolver;
    ///
    /// assert!(BattleResolver::damage_outcome(5000, 5000));
    /// assert!(!BattleResolver::damage_outcome(4000, 5000));
    /// ```
    #[must_use]
    pub const fn damage_outcome(attacker_power: i64, defender_power: i64) -> bool {
        attacker_power >= defender_power
    }

    // === Battle ===

    /// Run a whole battle. Declaration errors leave the state untouched.
    pub async fn attack(
        state: &mut GameState,
        gate: &DecisionGate,
        attacker: EntityId,
        target: EntityId,
    ) -> Result<BattleOutcome> {
        Self::declare(state, attacker, target)?;
        EffectSystem::resolve_stack(state, gate).await?;
        if Self::interrupted(state) {
            return Ok(Self::finish(state, BattleOutcome::Aborted));
        }

        Self::block_step(state, gate).await?;
        if Self::interrupted(state) {
            return Ok(Self::finish(state, BattleOutcome::Aborted));
        }

        Self::counter_step(state, gate).await?;
        if Self::interrupted(state) {
            return Ok(Self::finish(state, BattleOutcome::Aborted));
        }

        let outcome = Self::damage_step(state, gate).await?;
        Ok(Self::finish(state, outcome))
    }

    fn declare(state: &mut GameState, attacker: EntityId, target: EntityId) -> Result<()> {
        if !Self::can_attack(state, attacker) {
            return Err(EngineError::IllegalAction(format!("{attacker} cannot attack")));
        }
        if !Self::legal_attack_targets(state, attacker).contains(&target) {
            return Err(EngineError::InvalidTarget {
                target,
                reason: "not the opponent's leader or a rested opponent character".into(),
            });
        }

        let player = state.active_player();
        ZoneManager::set_card_state(state, attacker, CardState::Rested)?;
        if let Some(card) = state.card_mut(attacker) {
            card.flags.attacks_made += 1;
        }
        state.battle = Some(Battle::new(attacker, target, player));
        state.emit(GameEvent::AttackDeclared {
            player,
            attacker,
            target,
        });
        debug!(%player, %attacker, %target, "attack declared");
        Ok(())
    }

    /// Attacker or current target left play.
    fn interrupted(state: &GameState) -> bool {
        let Some(battle) = state.battle() else {
            return true;
        };
        let in_play = |id| state.card(id).is_some_and(|c| c.is_in_play());
        !in_play(battle.attacker) || !in_play(battle.target)
    }

    fn set_step(state: &mut GameState, step: BattleStep) {
        if let Some(battle) = state.battle.as_mut() {
            battle.step = step;
        }
    }

    fn current(state: &GameState) -> Result<Battle> {
        state
            .battle()
            .cloned()
            .ok_or_else(|| EngineError::IllegalAction("no battle in progress".into()))
    }

    async fn block_step(state: &mut GameState, gate: &DecisionGate) -> Result<()> {
        Self::set_step(state, BattleStep::BlockStep);
        let battle = Self::current(state)?;

        let blockers = Self::legal_blockers(state, battle.attacker, battle.target);
        if blockers.is_empty() {
            return Ok(());
        }
        let Some(blocker) = gate
            .choose_blocker(state, battle.defending_player, &blockers, battle.attacker)
            .await
        else {
            return Ok(());
        };

        ZoneManager::set_card_state(state, blocker, CardState::Rested)?;
        if let Some(current) = state.battle.as_mut() {
            current.target = blocker;
            current.blocked_by = Some(blocker);
        }
        state.emit(GameEvent::BlockDeclared {
            player: battle.defending_player,
            blocker,
            attacker: battle.attacker,
            original_target: battle.original_target,
        });
        debug!(%blocker, attacker = %battle.attacker, "block declared");
        EffectSystem::resolve_stack(state, gate).await
    }

    async fn counter_step(state: &mut GameState, gate: &DecisionGate) -> Result<()> {
        Self::set_step(state, BattleStep::CounterStep);
        let defender = Self::current(state)?.defending_player;

        loop {
            if Self::interrupted(state) {
                return Ok(());
            }
            let options = Self::counter_options(state, defender);
            if options.is_empty() {
                return Ok(());
            }
            let Some(action) = gate.choose_counter_action(state, defender, &options).await else {
                return Ok(());
            };
            state
                .loop_guard
                .record(ActionKind::CounterAction, &state.config.loop_guard)?;
            Self::apply_counter(state, gate, defender, action).await?;
        }
    }

    async fn apply_counter(
        state: &mut GameState,
        gate: &DecisionGate,
        player: PlayerId,
        action: CounterAction,
    ) -> Result<()> {
        let target = Self::current(state)?.target;
        match action {
            CounterAction::UseCounter { card } => {
                let amount = state.definition_of(card).map_or(0, |d| d.counter);
                ZoneManager::move_card(state, card, Zone::Hand, Zone::Trash, player, ZonePosition::Top)?;
                if let Some(target_card) = state.card_mut(target) {
                    target_card
                        .modifiers
                        .push(Modifier::power(amount, Expiry::EndOfBattle).from_source(card));
                }
                state.emit(GameEvent::CounterUsed {
                    player,
                    card,
                    target,
                    amount,
                });
                debug!(%player, %card, %target, amount, "counter used");
                Ok(())
            }
            CounterAction::PlayCounterEvent { card, effect } => {
                let Some(def) = state.definition_of(card) else {
                    return Err(EngineError::IllegalAction(format!("no definition for {card}")));
                };
                let cost = def.cost;
                let Some(effect_def) = def.effect(effect).cloned() else {
                    return Err(EngineError::IllegalAction(format!("{card} has no {effect}")));
                };

                if !CostPayment::pay(state, &CostExpr::RestDon(cost), player, None) {
                    return Err(EngineError::InsufficientCost {
                        required: cost,
                        available: ZoneManager::active_don(state, player).len() as u32,
                    });
                }
                ZoneManager::move_card(state, card, Zone::Hand, Zone::Trash, player, ZonePosition::Top)?;
                state.emit(GameEvent::CounterUsed {
                    player,
                    card,
                    target,
                    amount: 0,
                });
                EffectSystem::enqueue_effect(state, effect_def, card, player, EffectOrigin::Counter);
                EffectSystem::resolve_stack(state, gate).await
            }
        }
    }

    async fn damage_step(state: &mut GameState, gate: &DecisionGate) -> Result<BattleOutcome> {
        Self::set_step(state, BattleStep::DamageStep);
        let battle = Self::current(state)?;

        let attacker_power = state.power_of(battle.attacker);
        let defender_power = state.power_of(battle.target);
        if !Self::damage_outcome(attacker_power, defender_power) {
            debug!(attacker_power, defender_power, "attack repelled");
            return Ok(BattleOutcome::Repelled);
        }

        let target_zone = state.card(battle.target).map(|c| c.zone);
        if target_zone == Some(Zone::Character) {
            let owner = state
                .card(battle.target)
                .map_or(battle.defending_player, |c| c.owner);
            ZoneManager::move_card(
                state,
                battle.target,
                Zone::Character,
                Zone::Trash,
                owner,
                ZonePosition::Top,
            )?;
            state.emit(GameEvent::CardKo {
                card: battle.target,
                owner,
                by: Some(battle.attacker),
            });
            EffectSystem::resolve_stack(state, gate).await?;
            return Ok(BattleOutcome::TargetKo);
        }

        let hits = if state.has_keyword(battle.attacker, Keyword::DoubleAttack) { 2 } else { 1 };
        let banish = state.has_keyword(battle.attacker, Keyword::Banish);
        let mut dealt = 0;
        for _ in 0..hits {
            if !Self::take_life(state, gate, battle.defending_player, banish).await? {
                break;
            }
            dealt += 1;
        }
        Ok(BattleOutcome::LifeDamage { amount: dealt })
    }

    /// Remove the top life card of `player`. Returns false if there was none.
    async fn take_life(
        state: &mut GameState,
        gate: &DecisionGate,
        player: PlayerId,
        banish: bool,
    ) -> Result<bool> {
        let Some(card) = state.player(player).life().last().copied() else {
            return Ok(false);
        };

        let trigger = if banish {
            None
        } else {
            state.definition_of(card).and_then(|d| d.life_trigger()).cloned()
        };

        let activated = match trigger {
            Some(definition) => {
                let id = state.alloc_effect_id();
                let instance = EffectInstance::new(id, definition, card, player, EffectOrigin::Life);
                let activate = gate.choose_value(state, &[1, 0], &instance).await == Some(1);
                if activate {
                    EffectSystem::enqueue_trigger(state, instance);
                    EffectSystem::resolve_stack(state, gate).await?;
                }
                activate
            }
            None => false,
        };

        let destination = if banish || activated { Zone::Trash } else { Zone::Hand };
        if state.card(card).is_some_and(|c| c.zone == Zone::Life) {
            ZoneManager::move_card(state, card, Zone::Life, destination, player, ZonePosition::Top)?;
        }
        let remaining = state.player(player).life().len();
        state.emit(GameEvent::LifeDamage {
            player,
            card,
            remaining,
        });
        debug!(%player, %card, remaining, activated, "life damage");
        Ok(true)
    }

    fn finish(state: &mut GameState, outcome: BattleOutcome) -> BattleOutcome {
        Self::set_step(state, BattleStep::BattleEnd);
        for card in state.cards.iter_mut() {
            card.expire(Expiry::EndOfBattle);
        }
        if let Some(battle) = state.battle.take() {
            state.emit(GameEvent::BattleEnd {
                attacker: battle.attacker,
                defender: battle.target,
                outcome,
            });
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_outcome_ties_hit() {
        assert!(BattleResolver::damage_outcome(0, 0));
        assert!(BattleResolver::damage_outcome(6000, 5000));
        assert!(!BattleResolver::damage_outcome(-1000, 0));
    }
}
