//! The effect system: raising triggers, activating effects, draining the stack.
//!
//! ## Flow
//!
//! 1. Something appends events to the log.
//! 2. `collect` scans the log from its cursor; the triggers raised by one
//!    event become one batch, flushed onto the stack.
//! 3. `resolve_stack` pops the top instance, resolves it, emits exactly one
//!    `EffectResolved`, collects triggers raised meanwhile, and repeats
//!    until the stack is empty.
//!
//! Resolving one instance re-checks its condition, pays its cost, asks for
//! targets and values through the decision gate, then runs its body.

use tracing::{debug, warn};

use super::cost::CostPayment;
use super::effect::{
    ActivationWindow, EffectDefinition, EffectId, EffectInstance, EffectInstanceId, EffectOrigin,
    EffectTiming,
};
use super::resolver::EffectHandlers;
use crate::core::{ActionKind, EntityId, GameState, PlayerId};
use crate::decision::DecisionGate;
use crate::error::{EngineError, Result};
use crate::triggers::{ConditionEvaluator, GameEvent, ResolutionOutcome};
use crate::zones::ZoneManager;

/// Entry points of the effect system.
pub struct EffectSystem;

impl EffectSystem {
    /// Queue an instance for the next flush and announce it.
    pub fn enqueue_trigger(state: &mut GameState, instance: EffectInstance) {
        state.emit(GameEvent::EffectTriggered {
            instance: instance.id,
            source: instance.source,
            controller: instance.controller,
        });
        debug!(
            instance = %instance.id,
            source = %instance.source,
            effect = instance.label(),
            "effect queued"
        );
        state.stack.queue(instance);
    }

    /// Create and queue a fresh instance of `definition`.
    pub fn enqueue_effect(
        state: &mut GameState,
        definition: EffectDefinition,
        source: EntityId,
        controller: PlayerId,
        origin: EffectOrigin,
    ) -> EffectInstanceId {
        let id = state.alloc_effect_id();
        Self::enqueue_trigger(
            state,
            EffectInstance::new(id, definition, source, controller, origin),
        );
        id
    }

    /// Scan unseen events for triggers, flushing one batch per event.
    ///
    /// Returns the number of instances raised.
    pub fn collect(state: &mut GameState) -> usize {
        let mut raised = 0;
        while state.trigger_cursor < state.events.len() {
            let Some(record) = state.events.get(state.trigger_cursor).cloned() else {
                break;
            };
            state.trigger_cursor += 1;

            let matches = state.triggers.find_triggers(state, &record);
            if matches.is_empty() {
                continue;
            }
            for m in matches {
                let id = state.alloc_effect_id();
                let instance =
                    EffectInstance::new(id, m.effect, m.source, m.controller, EffectOrigin::Triggered)
                        .triggered_by(m.seq);
                Self::enqueue_trigger(state, instance);
                raised += 1;
            }
            state.stack.flush(state.active_player);
        }
        raised
    }

    /// Resolve until both the stack and the pending queue are empty.
    ///
    /// Only the loop guard can make this fail.
    pub async fn resolve_stack(state: &mut GameState, gate: &DecisionGate) -> Result<()> {
        Self::collect(state);
        state.stack.flush(state.active_player);

        while let Some(instance) = state.stack.pop() {
            state
                .loop_guard
                .record(ActionKind::EffectResolution, &state.config.loop_guard)?;

            let id = instance.id;
            let source = instance.source;
            let outcome = Self::resolve_one(state, gate, instance).await;
            debug!(instance = %id, %source, ?outcome, "effect resolved");
            state.emit(GameEvent::EffectResolved {
                instance: id,
                source,
                outcome,
            });

            Self::collect(state);
            state.stack.flush(state.active_player);
        }
        Ok(())
    }

    async fn resolve_one(
        state: &mut GameState,
        gate: &DecisionGate,
        mut instance: EffectInstance,
    ) -> ResolutionOutcome {
        let controller = instance.controller;
        let source = instance.source;

        if let Some(condition) = &instance.definition.condition {
            if !ConditionEvaluator::evaluate(condition, state, controller, source) {
                return ResolutionOutcome::Fizzled;
            }
        }

        if let Some(cost) = &instance.definition.cost {
            if !CostPayment::pay(state, cost, controller, Some(source)) {
                return ResolutionOutcome::CostUnpaid;
            }
        }

        if let Some(spec) = instance.definition.kind.target_spec().cloned() {
            let mut remaining = spec.candidates(state, controller, source);
            if remaining.is_empty() {
                return ResolutionOutcome::Fizzled;
            }
            for _ in 0..spec.count {
                let Some(choice) = gate.choose_target(state, &remaining, &instance).await else {
                    break;
                };
                instance.targets.push(choice);
                remaining.retain(|&c| c != choice);
            }
        }

        if let Some(options) = instance.definition.kind.value_options() {
            instance.chosen_value = gate.choose_value(state, &options, &instance).await;
        }

        if let Err(err) = EffectHandlers::execute(state, &instance) {
            warn!(instance = %instance.id, %source, %err, "effect failed and fizzles");
            return ResolutionOutcome::Failed(err.to_string());
        }

        if instance.definition.once_per_turn {
            if let Some(card) = state.card_mut(source) {
                card.mark_effect_used(instance.definition.id);
            }
        }
        ResolutionOutcome::Resolved
    }

    /// Validate a main-window activation without changing anything.
    ///
    /// The source must be in play under `player`'s control. Events in hand
    /// are not sources: their main effect runs by playing the card, which
    /// pays its DON!! cost and trashes it. A once-per-turn effect must be
    /// unused, its condition must hold and its cost must be affordable.
    pub fn check_activation(
        state: &GameState,
        player: PlayerId,
        card: EntityId,
        effect: EffectId,
    ) -> Result<EffectDefinition> {
        let instance = state
            .card(card)
            .ok_or_else(|| EngineError::IllegalAction(format!("unknown card {card}")))?;
        let def = state
            .definition_of(card)
            .ok_or_else(|| EngineError::IllegalAction(format!("no definition for {card}")))?;

        if instance.controller != player || !instance.is_in_play() {
            return Err(EngineError::IllegalAction(format!(
                "{card} cannot activate effects from {:?}",
                instance.zone
            )));
        }

        let effect_def = def
            .effect(effect)
            .ok_or_else(|| EngineError::IllegalAction(format!("{card} has no {effect}")))?;
        if effect_def.timing != EffectTiming::Activated(ActivationWindow::Main) {
            return Err(EngineError::IllegalAction(format!(
                "{effect} of {card} is not a main-phase activation"
            )));
        }
        if effect_def.once_per_turn && instance.used_effect(effect) {
            return Err(EngineError::IllegalAction(format!(
                "{effect} of {card} was already used this turn"
            )));
        }
        if let Some(condition) = &effect_def.condition {
            if !ConditionEvaluator::evaluate(condition, state, player, card) {
                return Err(EngineError::IllegalAction(format!(
                    "condition of {effect} on {card} does not hold"
                )));
            }
        }
        if let Some(cost) = &effect_def.cost {
            if !CostPayment::can_pay(state, cost, player, Some(card)) {
                let required = cost.requirements().rest_don;
                let available = ZoneManager::active_don(state, player).len() as u32;
                return Err(if required > available {
                    EngineError::InsufficientCost {
                        required,
                        available,
                    }
                } else {
                    EngineError::IllegalAction(format!("cost of {effect} on {card} cannot be paid"))
                });
            }
        }
        Ok(effect_def.clone())
    }

    /// Validate and queue an activated main-window effect.
    pub fn activate_effect(
        state: &mut GameState,
        player: PlayerId,
        card: EntityId,
        effect: EffectId,
    ) -> Result<EffectInstanceId> {
        let definition = Self::check_activation(state, player, card, effect)?;
        Ok(Self::enqueue_effect(
            state,
            definition,
            card,
            player,
            EffectOrigin::Activated,
        ))
    }
}
