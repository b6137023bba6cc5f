//! Trigger registry.
//!
//! Every auto effect of every card instance is registered once, when the
//! instance is created. Matching is then gated on where the source currently
//! is: in play for most timings, in the trash for [On K.O.]. Life triggers
//! are not registered here; the battle resolver offers them directly.
//!
//! ## Ordering
//!
//! `find_triggers` returns matches for one event in resolution order:
//! the active player's effects before the opponent's; for one controller,
//! by board position (leader, characters left to right, stage, with a K.O.'d
//! subject first), then by effect index on the card.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::condition::ConditionEvaluator;
use super::event::{EventRecord, GameEvent};
use crate::cards::{CardDefinition, CardInstance};
use crate::core::{EntityId, GameState, Phase, PlayerId, Zone};
use crate::effects::{EffectDefinition, EffectId, TriggerTiming};

/// Unique identifier for a registered trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// One auto effect of one card instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTrigger {
    pub source: EntityId,
    pub effect: EffectId,
    /// Position of the effect on its card.
    pub effect_index: usize,
    pub timing: TriggerTiming,
}

/// A trigger that fired for an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    pub trigger: TriggerId,
    pub source: EntityId,
    pub controller: PlayerId,
    pub effect: EffectDefinition,
    pub effect_index: usize,
    /// Sequence number of the triggering event.
    pub seq: u64,
}

/// Registry of auto effects, indexed by timing.
#[derive(Clone, Debug, Default)]
pub struct TriggerRegistry {
    triggers: Vec<RegisteredTrigger>,
    by_timing: FxHashMap<TriggerTiming, Vec<TriggerId>>,
}

impl TriggerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger, returning its id.
    pub fn register(&mut self, trigger: RegisteredTrigger) -> TriggerId {
        let id = TriggerId::new(self.triggers.len() as u32);
        self.by_timing.entry(trigger.timing).or_default().push(id);
        self.triggers.push(trigger);
        id
    }

    /// Register every auto effect of a freshly created instance.
    ///
    /// Returns the number of triggers added.
    pub fn register_card(&mut self, instance: &CardInstance, definition: &CardDefinition) -> usize {
        let mut added = 0;
        for (index, effect, timing) in definition.auto_effects() {
            if timing == TriggerTiming::LifeTrigger {
                continue;
            }
            self.register(RegisteredTrigger {
                source: instance.entity_id,
                effect: effect.id,
                effect_index: index,
                timing,
            });
            added += 1;
        }
        added
    }

    #[must_use]
    pub fn get(&self, id: TriggerId) -> Option<&RegisteredTrigger> {
        self.triggers.get(id.0 as usize)
    }

    /// Triggers whose source is `source`.
    pub fn for_source(&self, source: EntityId) -> impl Iterator<Item = &RegisteredTrigger> {
        self.triggers.iter().filter(move |t| t.source == source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Find every trigger raised by one logged event, in resolution order.
    #[must_use]
    pub fn find_triggers(&self, state: &GameState, record: &EventRecord) -> Vec<TriggerMatch> {
        let mut matches = Vec::new();
        match &record.event {
            GameEvent::CardPlayed { card, .. } => {
                self.collect(state, record, TriggerTiming::OnPlay, &mut matches, |t, _| {
                    t.source == *card
                });
            }
            GameEvent::AttackDeclared {
                player, attacker, ..
            } => {
                self.collect(state, record, TriggerTiming::WhenAttacking, &mut matches, |t, _| {
                    t.source == *attacker
                });
                let defender = player.opponent();
                self.collect(
                    state,
                    record,
                    TriggerTiming::OnOpponentAttack,
                    &mut matches,
                    |_, controller| controller == defender,
                );
            }
            GameEvent::BlockDeclared { blocker, .. } => {
                self.collect(state, record, TriggerTiming::OnBlock, &mut matches, |t, _| {
                    t.source == *blocker
                });
            }
            GameEvent::CardKo { card, .. } => {
                self.collect(state, record, TriggerTiming::OnKo, &mut matches, |t, _| {
                    t.source == *card
                });
            }
            GameEvent::TurnStarted { player, .. } => {
                self.collect(
                    state,
                    record,
                    TriggerTiming::StartOfTurn,
                    &mut matches,
                    |_, controller| controller == *player,
                );
            }
            GameEvent::PhaseChanged {
                player,
                phase: Phase::End,
            } => {
                self.collect(
                    state,
                    record,
                    TriggerTiming::EndOfTurn,
                    &mut matches,
                    |_, controller| controller == *player,
                );
            }
            _ => {}
        }

        let active = state.active_player();
        matches.sort_by_key(|m| {
            (
                m.controller != active,
                board_rank(state, m.source),
                m.effect_index,
            )
        });
        matches
    }

    fn collect(
        &self,
        state: &GameState,
        record: &EventRecord,
        timing: TriggerTiming,
        out: &mut Vec<TriggerMatch>,
        filter: impl Fn(&RegisteredTrigger, PlayerId) -> bool,
    ) {
        let Some(ids) = self.by_timing.get(&timing) else {
            return;
        };

        for &id in ids {
            let Some(trigger) = self.get(id) else {
                continue;
            };
            let Some(card) = state.card(trigger.source) else {
                continue;
            };

            let in_zone = match timing {
                TriggerTiming::OnKo => card.zone == Zone::Trash,
                _ => card.is_in_play(),
            };
            if !in_zone || !filter(trigger, card.controller) {
                continue;
            }

            let Some(effect) = state
                .definition_of(trigger.source)
                .and_then(|def| def.effect(trigger.effect))
            else {
                continue;
            };
            if effect.once_per_turn && card.used_effect(effect.id) {
                continue;
            }
            if let Some(condition) = &effect.condition {
                if !ConditionEvaluator::evaluate(condition, state, card.controller, trigger.source) {
                    continue;
                }
            }

            out.push(TriggerMatch {
                trigger: id,
                source: trigger.source,
                controller: card.controller,
                effect: effect.clone(),
                effect_index: trigger.effect_index,
                seq: record.seq,
            });
        }
    }
}

/// Position of a card on its controller's board, lowest first.
fn board_rank(state: &GameState, card: EntityId) -> usize {
    let Some(instance) = state.card(card) else {
        return usize::MAX;
    };
    match instance.zone {
        Zone::Trash | Zone::Leader => 0,
        Zone::Character => {
            let characters = state.player(instance.controller).characters();
            1 + characters
                .iter()
                .position(|&id| id == card)
                .unwrap_or(characters.len())
        }
        Zone::Stage => 100,
        _ => 1000,
    }
}
