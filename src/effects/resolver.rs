//! Effect body execution.
//!
//! `EffectHandlers::execute` runs the body of an instance whose condition,
//! cost and choices have already been settled. Dispatch is an exhaustive
//! `match` on `EffectKind`; `Custom` bodies are looked up by name in the
//! game's `ScriptRegistry`, and a miss is an `EffectError` (the effect
//! fizzles, the game goes on).

use std::fmt;

use rustc_hash::FxHashMap;

use super::effect::{EffectInstance, EffectKind};
use crate::cards::{CardState, Expiry, Keyword, Modifier};
use crate::core::{EntityId, GameState, PlayerId, Zone};
use crate::error::EffectError;
use crate::triggers::GameEvent;
use crate::zones::{ZoneManager, ZonePosition};

/// A custom effect body.
pub type EffectScript = fn(&mut GameState, &EffectInstance) -> Result<(), EffectError>;

/// Name-keyed table of custom effect bodies.
///
/// ## Example
///
/// ```
/// use opcg_rules::effects::ScriptRegistry;
///
/// let scripts = ScriptRegistry::new().with_script("noop", |_, _| Ok(()));
/// assert!(scripts.contains("noop"));
/// assert!(scripts.get("missing").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: FxHashMap<String, EffectScript>,
}

impl ScriptRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script.
    ///
    /// Panics if the name is already registered.
    pub fn register(&mut self, name: impl Into<String>, script: EffectScript) {
        let name = name.into();
        if self.scripts.contains_key(&name) {
            panic!("Script '{}' already registered", name);
        }
        self.scripts.insert(name, script);
    }

    /// Register a script (builder pattern).
    #[must_use]
    pub fn with_script(mut self, name: impl Into<String>, script: EffectScript) -> Self {
        self.register(name, script);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<EffectScript> {
        self.scripts.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.scripts.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ScriptRegistry").field("scripts", &names).finish()
    }
}

/// Executes effect bodies.
pub struct EffectHandlers;

impl EffectHandlers {
    /// Run the body of `instance`.
    pub fn execute(state: &mut GameState, instance: &EffectInstance) -> Result<(), EffectError> {
        let controller = instance.controller;
        match &instance.definition.kind {
            EffectKind::Draw { count } => Self::draw(state, instance, *count as usize),

            EffectKind::DrawUpTo { max } => {
                let n = instance.chosen_value.unwrap_or(0).clamp(0, i64::from(*max));
                Self::draw(state, instance, n as usize)
            }

            EffectKind::PowerBoost { amount, expiry, .. } => {
                Self::modify_targets(state, instance, Modifier::power(*amount, *expiry))
            }

            EffectKind::GrantKeyword {
                keyword, expiry, ..
            } => Self::grant(state, instance, *keyword, *expiry),

            EffectKind::KoCharacter { .. } => {
                for &target in &instance.targets {
                    let (owner, zone) = Self::target_in_play(state, target)?;
                    if zone != Zone::Character {
                        return Err(EffectError::InvalidTarget(target));
                    }
                    ZoneManager::move_card(
                        state,
                        target,
                        Zone::Character,
                        Zone::Trash,
                        owner,
                        ZonePosition::Top,
                    )?;
                    state.emit(GameEvent::CardKo {
                        card: target,
                        owner,
                        by: Some(instance.source),
                    });
                }
                Ok(())
            }

            EffectKind::ReturnToHand { .. } => {
                for &target in &instance.targets {
                    let (owner, zone) = Self::target_in_play(state, target)?;
                    if zone == Zone::Leader {
                        return Err(EffectError::InvalidTarget(target));
                    }
                    ZoneManager::move_card(state, target, zone, Zone::Hand, owner, ZonePosition::Top)?;
                }
                Ok(())
            }

            EffectKind::RestTarget { .. } => {
                Self::orient_targets(state, instance, CardState::Rested)
            }

            EffectKind::SetActive { .. } => {
                Self::orient_targets(state, instance, CardState::Active)
            }

            EffectKind::AddDon { count, state: orientation } => {
                for _ in 0..*count {
                    let Some(don) = state.player(controller).don_deck().last().copied() else {
                        break;
                    };
                    ZoneManager::move_to_cost_area(state, don, Zone::DonDeck, controller, *orientation)?;
                    state.emit(GameEvent::DonAdded {
                        player: controller,
                        don,
                    });
                }
                Ok(())
            }

            EffectKind::AddLifeFromDeck { count } => {
                for _ in 0..*count {
                    let Some(card) = state.player(controller).deck().last().copied() else {
                        break;
                    };
                    ZoneManager::move_card(state, card, Zone::Deck, Zone::Life, controller, ZonePosition::Top)?;
                }
                Ok(())
            }

            EffectKind::Custom { script } => {
                let body = state
                    .scripts()
                    .get(script)
                    .ok_or_else(|| EffectError::UnknownScript(script.clone()))?;
                body(state, instance)
            }
        }
    }

    /// Draw up to `count`; an empty deck stops the draw without failing.
    fn draw(state: &mut GameState, instance: &EffectInstance, count: usize) -> Result<(), EffectError> {
        for _ in 0..count {
            if state.player(instance.controller).deck().is_empty() {
                break;
            }
            ZoneManager::draw(state, instance.controller)?;
        }
        Ok(())
    }

    /// Owner and zone of a target that must still be in play.
    fn target_in_play(state: &GameState, target: EntityId) -> Result<(PlayerId, Zone), EffectError> {
        match state.card(target) {
            Some(card) if card.is_in_play() => Ok((card.owner, card.zone)),
            _ => Err(EffectError::InvalidTarget(target)),
        }
    }

    fn modify_targets(
        state: &mut GameState,
        instance: &EffectInstance,
        modifier: Modifier,
    ) -> Result<(), EffectError> {
        for &target in &instance.targets {
            Self::target_in_play(state, target)?;
            if let Some(card) = state.card_mut(target) {
                card.modifiers.push(modifier.from_source(instance.source));
            }
        }
        Ok(())
    }

    fn grant(
        state: &mut GameState,
        instance: &EffectInstance,
        keyword: Keyword,
        expiry: Expiry,
    ) -> Result<(), EffectError> {
        Self::modify_targets(state, instance, Modifier::keyword(keyword, expiry))
    }

    fn orient_targets(
        state: &mut GameState,
        instance: &EffectInstance,
        orientation: CardState,
    ) -> Result<(), EffectError> {
        for &target in &instance.targets {
            Self::target_in_play(state, target)?;
            ZoneManager::set_card_state(state, target, orientation)?;
        }
        Ok(())
    }
}
