//! Main-phase legality.
//!
//! `enumerate` and `validate` are pure functions of the state. The engine
//! asks the player to choose from `enumerate` and re-checks the answer with
//! `validate` before applying it, so a refused action never mutates
//! anything.

use crate::battle::BattleResolver;
use crate::cards::CardCategory;
use crate::core::{EntityId, GameAction, GameState, Phase, PlayerId, Zone};
use crate::effects::{ActivationWindow, EffectSystem};
use crate::error::{EngineError, Result};
use crate::zones::ZoneManager;

/// Enumerates and validates main-phase actions.
pub struct LegalActions;

impl LegalActions {
    /// Every legal action for `player`, in a stable order: plays, DON!!
    /// gives, activations, attacks, then `EndPhase` and `PassPriority`.
    ///
    /// Empty unless `player` is in their main phase with no battle running.
    #[must_use]
    pub fn enumerate(state: &GameState, player: PlayerId) -> Vec<GameAction> {
        if Self::check_window(state, player).is_err() {
            return Vec::new();
        }
        let board = state.player(player);
        let mut actions = Vec::new();

        for &card in board.hand() {
            let action = GameAction::PlayCard { card };
            if Self::validate(state, player, &action).is_ok() {
                actions.push(action);
            }
        }

        let hosts: Vec<EntityId> = board
            .leader()
            .into_iter()
            .chain(board.characters().iter().copied())
            .collect();

        if !ZoneManager::active_don(state, player).is_empty() {
            actions.extend(hosts.iter().map(|&target| GameAction::GiveDon { target }));
        }

        let sources = hosts.iter().copied().chain(board.stage());
        for card in sources {
            let Some(def) = state.definition_of(card) else {
                continue;
            };
            for effect in def.activated_effects(ActivationWindow::Main) {
                if EffectSystem::check_activation(state, player, card, effect.id).is_ok() {
                    actions.push(GameAction::ActivateEffect {
                        card,
                        effect: effect.id,
                    });
                }
            }
        }

        for &attacker in &hosts {
            for target in BattleResolver::legal_attack_targets(state, attacker) {
                actions.push(GameAction::DeclareAttack { attacker, target });
            }
        }

        actions.push(GameAction::EndPhase);
        actions.push(GameAction::PassPriority);
        actions
    }

    /// Check one action. Never mutates.
    pub fn validate(state: &GameState, player: PlayerId, action: &GameAction) -> Result<()> {
        Self::check_window(state, player)?;

        match action {
            GameAction::PlayCard { card } => Self::validate_play(state, player, *card),

            GameAction::GiveDon { target } => {
                let available = ZoneManager::active_don(state, player).len() as u32;
                if available == 0 {
                    return Err(EngineError::InsufficientCost {
                        required: 1,
                        available,
                    });
                }
                match state.card(*target) {
                    Some(host)
                        if host.controller == player
                            && matches!(host.zone, Zone::Leader | Zone::Character) =>
                    {
                        Ok(())
                    }
                    _ => Err(EngineError::InvalidTarget {
                        target: *target,
                        reason: "DON!! can only be given to your leader or characters".into(),
                    }),
                }
            }

            GameAction::DeclareAttack { attacker, target } => {
                if !BattleResolver::can_attack(state, *attacker) {
                    return Err(EngineError::IllegalAction(format!("{attacker} cannot attack")));
                }
                if !BattleResolver::legal_attack_targets(state, *attacker).contains(target) {
                    return Err(EngineError::InvalidTarget {
                        target: *target,
                        reason: "not the opponent's leader or a rested opponent character".into(),
                    });
                }
                Ok(())
            }

            GameAction::ActivateEffect { card, effect } => {
                EffectSystem::check_activation(state, player, *card, *effect).map(|_| ())
            }

            GameAction::PassPriority | GameAction::EndPhase => Ok(()),
        }
    }

    fn check_window(state: &GameState, player: PlayerId) -> Result<()> {
        if state.is_game_over() {
            return Err(EngineError::IllegalAction("the game is over".into()));
        }
        if state.phase() != Phase::Main || state.active_player() != player {
            return Err(EngineError::IllegalAction(format!(
                "{player} cannot act in {:?} of {}",
                state.phase(),
                state.active_player()
            )));
        }
        if state.battle().is_some() {
            return Err(EngineError::IllegalAction("a battle is in progress".into()));
        }
        Ok(())
    }

    fn validate_play(state: &GameState, player: PlayerId, card: EntityId) -> Result<()> {
        let (Some(instance), Some(def)) = (state.card(card), state.definition_of(card)) else {
            return Err(EngineError::IllegalAction(format!("unknown card {card}")));
        };
        if instance.zone != Zone::Hand || instance.owner != player {
            return Err(EngineError::IllegalAction(format!(
                "{card} is not in {player}'s hand"
            )));
        }

        let available = ZoneManager::active_don(state, player).len() as u32;
        if def.cost > available {
            return Err(EngineError::InsufficientCost {
                required: def.cost,
                available,
            });
        }

        let board = state.player(player);
        match def.category {
            CardCategory::Character => {
                if board.characters().len() >= state.config().character_area_limit {
                    return Err(EngineError::ZoneCapacity {
                        zone: Zone::Character,
                        player,
                    });
                }
            }
            CardCategory::Stage => {
                if board.stage().is_some() {
                    return Err(EngineError::ZoneCapacity {
                        zone: Zone::Stage,
                        player,
                    });
                }
            }
            CardCategory::Event => {
                if def.activated_effects(ActivationWindow::Main).next().is_none() {
                    return Err(EngineError::IllegalAction(format!(
                        "{} has no main-phase effect",
                        def.name
                    )));
                }
            }
            CardCategory::Leader | CardCategory::Don => {
                return Err(EngineError::IllegalAction(format!(
                    "{:?} cards cannot be played",
                    def.category
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cards::{CardDefinition, CardId, CardRegistry, CardState};
    use crate::core::EngineConfig;

    fn state() -> (GameState, EntityId) {
        let registry = CardRegistry::new()
            .with_card(CardDefinition::leader(CardId::new(1), "Leader", 5000, 4))
            .with_card(CardDefinition::don(CardId::new(2)))
            .with_card(CardDefinition::character(CardId::new(3), "Deckhand", 2, 3000));
        let mut state = GameState::new(EngineConfig::default(), Arc::new(registry));
        let p0 = PlayerId::new(0);
        for p in PlayerId::all() {
            state.spawn_card(p, CardId::new(1), Zone::Leader, CardState::Active).unwrap();
        }
        let card = state.spawn_card(p0, CardId::new(3), Zone::Hand, CardState::None).unwrap();
        state.spawn_card(p0, CardId::new(2), Zone::CostArea, CardState::Active).unwrap();
        state.set_turn(3, p0, Phase::Main);
        (state, card)
    }

    #[test]
    fn test_enumerate_ends_with_phase_actions() {
        let (state, _) = state();
        let actions = LegalActions::enumerate(&state, PlayerId::new(0));
        let n = actions.len();
        assert_eq!(actions[n - 2], GameAction::EndPhase);
        assert_eq!(actions[n - 1], GameAction::PassPriority);
        assert!(LegalActions::enumerate(&state, PlayerId::new(1)).is_empty());
    }

    #[test]
    fn test_play_needs_enough_don() {
        let (state, card) = state();
        let err = LegalActions::validate(&state, PlayerId::new(0), &GameAction::PlayCard { card })
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientCost {
                required: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_unknown_card_is_illegal() {
        let (state, _) = state();
        let action = GameAction::PlayCard {
            card: EntityId::new(999),
        };
        assert!(matches!(
            LegalActions::validate(&state, PlayerId::new(0), &action),
            Err(EngineError::IllegalAction(_))
        ));
    }
}
