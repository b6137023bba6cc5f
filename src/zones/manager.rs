//! Zone manager: the only code that moves card instances between zones.
//!
//! A move either fully succeeds or fails validation without touching the
//! state. On success the card is removed from its source sequence, inserted
//! into the destination at the requested position, the entry rules below are
//! applied, and exactly one `CardMoved` event is emitted for it.
//!
//! ## Entry rules
//!
//! - Leader/character/stage: ACTIVE, controlled by the moving player
//! - Cost area: the requested orientation (ACTIVE unless stated)
//! - Any zone outside play: modifiers and per-turn flags cleared,
//!   controller reset to owner, attached DON!! returned RESTED to their
//!   owner's cost area (each with its own `CardMoved`)
//! - Life: face-down
//!
//! Orientation is NONE everywhere except the cost area and play zones.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::cards::{CardState, TurnFlags};
use crate::core::{EntityId, GameState, PlayerId, Zone};
use crate::error::ZoneError;
use crate::triggers::GameEvent;

/// Position for inserting a card into an ordered zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Add to top of zone (end of the sequence).
    #[default]
    Top,
    /// Add to bottom of zone.
    Bottom,
    /// Insert at specific index (0 = bottom).
    Index(usize),
}

/// A completed move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneMove {
    pub card: EntityId,
    pub from: Zone,
    pub to: Zone,
    /// Holder of the destination zone.
    pub player: PlayerId,
    /// DON!! that were attached and went back to the cost area.
    pub returned_don: SmallVec<[EntityId; 4]>,
}

/// Moves cards between zones.
///
/// ## Usage
///
/// ```
/// use std::sync::Arc;
/// use opcg_rules::cards::{CardDefinition, CardId, CardRegistry, CardState};
/// use opcg_rules::core::{EngineConfig, GameState, PlayerId, Zone};
/// use opcg_rules::zones::{ZoneManager, ZonePosition};
///
/// let registry = CardRegistry::new()
///     .with_card(CardDefinition::character(CardId::new(1), "Deckhand", 1, 2000));
/// let mut state = GameState::new(EngineConfig::default(), Arc::new(registry));
/// let p = PlayerId::new(0);
/// let card = state.spawn_card(p, CardId::new(1), Zone::Hand, CardState::None).unwrap();
///
/// ZoneManager::move_card(&mut state, card, Zone::Hand, Zone::Character, p, ZonePosition::Top)
///     .unwrap();
///
/// assert_eq!(state.player(p).characters(), &[card]);
/// assert_eq!(state.card(card).map(|c| c.state), Some(CardState::Active));
/// ```
pub struct ZoneManager;

impl ZoneManager {
    /// Move `card` from `from` into `player`'s `to` zone.
    pub fn move_card(
        state: &mut GameState,
        card: EntityId,
        from: Zone,
        to: Zone,
        player: PlayerId,
        position: ZonePosition,
    ) -> Result<ZoneMove, ZoneError> {
        Self::transfer(state, card, from, to, player, position, None)
    }

    /// Move a card into the cost area with an explicit orientation.
    pub fn move_to_cost_area(
        state: &mut GameState,
        card: EntityId,
        from: Zone,
        player: PlayerId,
        orientation: CardState,
    ) -> Result<ZoneMove, ZoneError> {
        Self::transfer(
            state,
            card,
            from,
            Zone::CostArea,
            player,
            ZonePosition::Top,
            Some(orientation),
        )
    }

    fn transfer(
        state: &mut GameState,
        card: EntityId,
        from: Zone,
        to: Zone,
        player: PlayerId,
        position: ZonePosition,
        orientation: Option<CardState>,
    ) -> Result<ZoneMove, ZoneError> {
        let instance = state.card(card).ok_or(ZoneError::CardNotFound(card))?;
        if instance.zone != from {
            return Err(ZoneError::NotInZone {
                card,
                expected: from,
                actual: instance.zone,
            });
        }
        if to == Zone::Attached {
            return Err(ZoneError::InvalidDestination { card, zone: to });
        }
        if to.is_private() && instance.owner != player {
            return Err(ZoneError::WrongOwner {
                card,
                zone: to,
                player,
            });
        }

        let holder = instance.zone_holder();
        let attached_to = instance.attached_to;
        let moving_within = from == to && holder == player;
        if !moving_within && !state.player(player).has_room(to, state.config().character_area_limit) {
            return Err(ZoneError::Capacity { zone: to, player });
        }

        // Validation done; mutate.
        match (from, attached_to) {
            (Zone::Attached, Some(host)) => {
                if let Some(host) = state.card_mut(host) {
                    host.attached_don.retain(|d| *d != card);
                }
            }
            _ => {
                state.player_mut(holder).remove(from, card);
            }
        }

        let turn = state.turn();
        let leaving_play = from.is_in_play() && !to.is_in_play();
        let mut returned = SmallVec::new();
        if let Some(instance) = state.card_mut(card) {
            instance.zone = to;
            instance.attached_to = None;
            instance.face_down = to == Zone::Life;

            if to.is_in_play() {
                instance.controller = player;
                instance.state = CardState::Active;
                if !from.is_in_play() {
                    instance.entered_turn = Some(turn);
                }
            } else {
                instance.controller = if to == Zone::CostArea { player } else { instance.owner };
                instance.state = if to == Zone::CostArea {
                    orientation.unwrap_or(CardState::Active)
                } else {
                    CardState::None
                };
                instance.modifiers.clear();
                instance.flags = TurnFlags::default();
                instance.entered_turn = None;
                if leaving_play {
                    returned = std::mem::take(&mut instance.attached_don);
                }
            }
        }

        state.player_mut(player).insert(to, card, position);
        state.emit(GameEvent::CardMoved {
            card,
            from,
            to,
            player,
        });
        trace!(%card, ?from, ?to, %player, "card moved");

        for &don in &returned {
            Self::return_don(state, don);
        }

        Ok(ZoneMove {
            card,
            from,
            to,
            player,
            returned_don: returned,
        })
    }

    /// Put an attached DON!! back into its owner's cost area, rested.
    fn return_don(state: &mut GameState, don: EntityId) {
        let Some(instance) = state.card_mut(don) else {
            return;
        };
        let owner = instance.owner;
        instance.zone = Zone::CostArea;
        instance.state = CardState::Rested;
        instance.attached_to = None;
        instance.controller = owner;

        state.player_mut(owner).insert(Zone::CostArea, don, ZonePosition::Top);
        state.emit(GameEvent::CardMoved {
            card: don,
            from: Zone::Attached,
            to: Zone::CostArea,
            player: owner,
        });
    }

    /// Change orientation. Returns whether anything changed; a no-op change
    /// emits no event.
    pub fn set_card_state(
        state: &mut GameState,
        card: EntityId,
        new_state: CardState,
    ) -> Result<bool, ZoneError> {
        let instance = state.card_mut(card).ok_or(ZoneError::CardNotFound(card))?;
        if !instance.zone.tracks_orientation() || new_state == CardState::None {
            return Err(ZoneError::NoOrientation {
                card,
                zone: instance.zone,
            });
        }
        let old = instance.state;
        if old == new_state {
            return Ok(false);
        }
        instance.state = new_state;
        state.emit(GameEvent::CardStateChanged {
            card,
            from: old,
            to: new_state,
        });
        Ok(true)
    }

    /// Draw the top card of `player`'s deck into their hand.
    pub fn draw(state: &mut GameState, player: PlayerId) -> Result<EntityId, ZoneError> {
        let card = state
            .player(player)
            .deck()
            .last()
            .copied()
            .ok_or(ZoneError::EmptyZone {
                zone: Zone::Deck,
                player,
            })?;
        Self::move_card(state, card, Zone::Deck, Zone::Hand, player, ZonePosition::Top)?;
        state.emit(GameEvent::CardDrawn { player, card });
        Ok(card)
    }

    /// Attach an ACTIVE cost-area DON!! to a leader or character in play.
    pub fn attach_don(state: &mut GameState, don: EntityId, host: EntityId) -> Result<(), ZoneError> {
        let don_card = state.card(don).ok_or(ZoneError::CardNotFound(don))?;
        if don_card.zone != Zone::CostArea {
            return Err(ZoneError::NotInZone {
                card: don,
                expected: Zone::CostArea,
                actual: don_card.zone,
            });
        }
        if !don_card.is_active() {
            return Err(ZoneError::InvalidDestination {
                card: don,
                zone: Zone::Attached,
            });
        }
        let holder = don_card.zone_holder();

        let host_card = state.card(host).ok_or(ZoneError::CardNotFound(host))?;
        if !matches!(host_card.zone, Zone::Leader | Zone::Character) {
            return Err(ZoneError::InvalidDestination {
                card: host,
                zone: Zone::Attached,
            });
        }
        let host_controller = host_card.controller;

        state.player_mut(holder).remove(Zone::CostArea, don);
        if let Some(instance) = state.card_mut(don) {
            instance.zone = Zone::Attached;
            instance.state = CardState::None;
            instance.attached_to = Some(host);
        }
        if let Some(host_card) = state.card_mut(host) {
            host_card.attached_don.push(don);
        }
        state.emit(GameEvent::CardMoved {
            card: don,
            from: Zone::CostArea,
            to: Zone::Attached,
            player: host_controller,
        });
        trace!(%don, %host, "don attached");
        Ok(())
    }

    /// Return every DON!! attached to `player`'s leader and characters to
    /// the cost area, rested. Returns how many moved.
    pub fn return_attached_don(state: &mut GameState, player: PlayerId) -> usize {
        let board = state.player(player);
        let hosts: Vec<EntityId> = board
            .leader()
            .into_iter()
            .chain(board.characters().iter().copied())
            .collect();

        let mut moved = 0;
        for host in hosts {
            let dons = state
                .card_mut(host)
                .map(|c| std::mem::take(&mut c.attached_don))
                .unwrap_or_default();
            for don in dons {
                Self::return_don(state, don);
                moved += 1;
            }
        }
        moved
    }

    // === Queries ===

    /// Contents of one of `player`'s zones.
    #[must_use]
    pub fn zone_cards(state: &GameState, player: PlayerId, zone: Zone) -> &[EntityId] {
        state.player(player).zone(zone)
    }

    /// Cards in a zone with the given orientation.
    #[must_use]
    pub fn count_in_state(state: &GameState, player: PlayerId, zone: Zone, orientation: CardState) -> usize {
        Self::zone_cards(state, player, zone)
            .iter()
            .filter(|&&id| state.card(id).is_some_and(|c| c.state == orientation))
            .count()
    }

    /// ACTIVE DON!! in the cost area, in cost-area order.
    #[must_use]
    pub fn active_don(state: &GameState, player: PlayerId) -> Vec<EntityId> {
        state
            .player(player)
            .cost_area()
            .iter()
            .copied()
            .filter(|&id| state.card(id).is_some_and(|c| c.is_active()))
            .collect()
    }

    /// Every listed card, including attached DON!!.
    #[must_use]
    pub fn total_cards(state: &GameState) -> usize {
        let listed: usize = state
            .players
            .iter()
            .map(|(_, board)| {
                [
                    Zone::Deck,
                    Zone::Hand,
                    Zone::Trash,
                    Zone::Life,
                    Zone::DonDeck,
                    Zone::CostArea,
                    Zone::Leader,
                    Zone::Character,
                    Zone::Stage,
                ]
                .iter()
                .map(|&z| board.zone(z).len())
                .sum::<usize>()
            })
            .sum();
        let attached: usize = state.cards().map(|c| c.attached_don.len()).sum();
        listed + attached
    }
}
