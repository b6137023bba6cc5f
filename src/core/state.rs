//! Game state: every card instance, every zone, and the bookkeeping around them.
//!
//! ## PlayerState
//!
//! One player's named zones. Sequences are ordered bottom to top (the top of
//! the deck and of life is the last element); leader and stage are single
//! slots. A small flag map carries transient markers such as `decked_out`.
//!
//! ## GameState
//!
//! - Turn, phase, active player
//! - Card instances, indexed by `EntityId`
//! - Pending-trigger queue and resolution stack
//! - Action history, event log, loop-guard counters
//! - The battle in progress, if any
//! - Seeded RNG and the shared registry/config
//!
//! Mutation of zones goes through `ZoneManager`; this module only exposes
//! the crate-internal plumbing it needs.

use std::sync::Arc;

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::action::{ActionRecord, GameAction, LoopGuard};
use super::config::{EngineConfig, Phase, Zone};
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;
use crate::battle::Battle;
use crate::cards::{CardDefinition, CardId, CardInstance, CardRegistry, CardState, DeckList, Keyword};
use crate::effects::{EffectInstanceId, ScriptRegistry};
use crate::error::{EngineError, Result, ZoneError};
use crate::rules::GameResult;
use crate::stack::EffectStack;
use crate::triggers::{EventLog, GameEvent, TriggerRegistry};
use crate::zones::ZonePosition;

/// Flag set when a player had to draw from an empty deck.
pub const FLAG_DECKED_OUT: &str = "decked_out";

/// Flag set when a player took a mulligan.
pub const FLAG_MULLIGANED: &str = "mulliganed";

/// One player's zones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub(crate) deck: Vec<EntityId>,
    pub(crate) hand: Vec<EntityId>,
    pub(crate) trash: Vec<EntityId>,
    pub(crate) life: Vec<EntityId>,
    pub(crate) don_deck: Vec<EntityId>,
    pub(crate) cost_area: Vec<EntityId>,
    pub(crate) leader: Option<EntityId>,
    pub(crate) characters: Vec<EntityId>,
    pub(crate) stage: Option<EntityId>,
    pub(crate) flags: FxHashMap<String, i64>,
}

impl PlayerState {
    #[must_use]
    pub fn deck(&self) -> &[EntityId] {
        &self.deck
    }

    #[must_use]
    pub fn hand(&self) -> &[EntityId] {
        &self.hand
    }

    #[must_use]
    pub fn trash(&self) -> &[EntityId] {
        &self.trash
    }

    /// Life cards, bottom first.
    #[must_use]
    pub fn life(&self) -> &[EntityId] {
        &self.life
    }

    #[must_use]
    pub fn don_deck(&self) -> &[EntityId] {
        &self.don_deck
    }

    #[must_use]
    pub fn cost_area(&self) -> &[EntityId] {
        &self.cost_area
    }

    #[must_use]
    pub fn leader(&self) -> Option<EntityId> {
        self.leader
    }

    /// Characters, left to right.
    #[must_use]
    pub fn characters(&self) -> &[EntityId] {
        &self.characters
    }

    #[must_use]
    pub fn stage(&self) -> Option<EntityId> {
        self.stage
    }

    /// Contents of a zone. `Zone::Attached` is tracked on the hosts and is
    /// always empty here.
    #[must_use]
    pub fn zone(&self, zone: Zone) -> &[EntityId] {
        match zone {
            Zone::Deck => &self.deck,
            Zone::Hand => &self.hand,
            Zone::Trash => &self.trash,
            Zone::Life => &self.life,
            Zone::DonDeck => &self.don_deck,
            Zone::CostArea => &self.cost_area,
            Zone::Leader => self.leader.as_slice(),
            Zone::Character => &self.characters,
            Zone::Stage => self.stage.as_slice(),
            Zone::Attached => &[],
        }
    }

    /// Get a flag value (0 when unset).
    #[must_use]
    pub fn flag(&self, key: &str) -> i64 {
        self.flags.get(key).copied().unwrap_or(0)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: i64) {
        self.flags.insert(key.into(), value);
    }

    /// Whether a card can be inserted without exceeding the zone's capacity.
    pub(crate) fn has_room(&self, zone: Zone, character_limit: usize) -> bool {
        match zone {
            Zone::Leader => self.leader.is_none(),
            Zone::Stage => self.stage.is_none(),
            Zone::Character => self.characters.len() < character_limit,
            _ => true,
        }
    }

    /// Insert into a zone. Single slots ignore `position`.
    pub(crate) fn insert(&mut self, zone: Zone, card: EntityId, position: ZonePosition) {
        let list = match zone {
            Zone::Leader => {
                self.leader = Some(card);
                return;
            }
            Zone::Stage => {
                self.stage = Some(card);
                return;
            }
            Zone::Attached => return,
            Zone::Deck => &mut self.deck,
            Zone::Hand => &mut self.hand,
            Zone::Trash => &mut self.trash,
            Zone::Life => &mut self.life,
            Zone::DonDeck => &mut self.don_deck,
            Zone::CostArea => &mut self.cost_area,
            Zone::Character => &mut self.characters,
        };
        match position {
            ZonePosition::Top => list.push(card),
            ZonePosition::Bottom => list.insert(0, card),
            ZonePosition::Index(i) => {
                let idx = i.min(list.len());
                list.insert(idx, card);
            }
        }
    }

    /// Remove from a zone. Returns false if the card was not there.
    pub(crate) fn remove(&mut self, zone: Zone, card: EntityId) -> bool {
        let list = match zone {
            Zone::Leader => return take_slot(&mut self.leader, card),
            Zone::Stage => return take_slot(&mut self.stage, card),
            Zone::Attached => return false,
            Zone::Deck => &mut self.deck,
            Zone::Hand => &mut self.hand,
            Zone::Trash => &mut self.trash,
            Zone::Life => &mut self.life,
            Zone::DonDeck => &mut self.don_deck,
            Zone::CostArea => &mut self.cost_area,
            Zone::Character => &mut self.characters,
        };
        match list.iter().position(|&c| c == card) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }
}

fn take_slot(slot: &mut Option<EntityId>, card: EntityId) -> bool {
    if *slot == Some(card) {
        *slot = None;
        true
    } else {
        false
    }
}

/// Complete game state.
///
/// The registry, script table and config are shared read-only through `Arc`
/// and are not part of snapshots.
#[derive(Clone, Debug, Serialize)]
pub struct GameState {
    pub(crate) turn: u32,
    pub(crate) phase: Phase,
    pub(crate) active_player: PlayerId,
    pub(crate) players: PlayerMap<PlayerState>,

    /// Instances, indexed by `EntityId`.
    pub(crate) cards: Vec<CardInstance>,

    pub(crate) stack: EffectStack,
    pub(crate) history: Vector<ActionRecord>,
    pub(crate) tick: u64,

    pub(crate) game_over: bool,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) result: Option<GameResult>,
    pub(crate) loop_guard: LoopGuard,

    pub(crate) events: EventLog,
    /// First event not yet scanned for triggers.
    pub(crate) trigger_cursor: usize,

    pub(crate) battle: Option<Battle>,

    #[serde(skip)]
    pub(crate) triggers: TriggerRegistry,

    pub(crate) next_effect_id: u32,
    pub(crate) started: bool,

    pub(crate) rng: GameRng,

    #[serde(skip)]
    pub(crate) registry: Arc<CardRegistry>,
    #[serde(skip)]
    pub(crate) scripts: Arc<ScriptRegistry>,
    #[serde(skip)]
    pub(crate) config: Arc<EngineConfig>,
}

impl GameState {
    /// Create an empty state: no cards, turn 0, setup phase.
    #[must_use]
    pub fn new(config: EngineConfig, registry: Arc<CardRegistry>) -> Self {
        Self {
            turn: 0,
            phase: Phase::Setup,
            active_player: config.first_player,
            players: PlayerMap::with_default(),
            cards: Vec::new(),
            stack: EffectStack::new(),
            history: Vector::new(),
            tick: 0,
            game_over: false,
            winner: None,
            result: None,
            loop_guard: LoopGuard::default(),
            events: EventLog::new(),
            trigger_cursor: 0,
            battle: None,
            triggers: TriggerRegistry::new(),
            next_effect_id: 0,
            started: false,
            rng: GameRng::new(config.seed),
            registry,
            scripts: Arc::new(ScriptRegistry::new()),
            config: Arc::new(config),
        }
    }

    /// Replace the custom-script table (builder pattern).
    #[must_use]
    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.scripts = Arc::new(scripts);
        self
    }

    // === Construction ===

    /// Create every instance of a deck list for `player`: the leader in its
    /// slot, the main deck (unshuffled) and the DON!! deck.
    pub fn add_deck(&mut self, player: PlayerId, deck: &DeckList) -> Result<()> {
        deck.validate(&self.registry)?;

        self.spawn_card(player, deck.leader, Zone::Leader, CardState::Active)?;
        for &card in &deck.cards {
            self.spawn_card(player, card, Zone::Deck, CardState::None)?;
        }
        for _ in 0..self.config.don_deck_size {
            self.spawn_card(player, deck.don, Zone::DonDeck, CardState::None)?;
        }
        Ok(())
    }

    /// Create one instance directly in a zone (on top) and register its
    /// auto effects. No event is emitted.
    ///
    /// `orientation` applies only to zones that track it.
    pub fn spawn_card(
        &mut self,
        owner: PlayerId,
        card_id: CardId,
        zone: Zone,
        orientation: CardState,
    ) -> Result<EntityId> {
        let Some(definition) = self.registry.get(card_id).cloned() else {
            return Err(EngineError::InvalidDeck(format!("unknown card {card_id}")));
        };
        let id = EntityId::new(self.cards.len() as u32);

        if zone == Zone::Attached {
            return Err(ZoneError::InvalidDestination { card: id, zone }.into());
        }
        if !self.players[owner].has_room(zone, self.config.character_area_limit) {
            return Err(EngineError::ZoneCapacity {
                zone,
                player: owner,
            });
        }

        let mut instance = CardInstance::new(id, card_id, owner, zone);
        if zone.tracks_orientation() {
            instance.state = match orientation {
                CardState::None => CardState::Active,
                other => other,
            };
        }
        if zone.is_in_play() {
            instance.entered_turn = Some(self.turn);
        }

        self.triggers.register_card(&instance, &definition);
        self.players[owner].insert(zone, id, ZonePosition::Top);
        self.cards.push(instance);
        Ok(id)
    }

    /// Shuffle a player's deck with the game RNG.
    pub fn shuffle_deck(&mut self, player: PlayerId) {
        self.rng.shuffle(&mut self.players[player].deck);
    }

    /// Force turn, active player and phase (for fixtures and replays).
    pub fn set_turn(&mut self, turn: u32, active: PlayerId, phase: Phase) {
        self.turn = turn;
        self.active_player = active;
        self.phase = phase;
        self.started = true;
    }

    // === Queries ===

    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn active_player(&self) -> PlayerId {
        self.active_player
    }

    /// Whether the active player is still in their first turn.
    #[must_use]
    pub fn is_first_turn(&self) -> bool {
        self.turn <= 2
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    pub(crate) fn player_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player]
    }

    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&CardInstance> {
        self.cards.get(id.index())
    }

    pub(crate) fn card_mut(&mut self, id: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(id.index())
    }

    /// All instances in id order.
    pub fn cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.iter()
    }

    #[must_use]
    pub fn definition(&self, card_id: CardId) -> Option<&CardDefinition> {
        self.registry.get(card_id)
    }

    /// Definition of an instance.
    #[must_use]
    pub fn definition_of(&self, id: EntityId) -> Option<&CardDefinition> {
        self.card(id).and_then(|c| self.registry.get(c.card_id))
    }

    /// Effective power: printed power, plus modifiers, plus `don_power` per
    /// attached DON!! during its controller's turn.
    #[must_use]
    pub fn power_of(&self, id: EntityId) -> i64 {
        let (Some(card), Some(def)) = (self.card(id), self.definition_of(id)) else {
            return 0;
        };
        let don_bonus = if card.controller == self.active_player {
            card.attached_don.len() as i64 * self.config.don_power
        } else {
            0
        };
        def.power + card.power_modifier() + don_bonus
    }

    /// Printed or granted keyword.
    #[must_use]
    pub fn has_keyword(&self, id: EntityId, keyword: Keyword) -> bool {
        self.definition_of(id).is_some_and(|d| d.has_keyword(keyword))
            || self.card(id).is_some_and(|c| c.has_granted_keyword(keyword))
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn history(&self) -> &Vector<ActionRecord> {
        &self.history
    }

    #[must_use]
    pub fn stack(&self) -> &EffectStack {
        &self.stack
    }

    #[must_use]
    pub fn battle(&self) -> Option<&Battle> {
        self.battle.as_ref()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    #[must_use]
    pub fn loop_guard(&self) -> &LoopGuard {
        &self.loop_guard
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    #[must_use]
    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    #[must_use]
    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    // === Bookkeeping ===

    /// Append an event to the log, returning its sequence number.
    pub fn emit(&mut self, event: GameEvent) -> u64 {
        tracing::trace!(turn = self.turn, event = event.name(), "event");
        self.events.push(self.turn, event)
    }

    pub(crate) fn alloc_effect_id(&mut self) -> EffectInstanceId {
        let id = EffectInstanceId(self.next_effect_id);
        self.next_effect_id += 1;
        id
    }

    /// Append an action to the history with the next tick.
    pub(crate) fn record_action(&mut self, player: PlayerId, action: GameAction) {
        self.tick += 1;
        self.history
            .push_back(ActionRecord::new(player, action, self.turn, self.tick));
    }

    /// Serialize the authoritative state with bincode.
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    /// Verify that every instance is listed in exactly one place and that
    /// the listing agrees with the instance's own zone.
    pub fn check_zone_integrity(&self) -> std::result::Result<(), String> {
        let mut seen = vec![0u32; self.cards.len()];

        for (player, board) in self.players.iter() {
            for zone in [
                Zone::Deck,
                Zone::Hand,
                Zone::Trash,
                Zone::Life,
                Zone::DonDeck,
                Zone::CostArea,
                Zone::Leader,
                Zone::Character,
                Zone::Stage,
            ] {
                for &id in board.zone(zone) {
                    let Some(card) = self.card(id) else {
                        return Err(format!("{player} lists unknown {id} in {zone:?}"));
                    };
                    if card.zone != zone || card.zone_holder() != player {
                        return Err(format!(
                            "{id} listed in {zone:?} of {player} but is in {:?} of {}",
                            card.zone,
                            card.zone_holder()
                        ));
                    }
                    seen[id.index()] += 1;
                }
            }
        }

        for card in &self.cards {
            for &don in &card.attached_don {
                let attached = self.card(don).is_some_and(|d| {
                    d.zone == Zone::Attached && d.attached_to == Some(card.entity_id)
                });
                if !attached {
                    return Err(format!("{don} listed on {} but not attached to it", card.entity_id));
                }
                seen[don.index()] += 1;
            }
            if !card.zone.tracks_orientation() && card.state != CardState::None {
                return Err(format!(
                    "{} has orientation {:?} in {:?}",
                    card.entity_id, card.state, card.zone
                ));
            }
        }

        match seen.iter().position(|&n| n != 1) {
            Some(index) => Err(format!(
                "Entity({index}) appears {} times",
                seen[index]
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, Modifier, Expiry};

    fn registry() -> Arc<CardRegistry> {
        Arc::new(
            CardRegistry::new()
                .with_card(CardDefinition::leader(CardId::new(1), "Leader", 5000, 4))
                .with_card(CardDefinition::don(CardId::new(2)))
                .with_card(CardDefinition::character(CardId::new(3), "Deckhand", 2, 3000)),
        )
    }

    fn deck() -> DeckList {
        DeckList::new(CardId::new(1), vec![CardId::new(3); 8], CardId::new(2))
    }

    #[test]
    fn test_add_deck_builds_zones() {
        let mut state = GameState::new(EngineConfig::default().with_don_deck_size(4), registry());
        state.add_deck(PlayerId::new(0), &deck()).unwrap();
        state.add_deck(PlayerId::new(1), &deck()).unwrap();

        for p in PlayerId::all() {
            let board = state.player(p);
            assert!(board.leader().is_some());
            assert_eq!(board.deck().len(), 8);
            assert_eq!(board.don_deck().len(), 4);
        }
        assert_eq!(state.cards().count(), 2 * (1 + 8 + 4));
        assert!(state.check_zone_integrity().is_ok());
    }

    #[test]
    fn test_spawn_single_slot_capacity() {
        let mut state = GameState::new(EngineConfig::default(), registry());
        let p = PlayerId::new(0);
        state
            .spawn_card(p, CardId::new(1), Zone::Leader, CardState::Active)
            .unwrap();
        let err = state
            .spawn_card(p, CardId::new(1), Zone::Leader, CardState::Active)
            .unwrap_err();
        assert!(matches!(err, EngineError::ZoneCapacity { zone: Zone::Leader, .. }));
    }

    #[test]
    fn test_spawn_orientation_only_where_tracked() {
        let mut state = GameState::new(EngineConfig::default(), registry());
        let p = PlayerId::new(0);
        let in_hand = state
            .spawn_card(p, CardId::new(3), Zone::Hand, CardState::Rested)
            .unwrap();
        let in_play = state
            .spawn_card(p, CardId::new(3), Zone::Character, CardState::Rested)
            .unwrap();

        assert_eq!(state.card(in_hand).map(|c| c.state), Some(CardState::None));
        assert_eq!(state.card(in_play).map(|c| c.state), Some(CardState::Rested));
    }

    #[test]
    fn test_power_counts_don_only_on_own_turn() {
        let mut state = GameState::new(EngineConfig::default(), registry());
        let p0 = PlayerId::new(0);
        let hero = state
            .spawn_card(p0, CardId::new(3), Zone::Character, CardState::Active)
            .unwrap();
        let don = state
            .spawn_card(p0, CardId::new(2), Zone::CostArea, CardState::Active)
            .unwrap();
        crate::zones::ZoneManager::attach_don(&mut state, don, hero).unwrap();
        state.cards[hero.index()]
            .modifiers
            .push(Modifier::power(500, Expiry::EndOfTurn));

        state.set_turn(3, p0, Phase::Main);
        assert_eq!(state.power_of(hero), 3000 + 500 + 1000);

        state.set_turn(4, p0.opponent(), Phase::Main);
        assert_eq!(state.power_of(hero), 3500);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let mut state = GameState::new(EngineConfig::default(), registry());
        state.add_deck(PlayerId::new(0), &deck()).unwrap();
        let a = state.snapshot_bytes().unwrap();
        let b = state.clone().snapshot_bytes().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_flags() {
        let mut board = PlayerState::default();
        assert_eq!(board.flag(FLAG_DECKED_OUT), 0);
        board.set_flag(FLAG_DECKED_OUT, 1);
        assert_eq!(board.flag(FLAG_DECKED_OUT), 1);
    }
}
