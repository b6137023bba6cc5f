//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use opcg_rules::cards::{CardDefinition, CardId, CardRegistry, CardState, DeckList, Expiry, Keyword};
use opcg_rules::core::{EngineConfig, EntityId, GameState, Phase, PlayerId, PlayerMap, Zone};
use opcg_rules::decision::{FirstLegalPlayer, Player};
use opcg_rules::effects::{
    ActivationWindow, CostExpr, EffectDefinition, EffectKind, TargetSide, TargetSpec, TriggerTiming,
};

pub const LEADER: CardId = CardId(1);
pub const DON: CardId = CardId(2);
/// Cost 2, 3000 power, 1000 counter.
pub const DECKHAND: CardId = CardId(10);
/// Cost 1, 6000 power, Rush.
pub const RUSHER: CardId = CardId(11);
/// Cost 2, 2000 power, Blocker, 1000 counter.
pub const GUARD: CardId = CardId(12);
/// Cost 1, 1000 power, [On Play] draw 1.
pub const SCOUT: CardId = CardId(13);
/// Cost 1, 1000 power, [When Attacking] +2000 to itself until end of battle.
pub const BRAWLER: CardId = CardId(14);
/// Cost 1 event, [Counter] +4000 to your leader or a character.
pub const SHIELD: CardId = CardId(20);
/// Cost 1 event, [Main] draw 2.
pub const INSIGHT: CardId = CardId(21);
/// Cost 0 character with a [Trigger] that draws 1.
pub const LOOKOUT: CardId = CardId(15);
/// Cost 1, 2000 power, [On Your Opponent's Attack] +1000 to itself.
pub const SENTRY: CardId = CardId(16);
/// Cost 1, 1000 power, start of your turn: draw 1.
pub const WATCHER: CardId = CardId(17);
/// Cost 1, 1000 power, [On K.O.] draw 1.
pub const MARTYR: CardId = CardId(18);
/// Cost 0, 1000 power, [On Play] runs the `tinker` script.
pub const TINKER: CardId = CardId(19);
/// Cost 1, 6000 power, Rush and Double Attack.
pub const TWIN: CardId = CardId(23);
/// Cost 1, 6000 power, Rush and Banish.
pub const EXILE: CardId = CardId(24);
/// Cost 1, 6000 power, Rush and Unblockable.
pub const PHANTOM: CardId = CardId(25);
/// Cost 1, 1000 power, [On Your Opponent's Attack] K.O. an opponent's character.
pub const AMBUSHER: CardId = CardId(26);
/// Cost 1, 3000 power, [Activate: Main] [Once Per Turn] rest 1 DON!!: draw 1.
pub const DRILLMASTER: CardId = CardId(27);

pub fn registry() -> Arc<CardRegistry> {
    Arc::new(
        CardRegistry::new()
            .with_card(CardDefinition::leader(LEADER, "Captain", 5000, 4))
            .with_card(CardDefinition::don(DON))
            .with_card(CardDefinition::character(DECKHAND, "Deckhand", 2, 3000).with_counter(1000))
            .with_card(
                CardDefinition::character(RUSHER, "Cannonball", 1, 6000).with_keyword(Keyword::Rush),
            )
            .with_card(
                CardDefinition::character(GUARD, "Gatekeeper", 2, 2000)
                    .with_keyword(Keyword::Blocker)
                    .with_counter(1000),
            )
            .with_card(CardDefinition::character(SCOUT, "Scout", 1, 1000).with_effect(
                EffectDefinition::auto(1, "On Play: draw 1", TriggerTiming::OnPlay, EffectKind::Draw {
                    count: 1,
                }),
            ))
            .with_card(CardDefinition::character(BRAWLER, "Brawler", 1, 1000).with_effect(
                EffectDefinition::auto(
                    1,
                    "When Attacking: +2000",
                    TriggerTiming::WhenAttacking,
                    EffectKind::PowerBoost {
                        amount: 2000,
                        target: TargetSpec::this_card(),
                        expiry: Expiry::EndOfBattle,
                    },
                ),
            ))
            .with_card(CardDefinition::event(SHIELD, "Iron Wall", 1).with_effect(
                EffectDefinition::activated(
                    1,
                    "Counter: +4000",
                    ActivationWindow::Counter,
                    EffectKind::PowerBoost {
                        amount: 4000,
                        target: TargetSpec::leader_or_character(TargetSide::Own),
                        expiry: Expiry::EndOfBattle,
                    },
                ),
            ))
            .with_card(CardDefinition::event(INSIGHT, "Insight", 1).with_effect(
                EffectDefinition::activated(
                    1,
                    "Main: draw 2",
                    ActivationWindow::Main,
                    EffectKind::Draw { count: 2 },
                ),
            ))
            .with_card(CardDefinition::character(LOOKOUT, "Lookout", 0, 1000).with_effect(
                EffectDefinition::auto(1, "Trigger: draw 1", TriggerTiming::LifeTrigger, EffectKind::Draw {
                    count: 1,
                }),
            ))
            .with_card(CardDefinition::character(SENTRY, "Sentry", 1, 2000).with_effect(
                EffectDefinition::auto(
                    1,
                    "On Opponent's Attack: +1000",
                    TriggerTiming::OnOpponentAttack,
                    EffectKind::PowerBoost {
                        amount: 1000,
                        target: TargetSpec::this_card(),
                        expiry: Expiry::EndOfBattle,
                    },
                ),
            ))
            .with_card(CardDefinition::character(WATCHER, "Watcher", 1, 1000).with_effect(
                EffectDefinition::auto(1, "Start of turn: draw 1", TriggerTiming::StartOfTurn, EffectKind::Draw {
                    count: 1,
                }),
            ))
            .with_card(CardDefinition::character(MARTYR, "Martyr", 1, 1000).with_effect(
                EffectDefinition::auto(1, "On K.O.: draw 1", TriggerTiming::OnKo, EffectKind::Draw {
                    count: 1,
                }),
            ))
            .with_card(CardDefinition::character(TINKER, "Tinker", 0, 1000).with_effect(
                EffectDefinition::auto(1, "On Play: tinker", TriggerTiming::OnPlay, EffectKind::Custom {
                    script: "tinker".into(),
                }),
            ))
            .with_card(
                CardDefinition::character(TWIN, "Twin Blades", 1, 6000)
                    .with_keyword(Keyword::Rush)
                    .with_keyword(Keyword::DoubleAttack),
            )
            .with_card(
                CardDefinition::character(EXILE, "Exile", 1, 6000)
                    .with_keyword(Keyword::Rush)
                    .with_keyword(Keyword::Banish),
            )
            .with_card(
                CardDefinition::character(PHANTOM, "Phantom", 1, 6000)
                    .with_keyword(Keyword::Rush)
                    .with_keyword(Keyword::Unblockable),
            )
            .with_card(CardDefinition::character(AMBUSHER, "Ambusher", 1, 1000).with_effect(
                EffectDefinition::auto(
                    1,
                    "On Opponent's Attack: K.O. a character",
                    TriggerTiming::OnOpponentAttack,
                    EffectKind::KoCharacter {
                        target: TargetSpec::characters(TargetSide::Opponent),
                    },
                ),
            ))
            .with_card(CardDefinition::character(DRILLMASTER, "Drillmaster", 1, 3000).with_effect(
                EffectDefinition::activated(
                    1,
                    "Activate: Main: rest 1 DON!!, draw 1",
                    ActivationWindow::Main,
                    EffectKind::Draw { count: 1 },
                )
                .with_cost(CostExpr::RestDon(1))
                .once_per_turn(),
            )),
    )
}

pub fn p0() -> PlayerId {
    PlayerId::new(0)
}

pub fn p1() -> PlayerId {
    PlayerId::new(1)
}

/// Two leaders on an otherwise empty board, player 0 in the main phase of
/// turn 3.
pub fn board(config: EngineConfig) -> GameState {
    let mut state = GameState::new(config, registry());
    for player in PlayerId::all() {
        state
            .spawn_card(player, LEADER, Zone::Leader, CardState::Active)
            .unwrap();
    }
    state.set_turn(3, p0(), Phase::Main);
    state
}

pub fn leader(state: &GameState, player: PlayerId) -> EntityId {
    state.player(player).leader().unwrap()
}

pub fn spawn(state: &mut GameState, player: PlayerId, card: CardId, zone: Zone) -> EntityId {
    let orientation = if zone.tracks_orientation() {
        CardState::Active
    } else {
        CardState::None
    };
    state.spawn_card(player, card, zone, orientation).unwrap()
}

pub fn spawn_rested(state: &mut GameState, player: PlayerId, card: CardId, zone: Zone) -> EntityId {
    state.spawn_card(player, card, zone, CardState::Rested).unwrap()
}

/// Add `n` DON!! to the cost area with the given orientation.
pub fn add_don(state: &mut GameState, player: PlayerId, n: usize, orientation: CardState) -> Vec<EntityId> {
    (0..n)
        .map(|_| state.spawn_card(player, DON, Zone::CostArea, orientation).unwrap())
        .collect()
}

/// Put `n` cards into life.
pub fn add_life(state: &mut GameState, player: PlayerId, n: usize, card: CardId) -> Vec<EntityId> {
    (0..n).map(|_| spawn(state, player, card, Zone::Life)).collect()
}

/// Put `n` cards into the deck.
pub fn add_deck_cards(state: &mut GameState, player: PlayerId, n: usize, card: CardId) -> Vec<EntityId> {
    (0..n).map(|_| spawn(state, player, card, Zone::Deck)).collect()
}

pub fn seats(first: impl Player + 'static, second: impl Player + 'static) -> PlayerMap<Arc<dyn Player>> {
    let first: Arc<dyn Player> = Arc::new(first);
    let second: Arc<dyn Player> = Arc::new(second);
    PlayerMap::from_pair(first, second)
}

pub fn first_legal_seats() -> PlayerMap<Arc<dyn Player>> {
    seats(FirstLegalPlayer, FirstLegalPlayer)
}

/// A legal 30-card deck of vanilla characters and a few effect cards.
pub fn deck_list() -> DeckList {
    let mut cards = Vec::new();
    for i in 0..30 {
        cards.push(match i % 6 {
            0 => DECKHAND,
            1 => GUARD,
            2 => SCOUT,
            3 => RUSHER,
            4 => SHIELD,
            _ => INSIGHT,
        });
    }
    DeckList::new(LEADER, cards, DON)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
