//! Battle resolver integration tests.
//!
//! Covers attack legality, blocking, the counter step, damage (K.O., life
//! damage with Double Attack / Banish / [Trigger]) and battles interrupted
//! by an attacker leaving play.

mod common;

use common::*;
use opcg_rules::battle::{BattleOutcome, BattleResolver};
use opcg_rules::cards::{CardId, CardState};
use opcg_rules::core::{
    DecisionTimeouts, EngineConfig, EntityId, GameAction, GameState, Phase, PlayerId, Zone,
};
use opcg_rules::decision::{CounterAction, DecisionGate, FirstLegalPlayer, ScriptedPlayer};
use opcg_rules::effects::EffectId;
use opcg_rules::rules::{GameEngine, GameResult};
use opcg_rules::triggers::{GameEvent, GameOverReason};

fn gate_with_defender(defender: ScriptedPlayer) -> DecisionGate {
    DecisionGate::new(seats(FirstLegalPlayer, defender), DecisionTimeouts::default())
}

fn default_gate() -> DecisionGate {
    DecisionGate::new(first_legal_seats(), DecisionTimeouts::default())
}

/// Board at turn 5 so that spawned characters are not summoning sick.
fn ready_board() -> GameState {
    let mut state = board(EngineConfig::default());
    state.set_turn(5, p0(), Phase::Main);
    state
}

/// Spawn a character and move the clock past its summoning sickness.
fn spawn_ready(state: &mut GameState, player: PlayerId, card: CardId) -> EntityId {
    let id = spawn(state, player, card, Zone::Character);
    let (turn, active) = (state.turn(), state.active_player());
    state.set_turn(turn + 2, active, Phase::Main);
    id
}

// =============================================================================
// Attack legality
// =============================================================================

/// Test a rested card is never a legal attacker.
#[test]
fn test_rested_attacker_illegal() {
    let mut state = ready_board();
    let attacker = spawn_rested(&mut state, p0(), DECKHAND, Zone::Character);
    state.set_turn(7, p0(), Phase::Main);

    assert!(!BattleResolver::can_attack(&state, attacker));
    assert!(BattleResolver::legal_attack_targets(&state, attacker).is_empty());
}

/// Test targets are the opponent's leader and rested characters only.
#[test]
fn test_attack_targets() {
    let mut state = ready_board();
    let attacker = spawn_ready(&mut state, p0(), DECKHAND);
    let active = spawn(&mut state, p1(), DECKHAND, Zone::Character);
    let rested = spawn_rested(&mut state, p1(), DECKHAND, Zone::Character);
    spawn_rested(&mut state, p0(), DECKHAND, Zone::Character);

    let targets = BattleResolver::legal_attack_targets(&state, attacker);
    assert_eq!(targets, vec![leader(&state, p1()), rested]);
    assert!(!targets.contains(&active));
}

/// Test summoning sickness, Rush and the first-turn restriction.
#[test]
fn test_attack_timing_restrictions() {
    let mut state = ready_board();
    let fresh = spawn(&mut state, p0(), DECKHAND, Zone::Character);
    let rusher = spawn(&mut state, p0(), RUSHER, Zone::Character);
    assert!(!BattleResolver::can_attack(&state, fresh));
    assert!(BattleResolver::can_attack(&state, rusher));

    let mut first_turn = board(EngineConfig::default());
    first_turn.set_turn(1, p0(), Phase::Main);
    let leader0 = leader(&first_turn, p0());
    assert!(!BattleResolver::can_attack(&first_turn, leader0));

    let mut allowed = board(EngineConfig::default().allow_first_turn_attacks());
    allowed.set_turn(1, p0(), Phase::Main);
    let leader0 = leader(&allowed, p0());
    assert!(BattleResolver::can_attack(&allowed, leader0));
}

/// Test only the active player's cards attack, and only in the main phase.
#[test]
fn test_attack_needs_main_phase_and_turn() {
    let mut state = ready_board();
    let opponent_leader = leader(&state, p1());
    assert!(!BattleResolver::can_attack(&state, opponent_leader));

    state.set_turn(5, p0(), Phase::End);
    assert!(!BattleResolver::can_attack(&state, leader(&state, p0())));
}

/// Test declaring an illegal target fails without changing anything.
#[tokio::test]
async fn test_illegal_target_rejected() {
    let mut state = ready_board();
    let attacker = spawn_ready(&mut state, p0(), DECKHAND);
    let active = spawn(&mut state, p1(), DECKHAND, Zone::Character);
    let before = state.snapshot_bytes().unwrap();

    let err = BattleResolver::attack(&mut state, &default_gate(), attacker, active)
        .await
        .unwrap_err();

    assert!(matches!(err, opcg_rules::EngineError::InvalidTarget { .. }));
    assert_eq!(state.snapshot_bytes().unwrap(), before);
}

// =============================================================================
// Blocking
// =============================================================================

/// Test the defender's Blocker rests and takes the battle.
#[tokio::test]
async fn test_block_redirects_battle() {
    let mut state = ready_board();
    let attacker = spawn_ready(&mut state, p0(), DECKHAND);
    let guard = spawn(&mut state, p1(), GUARD, Zone::Character);
    let target = leader(&state, p1());
    let gate = gate_with_defender(ScriptedPlayer::new().with_blocker(Some(guard)));

    let outcome = BattleResolver::attack(&mut state, &gate, attacker, target).await.unwrap();

    // 3000 against the 2000 blocker
    assert_eq!(outcome, BattleOutcome::TargetKo);
    assert_eq!(state.card(guard).unwrap().zone, Zone::Trash);

    let events: Vec<&GameEvent> = state.events().events().collect();
    let block = events
        .iter()
        .position(|e| matches!(e, GameEvent::BlockDeclared { blocker, original_target, .. }
            if *blocker == guard && *original_target == target))
        .expect("block declared");
    let end = events
        .iter()
        .position(|e| matches!(e, GameEvent::BattleEnd { defender, .. } if *defender == guard))
        .expect("battle ended");
    assert!(block < end);
    assert!(events[..block].iter().any(|e| matches!(
        e,
        GameEvent::CardStateChanged { card, to: CardState::Rested, .. } if *card == guard
    )));
    assert!(state.battle().is_none());
}

/// Test blockers must be ACTIVE and Unblockable attackers cannot be blocked.
#[test]
fn test_legal_blockers() {
    let mut state = ready_board();
    let attacker = spawn_ready(&mut state, p0(), DECKHAND);
    let phantom = spawn_ready(&mut state, p0(), PHANTOM);
    let guard = spawn(&mut state, p1(), GUARD, Zone::Character);
    spawn_rested(&mut state, p1(), GUARD, Zone::Character);
    spawn(&mut state, p1(), DECKHAND, Zone::Character);
    let target = leader(&state, p1());

    assert_eq!(BattleResolver::legal_blockers(&state, attacker, target), vec![guard]);
    assert!(BattleResolver::legal_blockers(&state, attacker, guard).is_empty());
    assert!(BattleResolver::legal_blockers(&state, phantom, target).is_empty());
}

/// Test declining to block leaves the original target.
#[tokio::test]
async fn test_no_block() {
    let mut state = ready_board();
    add_life(&mut state, p1(), 2, DECKHAND);
    let attacker = spawn_ready(&mut state, p0(), RUSHER);
    spawn(&mut state, p1(), GUARD, Zone::Character);
    let target = leader(&state, p1());
    let gate = gate_with_defender(ScriptedPlayer::new().with_blocker(None));

    let outcome = BattleResolver::attack(&mut state, &gate, attacker, target).await.unwrap();

    assert_eq!(outcome, BattleOutcome::LifeDamage { amount: 1 });
    assert_eq!(state.player(p1()).life().len(), 1);
    assert_eq!(state.events().count(|e| matches!(e, GameEvent::BlockDeclared { .. })), 0);
}

// =============================================================================
// Counter step
// =============================================================================

/// Test counter cards from hand add power until the battle ends.
#[tokio::test]
async fn test_counter_cards() {
    let mut state = ready_board();
    let attacker = spawn_ready(&mut state, p0(), RUSHER);
    let a = spawn(&mut state, p1(), DECKHAND, Zone::Hand);
    let b = spawn(&mut state, p1(), DECKHAND, Zone::Hand);
    let target = leader(&state, p1());
    let gate = gate_with_defender(
        ScriptedPlayer::new()
            .with_counter(Some(CounterAction::UseCounter { card: a }))
            .with_counter(Some(CounterAction::UseCounter { card: b })),
    );

    let outcome = BattleResolver::attack(&mut state, &gate, attacker, target).await.unwrap();

    // 6000 against 5000 + 2000
    assert_eq!(outcome, BattleOutcome::Repelled);
    assert_eq!(state.player(p1()).trash(), &[a, b]);
    assert_eq!(state.power_of(target), 5000);
    assert_eq!(
        state.events().count(|e| matches!(e, GameEvent::CounterUsed { amount: 1000, .. })),
        2
    );
}

/// Test a counter event pays its DON!! cost and boosts the chosen target.
#[tokio::test]
async fn test_counter_event() {
    let mut state = ready_board();
    let attacker = spawn_ready(&mut state, p0(), RUSHER);
    let shield = spawn(&mut state, p1(), SHIELD, Zone::Hand);
    let don = add_don(&mut state, p1(), 1, CardState::Active)[0];
    let target = leader(&state, p1());

    assert!(
        BattleResolver::counter_options(&state, p1()).is_empty(),
        "no battle, no counters"
    );

    let play = CounterAction::PlayCounterEvent {
        card: shield,
        effect: EffectId::new(1),
    };
    let gate = gate_with_defender(ScriptedPlayer::new().with_counter(Some(play)).with_target(target));

    let outcome = BattleResolver::attack(&mut state, &gate, attacker, target).await.unwrap();

    assert_eq!(outcome, BattleOutcome::Repelled);
    assert_eq!(state.card(don).unwrap().state, CardState::Rested);
    assert_eq!(state.card(shield).unwrap().zone, Zone::Trash);
    assert_eq!(state.power_of(target), 5000);
}

/// Test counter events are not offered without enough ACTIVE DON!!.
#[tokio::test]
async fn test_counter_event_needs_don() {
    let mut state = ready_board();
    let attacker = spawn_ready(&mut state, p0(), RUSHER);
    let shield = spawn(&mut state, p1(), SHIELD, Zone::Hand);
    add_life(&mut state, p1(), 1, DECKHAND);
    let target = leader(&state, p1());
    let play = CounterAction::PlayCounterEvent {
        card: shield,
        effect: EffectId::new(1),
    };
    let gate = gate_with_defender(ScriptedPlayer::new().with_counter(Some(play)));

    let outcome = BattleResolver::attack(&mut state, &gate, attacker, target).await.unwrap();

    assert_eq!(outcome, BattleOutcome::LifeDamage { amount: 1 });
    assert_eq!(state.card(shield).unwrap().zone, Zone::Hand);
}

// =============================================================================
// Damage
// =============================================================================

/// Test equal power hits.
#[test]
fn test_damage_outcome_is_pure() {
    for (a, d) in [(5000, 5000), (6000, 5000), (4000, 5000), (0, 0)] {
        assert_eq!(BattleResolver::damage_outcome(a, d), a >= d);
        assert_eq!(BattleResolver::damage_outcome(a, d), BattleResolver::damage_outcome(a, d));
    }
}

/// Test Double Attack takes two life cards to hand.
#[tokio::test]
async fn test_double_attack() {
    let mut state = ready_board();
    let life = add_life(&mut state, p1(), 3, DECKHAND);
    let attacker = spawn_ready(&mut state, p0(), TWIN);
    let target = leader(&state, p1());

    let outcome = BattleResolver::attack(&mut state, &default_gate(), attacker, target).await.unwrap();

    assert_eq!(outcome, BattleOutcome::LifeDamage { amount: 2 });
    assert_eq!(state.player(p1()).life(), &[life[0]]);
    assert_eq!(state.player(p1()).hand(), &[life[2], life[1]]);
    assert_eq!(state.events().count(|e| matches!(e, GameEvent::LifeDamage { .. })), 2);
}

/// Test Banish trashes the life card and skips its [Trigger].
#[tokio::test]
async fn test_banish() {
    let mut state = ready_board();
    let life = add_life(&mut state, p1(), 1, LOOKOUT);
    add_deck_cards(&mut state, p1(), 1, DECKHAND);
    let attacker = spawn_ready(&mut state, p0(), EXILE);
    let target = leader(&state, p1());

    BattleResolver::attack(&mut state, &default_gate(), attacker, target).await.unwrap();

    assert_eq!(state.player(p1()).trash(), &[life[0]]);
    assert!(state.player(p1()).hand().is_empty());
    assert_eq!(state.events().count(|e| matches!(e, GameEvent::EffectTriggered { .. })), 0);
}

/// Test an activated life [Trigger] resolves and trashes the life card.
#[tokio::test]
async fn test_life_trigger_activated() {
    let mut state = ready_board();
    let life = add_life(&mut state, p1(), 1, LOOKOUT);
    let deck = add_deck_cards(&mut state, p1(), 1, DECKHAND);
    let attacker = spawn_ready(&mut state, p0(), RUSHER);
    let target = leader(&state, p1());
    let gate = gate_with_defender(ScriptedPlayer::new().with_value(1));

    BattleResolver::attack(&mut state, &gate, attacker, target).await.unwrap();

    assert_eq!(state.player(p1()).hand(), &[deck[0]]);
    assert_eq!(state.player(p1()).trash(), &[life[0]]);
}

/// Test a declined life [Trigger] sends the card to hand.
#[tokio::test]
async fn test_life_trigger_declined() {
    let mut state = ready_board();
    let life = add_life(&mut state, p1(), 1, LOOKOUT);
    add_deck_cards(&mut state, p1(), 1, DECKHAND);
    let attacker = spawn_ready(&mut state, p0(), RUSHER);
    let target = leader(&state, p1());
    let gate = gate_with_defender(ScriptedPlayer::new().with_value(0));

    BattleResolver::attack(&mut state, &gate, attacker, target).await.unwrap();

    assert_eq!(state.player(p1()).hand(), &[life[0]]);
    assert_eq!(state.player(p1()).deck().len(), 1);
}

/// Test an attacker K.O.'d by a defender's trigger aborts the battle.
#[tokio::test]
async fn test_interrupted_battle_aborts() {
    let mut state = ready_board();
    add_life(&mut state, p1(), 2, DECKHAND);
    let attacker = spawn_ready(&mut state, p0(), RUSHER);
    spawn(&mut state, p1(), AMBUSHER, Zone::Character);
    let target = leader(&state, p1());

    let outcome = BattleResolver::attack(&mut state, &default_gate(), attacker, target).await.unwrap();

    assert_eq!(outcome, BattleOutcome::Aborted);
    assert_eq!(state.card(attacker).unwrap().zone, Zone::Trash);
    assert_eq!(state.player(p1()).life().len(), 2);
    assert!(matches!(
        state.events().last().map(|r| &r.event),
        Some(GameEvent::BattleEnd { outcome: BattleOutcome::Aborted, .. })
    ));
}

// =============================================================================
// Lethal
// =============================================================================

/// Test a Rush attacker played this turn takes the last life card and wins.
#[tokio::test]
async fn test_rush_lethal() {
    let mut state = board(EngineConfig::default());
    add_life(&mut state, p0(), 2, DECKHAND);
    add_life(&mut state, p1(), 1, DECKHAND);
    add_don(&mut state, p0(), 1, CardState::Active);
    let rusher = spawn(&mut state, p0(), RUSHER, Zone::Hand);
    let target = leader(&state, p1());
    let mut engine = GameEngine::from_state(state, first_legal_seats());

    engine.play_card(p0(), rusher).await.unwrap();
    assert_eq!(engine.state().card(rusher).unwrap().zone, Zone::Character);
    engine
        .apply_action(p0(), GameAction::DeclareAttack { attacker: rusher, target })
        .await
        .unwrap();

    let state = engine.state();
    assert!(state.player(p1()).life().is_empty());
    assert!(state.is_game_over());
    assert_eq!(state.winner(), Some(p0()));
    assert_eq!(state.result(), Some(GameResult::Winner(p0())));
    assert!(matches!(
        state.events().last().map(|r| &r.event),
        Some(GameEvent::GameOver { winner: Some(w), reason: GameOverReason::LifeDepleted }) if *w == p0()
    ));
}
