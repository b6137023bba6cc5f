//! Effect stack and trigger integration tests.
//!
//! These tests verify LIFO resolution, the fixed ordering of simultaneous
//! triggers (active player first, then board position), and that every
//! triggered instance is resolved exactly once.

mod common;

use common::*;
use opcg_rules::battle::{BattleOutcome, BattleResolver};
use opcg_rules::cards::CardState;
use opcg_rules::core::{DecisionTimeouts, EngineConfig, EntityId, GameState, Phase, Zone};
use opcg_rules::decision::DecisionGate;
use opcg_rules::effects::{
    EffectDefinition, EffectInstance, EffectInstanceId, EffectKind, EffectOrigin, EffectSystem,
    ScriptRegistry, TriggerTiming,
};
use opcg_rules::error::EffectError;
use opcg_rules::stack::EffectStack;
use opcg_rules::triggers::{GameEvent, ResolutionOutcome};
use opcg_rules::zones::{ZoneManager, ZonePosition};

fn gate() -> DecisionGate {
    DecisionGate::new(first_legal_seats(), DecisionTimeouts::default())
}

fn resolved(state: &GameState) -> Vec<(EntityId, ResolutionOutcome)> {
    state
        .events()
        .events()
        .filter_map(|e| match e {
            GameEvent::EffectResolved { source, outcome, .. } => Some((*source, outcome.clone())),
            _ => None,
        })
        .collect()
}

fn triggered_count(state: &GameState) -> usize {
    state
        .events()
        .count(|e| matches!(e, GameEvent::EffectTriggered { .. }))
}

fn instance(id: u32, source: EntityId) -> EffectInstance {
    EffectInstance::new(
        EffectInstanceId(id),
        EffectDefinition::auto(1, "draw", TriggerTiming::OnPlay, EffectKind::Draw { count: 1 }),
        source,
        p0(),
        EffectOrigin::Triggered,
    )
}

// =============================================================================
// EffectStack
// =============================================================================

/// Test the stack is strictly LIFO.
#[test]
fn test_stack_lifo() {
    let mut stack = EffectStack::new();
    stack.push(instance(0, EntityId::new(1)));
    stack.push(instance(1, EntityId::new(2)));
    stack.push(instance(2, EntityId::new(3)));

    let order: Vec<u32> = std::iter::from_fn(|| stack.pop()).map(|i| i.id.0).collect();
    assert_eq!(order, vec![2, 1, 0]);
    assert!(stack.is_empty());
}

/// Test flushing puts the first queued instance on top, active player first.
#[test]
fn test_flush_order() {
    let mut stack = EffectStack::new();
    let mut opponent = instance(0, EntityId::new(1));
    opponent.controller = p1();
    stack.queue(opponent);
    stack.queue(instance(1, EntityId::new(2)));
    stack.queue(instance(2, EntityId::new(3)));

    assert_eq!(stack.flush(p0()), 3);
    assert_eq!(stack.pop().map(|i| i.id.0), Some(1));
    assert_eq!(stack.pop().map(|i| i.id.0), Some(2));
    assert_eq!(stack.pop().map(|i| i.id.0), Some(0));
}

// =============================================================================
// Trigger ordering
// =============================================================================

/// Test simultaneous start-of-turn triggers resolve in board order, and only
/// for the turn player.
#[tokio::test]
async fn test_simultaneous_triggers_follow_board_order() {
    let mut state = board(EngineConfig::default());
    let left = spawn(&mut state, p0(), WATCHER, Zone::Character);
    let right = spawn(&mut state, p0(), WATCHER, Zone::Character);
    spawn(&mut state, p1(), WATCHER, Zone::Character);
    add_deck_cards(&mut state, p0(), 5, DECKHAND);
    add_deck_cards(&mut state, p1(), 5, DECKHAND);

    state.emit(GameEvent::TurnStarted { player: p0(), turn: 3 });
    EffectSystem::resolve_stack(&mut state, &gate()).await.unwrap();

    let sources: Vec<EntityId> = resolved(&state).into_iter().map(|(s, _)| s).collect();
    assert_eq!(sources, vec![left, right]);
    assert_eq!(state.player(p0()).hand().len(), 2);
    assert!(state.player(p1()).hand().is_empty());
}

/// Test the attacker's [When Attacking] resolves before the defender's
/// [On Your Opponent's Attack].
#[tokio::test]
async fn test_active_player_triggers_first() {
    let mut state = board(EngineConfig::default());
    let brawler = spawn(&mut state, p0(), BRAWLER, Zone::Character);
    let sentry = spawn(&mut state, p1(), SENTRY, Zone::Character);
    state.set_turn(5, p0(), Phase::Main);
    let target = leader(&state, p1());

    let outcome = BattleResolver::attack(&mut state, &gate(), brawler, target).await.unwrap();

    assert_eq!(outcome, BattleOutcome::Repelled);
    let sources: Vec<EntityId> = resolved(&state).into_iter().map(|(s, _)| s).collect();
    assert_eq!(sources, vec![brawler, sentry]);
}

// =============================================================================
// Resolution
// =============================================================================

/// Test an [On Play] trigger resolves once and the stack drains.
#[tokio::test]
async fn test_on_play_resolves_once() {
    let mut state = board(EngineConfig::default());
    add_deck_cards(&mut state, p0(), 3, DECKHAND);
    let scout = spawn(&mut state, p0(), SCOUT, Zone::Hand);

    ZoneManager::move_card(&mut state, scout, Zone::Hand, Zone::Character, p0(), ZonePosition::Top)
        .unwrap();
    state.emit(GameEvent::CardPlayed {
        player: p0(),
        card: scout,
        zone: Zone::Character,
    });
    EffectSystem::resolve_stack(&mut state, &gate()).await.unwrap();

    assert_eq!(resolved(&state), vec![(scout, ResolutionOutcome::Resolved)]);
    assert_eq!(triggered_count(&state), 1);
    assert_eq!(state.player(p0()).hand().len(), 1);
    assert!(state.stack().is_empty());

    // Nothing new to collect: resolving again is a no-op.
    EffectSystem::resolve_stack(&mut state, &gate()).await.unwrap();
    assert_eq!(resolved(&state).len(), 1);
}

/// Test an [On K.O.] trigger fires from the trash for the card's owner.
#[tokio::test]
async fn test_on_ko_trigger() {
    let mut state = board(EngineConfig::default());
    let rusher = spawn(&mut state, p0(), RUSHER, Zone::Character);
    let martyr = spawn_rested(&mut state, p1(), MARTYR, Zone::Character);
    add_deck_cards(&mut state, p1(), 2, DECKHAND);

    let outcome = BattleResolver::attack(&mut state, &gate(), rusher, martyr).await.unwrap();

    assert_eq!(outcome, BattleOutcome::TargetKo);
    assert_eq!(state.card(martyr).unwrap().zone, Zone::Trash);
    assert_eq!(resolved(&state), vec![(martyr, ResolutionOutcome::Resolved)]);
    assert_eq!(state.player(p1()).hand().len(), 1);
}

/// Test a missing custom script fizzles the effect without stopping the game.
#[tokio::test]
async fn test_unknown_script_fizzles() {
    let mut state = board(EngineConfig::default());
    let tinker = spawn(&mut state, p0(), TINKER, Zone::Character);
    state.emit(GameEvent::CardPlayed {
        player: p0(),
        card: tinker,
        zone: Zone::Character,
    });

    EffectSystem::resolve_stack(&mut state, &gate()).await.unwrap();

    let outcomes = resolved(&state);
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0].1, ResolutionOutcome::Failed(msg) if msg.contains("tinker")));
    assert!(state.stack().is_empty());
    assert!(!state.is_game_over());
}

/// Test a registered custom script runs.
#[tokio::test]
async fn test_custom_script_runs() {
    let scripts = ScriptRegistry::new().with_script("tinker", |state, instance| {
        opcg_rules::zones::ZoneManager::draw(state, instance.controller)?;
        Ok::<(), EffectError>(())
    });
    let mut state = board(EngineConfig::default()).with_scripts(scripts);
    add_deck_cards(&mut state, p0(), 1, DECKHAND);
    let tinker = spawn(&mut state, p0(), TINKER, Zone::Character);
    state.emit(GameEvent::CardPlayed {
        player: p0(),
        card: tinker,
        zone: Zone::Character,
    });

    EffectSystem::resolve_stack(&mut state, &gate()).await.unwrap();

    assert_eq!(resolved(&state), vec![(tinker, ResolutionOutcome::Resolved)]);
    assert_eq!(state.player(p0()).hand().len(), 1);
}

/// Test an effect whose condition no longer holds fizzles.
#[tokio::test]
async fn test_condition_rechecked_at_resolution() {
    use opcg_rules::triggers::Condition;

    let mut state = board(EngineConfig::default());
    let source = leader(&state, p0());
    add_deck_cards(&mut state, p0(), 1, DECKHAND);
    let effect = EffectDefinition::auto(9, "draw if 3 DON", TriggerTiming::OnPlay, EffectKind::Draw {
        count: 1,
    })
    .with_condition(Condition::DonAtLeast(3));

    EffectSystem::enqueue_effect(&mut state, effect, source, p0(), EffectOrigin::Activated);
    EffectSystem::resolve_stack(&mut state, &gate()).await.unwrap();

    assert_eq!(resolved(&state), vec![(source, ResolutionOutcome::Fizzled)]);
    assert!(state.player(p0()).hand().is_empty());
}

/// Test an unaffordable effect cost leaves the effect unpaid.
#[tokio::test]
async fn test_unpaid_cost() {
    use opcg_rules::effects::CostExpr;

    let mut state = board(EngineConfig::default());
    let source = leader(&state, p0());
    add_don(&mut state, p0(), 1, CardState::Active);
    let effect = EffectDefinition::auto(9, "pay 2: draw", TriggerTiming::OnPlay, EffectKind::Draw {
        count: 1,
    })
    .with_cost(CostExpr::RestDon(2));

    EffectSystem::enqueue_effect(&mut state, effect, source, p0(), EffectOrigin::Activated);
    EffectSystem::resolve_stack(&mut state, &gate()).await.unwrap();

    assert_eq!(resolved(&state), vec![(source, ResolutionOutcome::CostUnpaid)]);
    assert_eq!(ZoneManager::active_don(&state, p0()).len(), 1);
}
