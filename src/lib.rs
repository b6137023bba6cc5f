//! # opcg-rules
//!
//! A deterministic rules engine for a two-player leader/DON!! trading card
//! game: leaders with life, DON!! as the resource, characters that rest to
//! attack, blockers, counters and rush.
//!
//! ## Design Principles
//!
//! 1. **Single source of truth**: `GameState` owns every card instance and
//!    every zone. Only the zone manager, the effect system and the battle
//!    resolver mutate it.
//!
//! 2. **Deterministic**: all shuffling uses the game's seeded RNG, and
//!    simultaneous triggers are ordered by a fixed rule, so two games with
//!    the same seed and the same decisions produce identical snapshots.
//!
//! 3. **Untrusted players**: decisions are async, time-bounded and checked
//!    against the options offered. A faulty provider can only ever cause
//!    the safe default.
//!
//! ## Modules
//!
//! - `core`: ids, players, config, actions, RNG, `GameState`
//! - `cards`: definitions, instances, registry, deck lists
//! - `zones`: the zone manager
//! - `effects`: effect definitions, costs, targeting, execution, activation
//! - `triggers`: events, the event log, conditions, the trigger registry
//! - `stack`: the LIFO resolution stack and pending-trigger queue
//! - `battle`: attack, block, counter and damage
//! - `decision`: the `Player` contract, the decision gate, bundled players
//! - `rules`: legal actions, the game engine, event subscriptions

pub mod core;
pub mod error;
pub mod cards;
pub mod zones;
pub mod triggers;
pub mod effects;
pub mod stack;
pub mod battle;
pub mod decision;
pub mod rules;

// Re-export commonly used types
pub use crate::core::{
    EntityId, PlayerId, PlayerMap,
    GameRng, GameRngState,
    EngineConfig, LoopGuardConfig, DecisionTimeouts, Phase, Zone,
    GameAction, ActionKind, ActionRecord,
    GameState, PlayerState,
};

pub use crate::error::{DecisionError, EffectError, EngineError, Result, ZoneError};

pub use crate::cards::{
    CardId, CardCategory, CardDefinition, CardInstance, CardRegistry, CardState,
    DeckList, Expiry, Keyword, Modifier,
};

pub use crate::zones::{ZoneManager, ZonePosition};

pub use crate::effects::{
    CostExpr, CostPayment, EffectDefinition, EffectId, EffectInstance, EffectKind,
    EffectSystem, EffectTiming, ActivationWindow, TriggerTiming, ScriptRegistry,
    TargetSide, TargetSpec,
};

pub use crate::triggers::{
    Condition, EventLog, EventRecord, GameEvent, GameOverReason, TriggerRegistry,
};

pub use crate::stack::EffectStack;

pub use crate::battle::{Battle, BattleOutcome, BattleResolver, BattleStep};

pub use crate::decision::{
    CounterAction, DecisionGate, FirstLegalPlayer, Player, RandomPlayer, ScriptedPlayer,
};

pub use crate::rules::{GameEngine, GameResult, LegalActions};
