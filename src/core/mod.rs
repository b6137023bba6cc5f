//! Core engine types: entities, players, state, actions, RNG, configuration.
//!
//! Everything else in the crate is built on these: the zone manager, effect
//! system, battle resolver and engine all operate on a `GameState`.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod action;
pub mod state;

pub use entity::EntityId;
pub use player::{PlayerId, PlayerMap, PLAYER_COUNT};
pub use rng::{GameRng, GameRngState};
pub use config::{DecisionTimeouts, EngineConfig, LoopGuardConfig, Phase, Zone};
pub use action::{ActionKind, ActionRecord, GameAction, LoopGuard};
pub use state::{GameState, PlayerState, FLAG_DECKED_OUT, FLAG_MULLIGANED};
