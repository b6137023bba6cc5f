//! Error types for the rules engine.
//!
//! - `ZoneError`: a card move or orientation change failed validation
//! - `EffectError`: an effect body could not execute (the effect fizzles)
//! - `DecisionError`: a player failed to answer (always absorbed by the gate)
//! - `EngineError`: everything the engine reports to its caller

use std::time::Duration;

use thiserror::Error;

use crate::core::{ActionKind, EntityId, PlayerId, Zone};

/// Validation failures raised by the zone manager. None of them mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    #[error("card not found: {0}")]
    CardNotFound(EntityId),

    #[error("{card} is in {actual:?}, not {expected:?}")]
    NotInZone {
        card: EntityId,
        expected: Zone,
        actual: Zone,
    },

    #[error("{zone:?} of {player} is full")]
    Capacity { zone: Zone, player: PlayerId },

    #[error("{card} cannot enter {zone:?} of {player}: not the owner")]
    WrongOwner {
        card: EntityId,
        zone: Zone,
        player: PlayerId,
    },

    #[error("{card} cannot be moved into {zone:?}")]
    InvalidDestination { card: EntityId, zone: Zone },

    #[error("{card} in {zone:?} has no orientation")]
    NoOrientation { card: EntityId, zone: Zone },

    #[error("{zone:?} of {player} is empty")]
    EmptyZone { zone: Zone, player: PlayerId },
}

/// Failures while executing an effect body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("no script registered under '{0}'")]
    UnknownScript(String),

    #[error("unknown card definition for {0}")]
    UnknownDefinition(EntityId),

    #[error("invalid target {0}")]
    InvalidTarget(EntityId),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error("script failed: {0}")]
    Script(String),
}

/// Failures reported by a decision provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("no options to choose from")]
    NoOptions,

    #[error("decision timed out after {0:?}")]
    Timeout(Duration),

    #[error("choice not among the legal options: {0}")]
    InvalidChoice(String),

    #[error("provider error: {0}")]
    Provider(String),
}

/// Errors returned by engine entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("illegal action: {0}")]
    IllegalAction(String),

    #[error("invalid target {target}: {reason}")]
    InvalidTarget { target: EntityId, reason: String },

    #[error("insufficient cost: need {required}, have {available}")]
    InsufficientCost { required: u32, available: u32 },

    #[error("{zone:?} of {player} is full")]
    ZoneCapacity { zone: Zone, player: PlayerId },

    #[error("loop guard exceeded on {kind:?} after {count} actions")]
    LoopGuardExceeded { kind: ActionKind, count: u64 },

    #[error("decision provider failed: {0}")]
    DecisionProvider(#[from] DecisionError),

    #[error(transparent)]
    Zone(ZoneError),

    #[error("invalid deck: {0}")]
    InvalidDeck(String),

    #[error("snapshot failed: {0}")]
    Snapshot(String),
}

impl From<ZoneError> for EngineError {
    fn from(err: ZoneError) -> Self {
        match err {
            ZoneError::Capacity { zone, player } => EngineError::ZoneCapacity { zone, player },
            other => EngineError::Zone(other),
        }
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
