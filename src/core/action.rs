//! Player actions, the action history, and the loop guard.
//!
//! A `GameAction` is what the active player asks the engine to do during
//! their main phase. Every applied action is stamped into an `ActionRecord`
//! with its player, turn and a monotonically increasing tick.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::config::LoopGuardConfig;
use super::entity::EntityId;
use super::player::PlayerId;
use crate::effects::EffectId;
use crate::error::EngineError;

/// A main-phase action.
///
/// ## Example
///
/// ```
/// use opcg_rules::core::{ActionKind, EntityId, GameAction};
///
/// let attack = GameAction::DeclareAttack {
///     attacker: EntityId::new(3),
///     target: EntityId::new(60),
/// };
/// assert_eq!(attack.kind(), ActionKind::DeclareAttack);
/// assert!(!attack.ends_phase());
/// assert!(GameAction::EndPhase.ends_phase());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    /// Play a character, stage or event from hand.
    PlayCard { card: EntityId },

    /// Attach one ACTIVE DON!! from the cost area to a leader or character.
    GiveDon { target: EntityId },

    /// Start a battle.
    DeclareAttack { attacker: EntityId, target: EntityId },

    /// Use an activated main-window effect.
    ActivateEffect { card: EntityId, effect: EffectId },

    /// Yield the rest of the main phase.
    PassPriority,

    /// End the main phase.
    EndPhase,
}

impl GameAction {
    /// The loop-guard bucket for this action.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            GameAction::PlayCard { .. } => ActionKind::PlayCard,
            GameAction::GiveDon { .. } => ActionKind::GiveDon,
            GameAction::DeclareAttack { .. } => ActionKind::DeclareAttack,
            GameAction::ActivateEffect { .. } => ActionKind::ActivateEffect,
            GameAction::PassPriority => ActionKind::PassPriority,
            GameAction::EndPhase => ActionKind::EndPhase,
        }
    }

    /// Whether applying this action closes the main phase.
    #[must_use]
    pub fn ends_phase(&self) -> bool {
        matches!(self, GameAction::PassPriority | GameAction::EndPhase)
    }
}

/// Buckets counted by the loop guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    PlayCard,
    GiveDon,
    DeclareAttack,
    ActivateEffect,
    PassPriority,
    EndPhase,
    /// A counter card or counter event used during a battle.
    CounterAction,
    /// One effect popped off the resolution stack.
    EffectResolution,
}

/// A recorded action with metadata for history tracking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The player who took this action.
    pub player: PlayerId,

    /// The action taken.
    pub action: GameAction,

    /// Turn number when the action was taken.
    pub turn: u32,

    /// Game-wide ordering stamp.
    pub tick: u64,
}

impl ActionRecord {
    /// Create a new action record.
    #[must_use]
    pub fn new(player: PlayerId, action: GameAction, turn: u32, tick: u64) -> Self {
        Self {
            player,
            action,
            turn,
            tick,
        }
    }
}

/// Counters behind the runaway-safety fuse.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoopGuard {
    total: u64,
    per_kind: FxHashMap<ActionKind, u64>,
}

impl LoopGuard {
    /// Count one action of `kind`, failing once a configured maximum is
    /// exceeded.
    pub fn record(&mut self, kind: ActionKind, limits: &LoopGuardConfig) -> Result<(), EngineError> {
        self.total += 1;
        let count = self.per_kind.entry(kind).or_insert(0);
        *count += 1;

        if self.total > limits.max_total_actions {
            return Err(EngineError::LoopGuardExceeded {
                kind,
                count: self.total,
            });
        }
        if *count > limits.max_per_kind {
            return Err(EngineError::LoopGuardExceeded {
                kind,
                count: *count,
            });
        }
        Ok(())
    }

    /// Total counted actions.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Counted actions of one kind.
    #[must_use]
    pub fn count(&self, kind: ActionKind) -> u64 {
        self.per_kind.get(&kind).copied().unwrap_or(0)
    }
}
