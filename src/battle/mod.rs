//! Battle resolution.
//!
//! A battle walks `AttackDeclared → BlockStep → CounterStep → DamageStep →
//! BattleEnd` and lives in `GameState::battle` while it runs. Leaving play
//! mid-battle (attacker or current target) aborts the remaining steps
//! without undoing the completed ones.

mod resolver;

pub use resolver::BattleResolver;

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

/// Battle state machine step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleStep {
    #[default]
    Idle,
    AttackDeclared,
    BlockStep,
    CounterStep,
    DamageStep,
    BattleEnd,
}

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// The targeted character was K.O.'d.
    TargetKo,
    /// The targeted leader lost `amount` life cards.
    LifeDamage { amount: u32 },
    /// The attacker's power was lower than the target's.
    Repelled,
    /// The attacker or target left play before damage.
    Aborted,
}

/// A battle in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub attacker: EntityId,
    /// The target chosen at declaration.
    pub original_target: EntityId,
    /// The current target (the blocker after a block).
    pub target: EntityId,
    pub attacking_player: PlayerId,
    pub defending_player: PlayerId,
    pub step: BattleStep,
    pub blocked_by: Option<EntityId>,
}

impl Battle {
    #[must_use]
    pub fn new(attacker: EntityId, target: EntityId, attacking_player: PlayerId) -> Self {
        Self {
            attacker,
            original_target: target,
            target,
            attacking_player,
            defending_player: attacking_player.opponent(),
            step: BattleStep::AttackDeclared,
            blocked_by: None,
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.blocked_by.is_some()
    }
}
