//! Effect definitions and effect instances.
//!
//! An `EffectDefinition` is printed on a card: when it happens (`EffectTiming`),
//! what must hold (`Condition`), what it costs (`CostExpr`) and what it does
//! (`EffectKind`). An `EffectInstance` is one pending use of a definition on
//! the resolution stack, with its source, controller and chosen targets.
//!
//! ## Effect Kinds
//!
//! `EffectKind` is a closed set. Each variant is executed by a dedicated
//! handler in `EffectHandlers`; only `Custom` goes through the name-keyed
//! `ScriptRegistry`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::cost::CostExpr;
use super::targeting::TargetSpec;
use crate::cards::{CardState, Expiry, Keyword};
use crate::core::{EntityId, PlayerId};
use crate::triggers::Condition;

/// Identifier of an effect within its card definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u16);

impl EffectId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// Game events an auto effect reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerTiming {
    /// [On Play]: this card was played.
    OnPlay,
    /// [When Attacking]: this card declared an attack.
    WhenAttacking,
    /// [On Your Opponent's Attack]: the opponent declared an attack.
    OnOpponentAttack,
    /// [On Block]: this card blocked.
    OnBlock,
    /// [On K.O.]: this card was K.O.'d.
    OnKo,
    /// Start of its controller's turn.
    StartOfTurn,
    /// [End of Your Turn].
    EndOfTurn,
    /// [Trigger]: revealed from life.
    LifeTrigger,
}

/// When an activated effect may be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationWindow {
    /// [Activate: Main], or the body of a main-phase event.
    Main,
    /// [Counter] events played during a battle's counter step.
    Counter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTiming {
    Auto(TriggerTiming),
    Activated(ActivationWindow),
}

/// What an effect does once its cost is paid and targets are chosen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Draw `count` cards.
    Draw { count: u32 },

    /// Draw 0..=`max` cards; the controller picks the number.
    DrawUpTo { max: u32 },

    /// Add power to each target.
    PowerBoost {
        amount: i64,
        target: TargetSpec,
        expiry: Expiry,
    },

    /// Grant a keyword to each target.
    GrantKeyword {
        keyword: Keyword,
        target: TargetSpec,
        expiry: Expiry,
    },

    /// K.O. each target.
    KoCharacter { target: TargetSpec },

    /// Return each target to its owner's hand.
    ReturnToHand { target: TargetSpec },

    /// Rest each target.
    RestTarget { target: TargetSpec },

    /// Set each target active.
    SetActive { target: TargetSpec },

    /// Move DON!! from the DON deck to the cost area.
    AddDon { count: u32, state: CardState },

    /// Move cards from the top of the deck to the top of life.
    AddLifeFromDeck { count: u32 },

    /// Run a registered script.
    Custom { script: String },
}

impl EffectKind {
    /// Targeting requirements, if the effect chooses targets.
    #[must_use]
    pub fn target_spec(&self) -> Option<&TargetSpec> {
        match self {
            EffectKind::PowerBoost { target, .. }
            | EffectKind::GrantKeyword { target, .. }
            | EffectKind::KoCharacter { target }
            | EffectKind::ReturnToHand { target }
            | EffectKind::RestTarget { target }
            | EffectKind::SetActive { target } => Some(target),
            EffectKind::Draw { .. }
            | EffectKind::DrawUpTo { .. }
            | EffectKind::AddDon { .. }
            | EffectKind::AddLifeFromDeck { .. }
            | EffectKind::Custom { .. } => None,
        }
    }

    /// Numeric choices, if the effect asks for one.
    ///
    /// ```
    /// use opcg_rules::effects::EffectKind;
    ///
    /// assert_eq!(EffectKind::DrawUpTo { max: 2 }.value_options(), Some(vec![2, 1, 0]));
    /// assert_eq!(EffectKind::Draw { count: 1 }.value_options(), None);
    /// ```
    #[must_use]
    pub fn value_options(&self) -> Option<Vec<i64>> {
        match self {
            EffectKind::DrawUpTo { max } => Some((0..=i64::from(*max)).rev().collect()),
            _ => None,
        }
    }
}

/// A printed effect.
///
/// ## Example
///
/// ```
/// use opcg_rules::effects::{CostExpr, EffectDefinition, EffectKind, TriggerTiming};
///
/// let effect = EffectDefinition::auto(1, "On Play: draw 2", TriggerTiming::OnPlay,
///         EffectKind::Draw { count: 2 })
///     .with_cost(CostExpr::RestDon(1))
///     .once_per_turn();
///
/// assert!(effect.once_per_turn);
/// assert!(effect.is_auto());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub id: EffectId,

    /// Human-readable text (for logs and UIs).
    pub label: String,

    pub timing: EffectTiming,

    /// Must hold when triggered and again when resolved.
    pub condition: Option<Condition>,

    pub cost: Option<CostExpr>,

    pub kind: EffectKind,

    pub once_per_turn: bool,
}

impl EffectDefinition {
    /// Create an effect with explicit timing.
    #[must_use]
    pub fn new(id: u16, label: impl Into<String>, timing: EffectTiming, kind: EffectKind) -> Self {
        Self {
            id: EffectId::new(id),
            label: label.into(),
            timing,
            condition: None,
            cost: None,
            kind,
            once_per_turn: false,
        }
    }

    /// An auto effect fired by `timing`.
    #[must_use]
    pub fn auto(id: u16, label: impl Into<String>, timing: TriggerTiming, kind: EffectKind) -> Self {
        Self::new(id, label, EffectTiming::Auto(timing), kind)
    }

    /// An activated effect used in `window`.
    #[must_use]
    pub fn activated(
        id: u16,
        label: impl Into<String>,
        window: ActivationWindow,
        kind: EffectKind,
    ) -> Self {
        Self::new(id, label, EffectTiming::Activated(window), kind)
    }

    /// Set the condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Set the cost (builder pattern).
    #[must_use]
    pub fn with_cost(mut self, cost: CostExpr) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Limit to one use per turn (builder pattern).
    #[must_use]
    pub fn once_per_turn(mut self) -> Self {
        self.once_per_turn = true;
        self
    }

    #[must_use]
    pub fn is_auto(&self) -> bool {
        matches!(self.timing, EffectTiming::Auto(_))
    }
}

/// Unique identifier of an effect instance within a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectInstanceId(pub u32);

impl std::fmt::Display for EffectInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EffectInstance({})", self.0)
    }
}

/// How an instance got onto the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectOrigin {
    /// An auto effect matched a game event.
    Triggered,
    /// A player activated it (or played the event carrying it).
    Activated,
    /// A counter event played during a battle.
    Counter,
    /// A [Trigger] revealed from life.
    Life,
}

/// Resolution context of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectContext {
    pub origin: EffectOrigin,
    /// Sequence number of the event that triggered it.
    pub trigger_event: Option<u64>,
}

/// One pending use of an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectInstance {
    pub id: EffectInstanceId,
    pub definition: EffectDefinition,
    pub source: EntityId,
    pub controller: PlayerId,
    /// Targets chosen at resolution.
    pub targets: SmallVec<[EntityId; 4]>,
    /// Number chosen at resolution (e.g. how many to draw).
    pub chosen_value: Option<i64>,
    pub context: EffectContext,
}

impl EffectInstance {
    #[must_use]
    pub fn new(
        id: EffectInstanceId,
        definition: EffectDefinition,
        source: EntityId,
        controller: PlayerId,
        origin: EffectOrigin,
    ) -> Self {
        Self {
            id,
            definition,
            source,
            controller,
            targets: SmallVec::new(),
            chosen_value: None,
            context: EffectContext {
                origin,
                trigger_event: None,
            },
        }
    }

    /// Record the triggering event (builder pattern).
    #[must_use]
    pub fn triggered_by(mut self, seq: u64) -> Self {
        self.context.trigger_event = Some(seq);
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.definition.label
    }
}
