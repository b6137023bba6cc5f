//! Game events and the append-only event log.
//!
//! Every observable change in a game is recorded as a `GameEvent` wrapped in
//! an `EventRecord` carrying a sequence number and the turn it happened on.
//! The log is never rewritten: the effect system scans it with a cursor to
//! raise triggers, and the engine's event bus forwards each record to
//! subscribers exactly once.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::battle::BattleOutcome;
use crate::cards::CardState;
use crate::core::{EntityId, Phase, PlayerId, Zone};
use crate::effects::EffectInstanceId;

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    /// A player took damage down to zero life cards.
    LifeDepleted,
    /// A player had to draw from an empty deck.
    DeckedOut,
    /// The loop guard stopped the match.
    LoopGuard,
}

/// How an effect instance left the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    Resolved,
    /// Its condition no longer held, or it had no legal target.
    Fizzled,
    /// Its cost could not be paid.
    CostUnpaid,
    /// Its body failed to execute.
    Failed(String),
}

/// Something that happened in a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted {
        first_player: PlayerId,
    },
    MulliganResolved {
        player: PlayerId,
        mulliganed: bool,
    },
    TurnStarted {
        player: PlayerId,
        turn: u32,
    },
    PhaseChanged {
        player: PlayerId,
        phase: Phase,
    },
    CardDrawn {
        player: PlayerId,
        card: EntityId,
    },
    /// A card changed zone. `player` is the holder of the destination.
    CardMoved {
        card: EntityId,
        from: Zone,
        to: Zone,
        player: PlayerId,
    },
    CardStateChanged {
        card: EntityId,
        from: CardState,
        to: CardState,
    },
    DonAdded {
        player: PlayerId,
        don: EntityId,
    },
    CardPlayed {
        player: PlayerId,
        card: EntityId,
        zone: Zone,
    },
    DonGiven {
        player: PlayerId,
        don: EntityId,
        target: EntityId,
    },
    AttackDeclared {
        player: PlayerId,
        attacker: EntityId,
        target: EntityId,
    },
    BlockDeclared {
        player: PlayerId,
        blocker: EntityId,
        attacker: EntityId,
        original_target: EntityId,
    },
    CounterUsed {
        player: PlayerId,
        card: EntityId,
        target: EntityId,
        amount: i64,
    },
    BattleEnd {
        attacker: EntityId,
        defender: EntityId,
        outcome: BattleOutcome,
    },
    CardKo {
        card: EntityId,
        owner: PlayerId,
        by: Option<EntityId>,
    },
    LifeDamage {
        player: PlayerId,
        card: EntityId,
        remaining: usize,
    },
    EffectTriggered {
        instance: EffectInstanceId,
        source: EntityId,
        controller: PlayerId,
    },
    EffectResolved {
        instance: EffectInstanceId,
        source: EntityId,
        outcome: ResolutionOutcome,
    },
    GameOver {
        winner: Option<PlayerId>,
        reason: GameOverReason,
    },
    /// A refused action or a decision fault.
    Error {
        player: Option<PlayerId>,
        message: String,
    },
}

impl GameEvent {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GameStarted { .. } => "GameStarted",
            GameEvent::MulliganResolved { .. } => "MulliganResolved",
            GameEvent::TurnStarted { .. } => "TurnStarted",
            GameEvent::PhaseChanged { .. } => "PhaseChanged",
            GameEvent::CardDrawn { .. } => "CardDrawn",
            GameEvent::CardMoved { .. } => "CardMoved",
            GameEvent::CardStateChanged { .. } => "CardStateChanged",
            GameEvent::DonAdded { .. } => "DonAdded",
            GameEvent::CardPlayed { .. } => "CardPlayed",
            GameEvent::DonGiven { .. } => "DonGiven",
            GameEvent::AttackDeclared { .. } => "AttackDeclared",
            GameEvent::BlockDeclared { .. } => "BlockDeclared",
            GameEvent::CounterUsed { .. } => "CounterUsed",
            GameEvent::BattleEnd { .. } => "BattleEnd",
            GameEvent::CardKo { .. } => "CardKo",
            GameEvent::LifeDamage { .. } => "LifeDamage",
            GameEvent::EffectTriggered { .. } => "EffectTriggered",
            GameEvent::EffectResolved { .. } => "EffectResolved",
            GameEvent::GameOver { .. } => "GameOver",
            GameEvent::Error { .. } => "Error",
        }
    }
}

/// A logged event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub seq: u64,
    pub turn: u32,
    pub event: GameEvent,
}

/// Append-only event log.
///
/// ## Example
///
/// ```
/// use opcg_rules::core::PlayerId;
/// use opcg_rules::triggers::{EventLog, GameEvent};
///
/// let mut log = EventLog::new();
/// let seq = log.push(1, GameEvent::TurnStarted { player: PlayerId::new(0), turn: 1 });
///
/// assert_eq!(seq, 0);
/// assert_eq!(log.len(), 1);
/// assert_eq!(log.get(0).map(|r| r.turn), Some(1));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vector<EventRecord>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning its sequence number.
    pub fn push(&mut self, turn: u32, event: GameEvent) -> u64 {
        let seq = self.records.len() as u64;
        self.records.push_back(EventRecord { seq, turn, event });
        seq
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        self.records.get(index)
    }

    #[must_use]
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// Records from `start` (inclusive) to the end.
    pub fn since(&self, start: usize) -> impl Iterator<Item = &EventRecord> {
        self.records.iter().skip(start)
    }

    /// Events only, in order.
    pub fn events(&self) -> impl Iterator<Item = &GameEvent> {
        self.records.iter().map(|r| &r.event)
    }

    /// Number of events matching a predicate.
    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events().filter(|e| pred(e)).count()
    }
}
