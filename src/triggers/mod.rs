//! Events, conditions and the trigger registry.
//!
//! ## Key Types
//!
//! - `GameEvent` / `EventLog`: the append-only record of everything that happened
//! - `Condition`: predicates checked when an effect triggers and when it resolves
//! - `TriggerRegistry`: auto effects indexed by timing, matched against logged events

pub mod condition;
pub mod event;
pub mod registry;

pub use condition::{Condition, ConditionEvaluator};
pub use event::{EventLog, EventRecord, GameEvent, GameOverReason, ResolutionOutcome};
pub use registry::{RegisteredTrigger, TriggerId, TriggerMatch, TriggerRegistry};
