//! Effect system for card abilities.
//!
//! - `EffectDefinition` / `EffectKind`: what a printed ability does
//! - `CostExpr` / `CostPayment`: what it costs, paid all-or-nothing
//! - `TargetSpec`: which cards it may pick
//! - `EffectHandlers` / `ScriptRegistry`: effect body execution
//! - `EffectSystem`: trigger collection, activation and stack resolution
//!
//! ## Design Philosophy
//!
//! Effect kinds are a closed enum dispatched by an exhaustive `match`, so
//! adding a kind is a compile error everywhere it must be handled. Card
//! text that the closed set cannot express goes through `EffectKind::Custom`
//! and a named script.

mod cost;
mod effect;
mod resolver;
mod system;
mod targeting;

pub use cost::{CostExpr, CostPayment, CostPlan, CostRequirements};
pub use effect::{
    ActivationWindow, EffectContext, EffectDefinition, EffectId, EffectInstance, EffectInstanceId,
    EffectKind, EffectOrigin, EffectTiming, TriggerTiming,
};
pub use resolver::{EffectHandlers, EffectScript, ScriptRegistry};
pub use system::EffectSystem;
pub use targeting::{TargetSide, TargetSpec};
