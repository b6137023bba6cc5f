//! Player decisions.
//!
//! The engine never blocks on a player directly: every question goes
//! through a `DecisionGate`, which bounds the wait and substitutes a safe
//! default when the answer is late, malformed or not among the options.

mod gate;
mod player;
mod providers;

pub use gate::DecisionGate;
pub use player::{CounterAction, Player};
pub use providers::{FirstLegalPlayer, RandomPlayer, ScriptedPlayer};
