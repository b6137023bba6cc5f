//! The game engine and the main-phase rules around it.
//!
//! - `GameEngine`: setup, the turn/phase loop, action application, win check
//! - `LegalActions`: pure enumeration and validation of main-phase actions
//! - `EventBus`: forwards event-log records to subscribers exactly once

mod bus;
mod engine;
mod legal;

pub use bus::EventBus;
pub use engine::{GameEngine, GameResult};
pub use legal::LegalActions;
