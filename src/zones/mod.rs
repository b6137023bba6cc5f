//! Zone system for card locations.
//!
//! Zones are a fixed set (`core::Zone`); each player's zone contents live in
//! `PlayerState`. All movement goes through `ZoneManager`.
//!
//! ## Key Types
//!
//! - `ZoneManager`: validated moves, orientation changes, DON!! attachment
//! - `ZonePosition`: where a moved card is inserted
//! - `ZoneMove`: what a successful move did

pub mod manager;

pub use manager::{ZoneManager, ZoneMove, ZonePosition};

pub use crate::core::Zone;
