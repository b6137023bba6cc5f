//! Card system: definitions, instances, registry and deck lists.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for card definitions
//! - `CardDefinition`: Printed card data (category, cost, power, keywords, effects)
//! - `CardInstance`: Runtime card state (zone, orientation, attachments, modifiers)
//! - `CardRegistry`: Card definition lookup
//! - `DeckList`: Leader + main deck + DON!! card used to build a game

pub mod definition;
pub mod deck;
pub mod instance;
pub mod registry;

pub use definition::{CardCategory, CardDefinition, CardId, Color, Keyword};
pub use deck::DeckList;
pub use instance::{CardInstance, CardState, Expiry, Modifier, ModifierKind, TurnFlags};
pub use registry::CardRegistry;
