//! Engine configuration and the fixed vocabulary of zones and phases.
//!
//! - `Zone`: the named areas a card instance can occupy
//! - `Phase`: the steps of the turn state machine
//! - `EngineConfig`: seed, rule toggles, limits and decision timeouts
//!
//! Nothing here is global: a config is handed to `GameEngine::new` and
//! shared read-only through the game state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// A named area holding card instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Main deck (top = end of the sequence).
    Deck,
    Hand,
    Trash,
    /// Face-down life cards (top = end of the sequence).
    Life,
    DonDeck,
    /// DON!! cards available for costs.
    CostArea,
    /// Single slot.
    Leader,
    Character,
    /// Single slot.
    Stage,
    /// A DON!! card given to a leader or character.
    Attached,
}

impl Zone {
    /// Zones whose cards are "in play" (can attack, block, be targeted).
    #[must_use]
    pub const fn is_in_play(self) -> bool {
        matches!(self, Zone::Leader | Zone::Character | Zone::Stage)
    }

    /// Zones where ACTIVE/RESTED orientation is meaningful.
    #[must_use]
    pub const fn tracks_orientation(self) -> bool {
        matches!(
            self,
            Zone::CostArea | Zone::Leader | Zone::Character | Zone::Stage
        )
    }

    /// Zones that only ever hold their owner's cards.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(
            self,
            Zone::Deck | Zone::Hand | Zone::Trash | Zone::Life | Zone::DonDeck
        )
    }

    /// Zones with room for exactly one card.
    #[must_use]
    pub const fn is_single_slot(self) -> bool {
        matches!(self, Zone::Leader | Zone::Stage)
    }
}

/// Turn state machine phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Before the first turn: shuffle, opening hands, mulligans, life.
    #[default]
    Setup,
    Refresh,
    Draw,
    Don,
    Main,
    End,
    GameOver,
}

/// Runaway-safety limits.
///
/// Every applied action and every effect resolution counts towards these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopGuardConfig {
    /// Maximum actions of any kind in one game.
    pub max_total_actions: u64,
    /// Maximum actions of a single kind in one game.
    pub max_per_kind: u64,
}

impl Default for LoopGuardConfig {
    fn default() -> Self {
        Self {
            max_total_actions: 10_000,
            max_per_kind: 5_000,
        }
    }
}

/// Maximum wait for each decision category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTimeouts {
    pub action: Duration,
    pub mulligan: Duration,
    pub blocker: Duration,
    pub counter: Duration,
    pub target: Duration,
    pub value: Duration,
}

impl DecisionTimeouts {
    /// Use the same limit for every category.
    #[must_use]
    pub const fn uniform(limit: Duration) -> Self {
        Self {
            action: limit,
            mulligan: limit,
            blocker: limit,
            counter: limit,
            target: limit,
            value: limit,
        }
    }
}

impl Default for DecisionTimeouts {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(30))
    }
}

/// Complete engine configuration.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use opcg_rules::core::{EngineConfig, PlayerId};
///
/// let config = EngineConfig::default()
///     .with_seed(7)
///     .with_first_player(PlayerId::new(1))
///     .with_decision_timeout(Duration::from_millis(250));
///
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.starting_hand_size, 5);
/// assert_eq!(config.timeouts.blocker, Duration::from_millis(250));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed for deck shuffles.
    pub seed: u64,

    /// Seat that takes the first turn.
    pub first_player: PlayerId,

    /// Opening hand size.
    pub starting_hand_size: usize,

    /// DON!! cards per DON deck.
    pub don_deck_size: usize,

    /// DON!! added in the DON phase.
    pub don_per_turn: usize,

    /// DON!! added in the first player's first DON phase.
    pub first_turn_don: usize,

    /// Power granted per attached DON!! during its controller's turn.
    pub don_power: i64,

    /// Maximum characters in a character area.
    pub character_area_limit: usize,

    /// Whether players may attack during their own first turn.
    pub allow_first_turn_attacks: bool,

    pub loop_guard: LoopGuardConfig,

    pub timeouts: DecisionTimeouts,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            first_player: PlayerId::new(0),
            starting_hand_size: 5,
            don_deck_size: 10,
            don_per_turn: 2,
            first_turn_don: 1,
            don_power: 1000,
            character_area_limit: 5,
            allow_first_turn_attacks: false,
            loop_guard: LoopGuardConfig::default(),
            timeouts: DecisionTimeouts::default(),
        }
    }
}

impl EngineConfig {
    /// Set the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the seat that goes first.
    #[must_use]
    pub fn with_first_player(mut self, player: PlayerId) -> Self {
        self.first_player = player;
        self
    }

    /// Set the opening hand size.
    #[must_use]
    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.starting_hand_size = size;
        self
    }

    /// Set the DON!! deck size.
    #[must_use]
    pub fn with_don_deck_size(mut self, size: usize) -> Self {
        self.don_deck_size = size;
        self
    }

    /// Set the character area limit.
    #[must_use]
    pub fn with_character_limit(mut self, limit: usize) -> Self {
        self.character_area_limit = limit;
        self
    }

    /// Allow attacks on each player's first turn.
    #[must_use]
    pub fn allow_first_turn_attacks(mut self) -> Self {
        self.allow_first_turn_attacks = true;
        self
    }

    /// Set the loop-guard limits.
    #[must_use]
    pub fn with_loop_guard(mut self, max_total_actions: u64, max_per_kind: u64) -> Self {
        self.loop_guard = LoopGuardConfig {
            max_total_actions,
            max_per_kind,
        };
        self
    }

    /// Set per-category decision timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: DecisionTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Use one timeout for every decision category.
    #[must_use]
    pub fn with_decision_timeout(mut self, limit: Duration) -> Self {
        self.timeouts = DecisionTimeouts::uniform(limit);
        self
    }
}
