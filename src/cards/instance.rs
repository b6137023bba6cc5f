//! Card instances - runtime card state.
//!
//! `CardInstance` is one physical card in one game. It is created when the
//! decks are built and is never deleted; through play it only changes zone,
//! orientation, controller, attachments and modifiers.
//!
//! Derived values that need the definition (effective power, keywords
//! granted on top of printed ones) are computed by `GameState`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::definition::{CardId, Keyword};
use crate::core::{EntityId, PlayerId, Zone};
use crate::effects::EffectId;

/// Card orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardState {
    Active,
    Rested,
    /// Outside the zones where orientation matters.
    #[default]
    None,
}

/// How long a modifier lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expiry {
    EndOfBattle,
    EndOfTurn,
    /// Until the card leaves play.
    Permanent,
}

/// What a modifier changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    Power(i64),
    Keyword(Keyword),
}

/// A temporary change applied by a counter or an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub expiry: Expiry,
    /// The card that created it, if any.
    pub source: Option<EntityId>,
}

impl Modifier {
    /// A power change.
    #[must_use]
    pub const fn power(amount: i64, expiry: Expiry) -> Self {
        Self {
            kind: ModifierKind::Power(amount),
            expiry,
            source: None,
        }
    }

    /// A granted keyword.
    #[must_use]
    pub const fn keyword(keyword: Keyword, expiry: Expiry) -> Self {
        Self {
            kind: ModifierKind::Keyword(keyword),
            expiry,
            source: None,
        }
    }

    /// Record the creating card.
    #[must_use]
    pub const fn from_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }
}

/// Flags reset at the start of every turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnFlags {
    /// Attacks declared this turn.
    pub attacks_made: u8,
    /// Once-per-turn effects already used.
    pub used_effects: SmallVec<[EffectId; 2]>,
}

/// A card instance in a game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique entity ID for this instance.
    pub entity_id: EntityId,

    /// Reference to the card definition.
    pub card_id: CardId,

    /// Who started the game with this card.
    pub owner: PlayerId,

    /// Who currently controls it. Equals `owner` outside play.
    pub controller: PlayerId,

    pub zone: Zone,

    pub state: CardState,

    /// Face-down (life cards).
    pub face_down: bool,

    /// Turn on which the card last entered play.
    pub entered_turn: Option<u32>,

    /// DON!! cards given to this card.
    pub attached_don: SmallVec<[EntityId; 4]>,

    /// Host card while in `Zone::Attached`.
    pub attached_to: Option<EntityId>,

    pub modifiers: Vec<Modifier>,

    pub flags: TurnFlags,
}

impl CardInstance {
    /// Create an instance owned and controlled by `owner`.
    #[must_use]
    pub fn new(entity_id: EntityId, card_id: CardId, owner: PlayerId, zone: Zone) -> Self {
        Self {
            entity_id,
            card_id,
            owner,
            controller: owner,
            zone,
            state: CardState::None,
            face_down: zone == Zone::Life,
            entered_turn: None,
            attached_don: SmallVec::new(),
            attached_to: None,
            modifiers: Vec::new(),
            flags: TurnFlags::default(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == CardState::Active
    }

    #[must_use]
    pub fn is_rested(&self) -> bool {
        self.state == CardState::Rested
    }

    #[must_use]
    pub fn is_in_play(&self) -> bool {
        self.zone.is_in_play()
    }

    /// The player whose zone sequence lists this card.
    ///
    /// Private zones belong to the owner, play areas to the controller.
    #[must_use]
    pub fn zone_holder(&self) -> PlayerId {
        if self.zone.is_private() {
            self.owner
        } else {
            self.controller
        }
    }

    /// Sum of power modifiers.
    #[must_use]
    pub fn power_modifier(&self) -> i64 {
        self.modifiers
            .iter()
            .map(|m| match m.kind {
                ModifierKind::Power(amount) => amount,
                ModifierKind::Keyword(_) => 0,
            })
            .sum()
    }

    /// Whether a modifier grants `keyword`.
    #[must_use]
    pub fn has_granted_keyword(&self, keyword: Keyword) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.kind == ModifierKind::Keyword(keyword))
    }

    /// Drop every modifier with the given expiry. Returns how many were removed.
    pub fn expire(&mut self, expiry: Expiry) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.expiry != expiry);
        before - self.modifiers.len()
    }

    /// Whether a once-per-turn effect was already used this turn.
    #[must_use]
    pub fn used_effect(&self, effect: EffectId) -> bool {
        self.flags.used_effects.contains(&effect)
    }

    pub fn mark_effect_used(&mut self, effect: EffectId) {
        if !self.used_effect(effect) {
            self.flags.used_effects.push(effect);
        }
    }

    /// Clear per-turn flags.
    pub fn reset_turn_flags(&mut self) {
        self.flags = TurnFlags::default();
    }
}
