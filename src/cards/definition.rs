//! Card definitions - static card data.
//!
//! `CardDefinition` holds the immutable properties of a printed card:
//! category, cost, power, counter value, life, keywords and effects.
//! Per-game mutable data (zone, orientation, attached DON!!, modifiers)
//! lives in `CardInstance`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::effects::{ActivationWindow, EffectDefinition, EffectId, EffectTiming, TriggerTiming};

/// Unique identifier for a card definition.
///
/// This identifies the printed card, not a copy of it in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Card category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardCategory {
    Leader,
    Character,
    Event,
    Stage,
    Don,
}

/// Keyword abilities the rules engine understands natively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    /// May attack the turn it is played.
    Rush,
    /// May redirect an attack to itself.
    Blocker,
    /// Deals two life damage to a leader.
    DoubleAttack,
    /// Life damage goes to trash and skips life triggers.
    Banish,
    /// Cannot be blocked.
    Unblockable,
    /// May attack twice per turn.
    ExtraAttack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Purple,
    Black,
    Yellow,
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use opcg_rules::cards::{CardCategory, CardDefinition, CardId, Keyword};
///
/// let guard = CardDefinition::character(CardId::new(3), "Harbor Guard", 2, 3000)
///     .with_counter(1000)
///     .with_keyword(Keyword::Blocker);
///
/// assert_eq!(guard.category, CardCategory::Character);
/// assert!(guard.has_keyword(Keyword::Blocker));
/// assert!(!guard.has_keyword(Keyword::Rush));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique identifier for this card definition.
    pub id: CardId,

    /// Card name (for display/debugging).
    pub name: String,

    pub category: CardCategory,

    /// DON!! required to play the card.
    pub cost: u32,

    /// Printed power.
    pub power: i64,

    /// Power added when used as a counter from hand.
    pub counter: i64,

    /// Life cards dealt at setup (leaders only).
    pub life: u32,

    pub keywords: SmallVec<[Keyword; 4]>,

    pub effects: Vec<EffectDefinition>,

    pub colors: SmallVec<[Color; 2]>,

    /// Type tags ("Supernovas", "Navy", ...).
    pub types: Vec<String>,
}

impl CardDefinition {
    /// Create a new card definition with zeroed stats.
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>, category: CardCategory) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            cost: 0,
            power: 0,
            counter: 0,
            life: 0,
            keywords: SmallVec::new(),
            effects: Vec::new(),
            colors: SmallVec::new(),
            types: Vec::new(),
        }
    }

    /// A leader with the given power and life.
    #[must_use]
    pub fn leader(id: CardId, name: impl Into<String>, power: i64, life: u32) -> Self {
        Self::new(id, name, CardCategory::Leader)
            .with_power(power)
            .with_life(life)
    }

    /// A character with the given cost and power.
    #[must_use]
    pub fn character(id: CardId, name: impl Into<String>, cost: u32, power: i64) -> Self {
        Self::new(id, name, CardCategory::Character)
            .with_cost(cost)
            .with_power(power)
    }

    /// An event with the given cost.
    #[must_use]
    pub fn event(id: CardId, name: impl Into<String>, cost: u32) -> Self {
        Self::new(id, name, CardCategory::Event).with_cost(cost)
    }

    /// A stage with the given cost.
    #[must_use]
    pub fn stage(id: CardId, name: impl Into<String>, cost: u32) -> Self {
        Self::new(id, name, CardCategory::Stage).with_cost(cost)
    }

    /// A DON!! card.
    #[must_use]
    pub fn don(id: CardId) -> Self {
        Self::new(id, "DON!!", CardCategory::Don)
    }

    #[must_use]
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: i64) -> Self {
        self.power = power;
        self
    }

    #[must_use]
    pub fn with_counter(mut self, counter: i64) -> Self {
        self.counter = counter;
        self
    }

    #[must_use]
    pub fn with_life(mut self, life: u32) -> Self {
        self.life = life;
        self
    }

    /// Add a keyword (builder pattern).
    #[must_use]
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        if !self.keywords.contains(&keyword) {
            self.keywords.push(keyword);
        }
        self
    }

    /// Add an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: EffectDefinition) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.colors.push(color);
        self
    }

    #[must_use]
    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.types.push(tag.into());
        self
    }

    /// Check the printed keywords.
    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    /// Look up an effect by id.
    #[must_use]
    pub fn effect(&self, id: EffectId) -> Option<&EffectDefinition> {
        self.effects.iter().find(|e| e.id == id)
    }

    /// Auto effects with their index on the card.
    pub fn auto_effects(&self) -> impl Iterator<Item = (usize, &EffectDefinition, TriggerTiming)> {
        self.effects.iter().enumerate().filter_map(|(i, e)| match e.timing {
            EffectTiming::Auto(timing) => Some((i, e, timing)),
            EffectTiming::Activated(_) => None,
        })
    }

    /// Activated effects usable in the given window.
    pub fn activated_effects(
        &self,
        window: ActivationWindow,
    ) -> impl Iterator<Item = &EffectDefinition> {
        self.effects
            .iter()
            .filter(move |e| e.timing == EffectTiming::Activated(window))
    }

    /// The [Trigger] effect revealed when this card is taken as life damage.
    #[must_use]
    pub fn life_trigger(&self) -> Option<&EffectDefinition> {
        self.effects
            .iter()
            .find(|e| e.timing == EffectTiming::Auto(TriggerTiming::LifeTrigger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;

    #[test]
    fn test_card_id() {
        let id = CardId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "Card(42)");
    }

    #[test]
    fn test_leader_builder() {
        let leader = CardDefinition::leader(CardId::new(1), "Captain", 5000, 4)
            .with_color(Color::Red)
            .with_type("Straw Hat Crew");

        assert_eq!(leader.category, CardCategory::Leader);
        assert_eq!(leader.power, 5000);
        assert_eq!(leader.life, 4);
        assert_eq!(leader.colors.as_slice(), &[Color::Red]);
        assert_eq!(leader.types, vec!["Straw Hat Crew".to_string()]);
    }

    #[test]
    fn test_keyword_dedup() {
        let card = CardDefinition::character(CardId::new(2), "Runner", 1, 2000)
            .with_keyword(Keyword::Rush)
            .with_keyword(Keyword::Rush);
        assert_eq!(card.keywords.len(), 1);
    }

    #[test]
    fn test_effect_lookup() {
        let card = CardDefinition::character(CardId::new(3), "Scout", 2, 3000)
            .with_effect(EffectDefinition::auto(
                1,
                "On Play: draw 1",
                TriggerTiming::OnPlay,
                EffectKind::Draw { count: 1 },
            ))
            .with_effect(EffectDefinition::auto(
                2,
                "Trigger: draw 1",
                TriggerTiming::LifeTrigger,
                EffectKind::Draw { count: 1 },
            ))
            .with_effect(EffectDefinition::activated(
                3,
                "Main: draw 1",
                ActivationWindow::Main,
                EffectKind::Draw { count: 1 },
            ));

        assert!(card.effect(EffectId::new(3)).is_some());
        assert!(card.effect(EffectId::new(9)).is_none());
        assert_eq!(card.auto_effects().count(), 2);
        assert_eq!(card.activated_effects(ActivationWindow::Main).count(), 1);
        assert_eq!(card.activated_effects(ActivationWindow::Counter).count(), 0);
        assert_eq!(card.life_trigger().map(|e| e.id), Some(EffectId::new(2)));
    }

    #[test]
    fn test_card_definition_serialization() {
        let card = CardDefinition::event(CardId::new(4), "Gum-Gum", 1).with_counter(0);

        let json = serde_json::to_string(&card).unwrap();
        let deserialized: CardDefinition = serde_json::from_str(&json).unwrap();

        assert_eq!(card, deserialized);
    }
}
