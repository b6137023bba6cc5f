//! Cost expressions and atomic cost payment.
//!
//! Payment runs in two passes. The first pass sums the requirement of every
//! sub-cost and picks the exact cards that will pay it; if anything is
//! short, nothing is touched. The second pass applies the picks.
//!
//! Picks are deterministic:
//! - `RestDon`: ACTIVE DON!! in cost-area order
//! - `TrashCard`: hand cards, last card first
//! - `RestCard`: the source card first when eligible, then ACTIVE
//!   characters in board order

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::cards::CardState;
use crate::core::{EntityId, GameState, PlayerId, Zone};
use crate::error::ZoneError;
use crate::zones::{ZoneManager, ZonePosition};

/// A cost printed on an effect (or the DON!! cost of playing a card).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostExpr {
    /// Rest N active DON!! from the cost area.
    RestDon(u32),
    /// Trash N cards from hand.
    TrashCard(u32),
    /// Rest N of your active cards in play.
    RestCard(u32),
    /// All of the listed costs, or none of them.
    Composite(Vec<CostExpr>),
}

/// Aggregate amounts of a cost expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostRequirements {
    pub rest_don: u32,
    pub trash_card: u32,
    pub rest_card: u32,
}

impl CostExpr {
    /// Sum the requirements of every sub-cost.
    ///
    /// ```
    /// use opcg_rules::effects::CostExpr;
    ///
    /// let cost = CostExpr::Composite(vec![
    ///     CostExpr::RestDon(2),
    ///     CostExpr::Composite(vec![CostExpr::RestDon(1), CostExpr::TrashCard(1)]),
    /// ]);
    /// let req = cost.requirements();
    /// assert_eq!(req.rest_don, 3);
    /// assert_eq!(req.trash_card, 1);
    /// assert_eq!(req.rest_card, 0);
    /// ```
    #[must_use]
    pub fn requirements(&self) -> CostRequirements {
        let mut req = CostRequirements::default();
        self.accumulate(&mut req);
        req
    }

    fn accumulate(&self, req: &mut CostRequirements) {
        match self {
            CostExpr::RestDon(n) => req.rest_don += n,
            CostExpr::TrashCard(n) => req.trash_card += n,
            CostExpr::RestCard(n) => req.rest_card += n,
            CostExpr::Composite(parts) => {
                for part in parts {
                    part.accumulate(req);
                }
            }
        }
    }

    /// Whether paying requires no card at all.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.requirements() == CostRequirements::default()
    }
}

/// The exact cards a payment will use.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostPlan {
    pub don: Vec<EntityId>,
    pub trash: Vec<EntityId>,
    pub rest: Vec<EntityId>,
}

/// Atomic cost payment.
pub struct CostPayment;

impl CostPayment {
    /// Pick the cards that would pay `cost`, or `None` if it is unaffordable.
    #[must_use]
    pub fn plan(
        state: &GameState,
        cost: &CostExpr,
        player: PlayerId,
        source: Option<EntityId>,
    ) -> Option<CostPlan> {
        let req = cost.requirements();
        let board = state.player(player);

        let don: Vec<EntityId> = board
            .cost_area()
            .iter()
            .copied()
            .filter(|&id| state.card(id).is_some_and(|c| c.is_active()))
            .take(req.rest_don as usize)
            .collect();
        if don.len() < req.rest_don as usize {
            return None;
        }

        let trash: Vec<EntityId> = board
            .hand()
            .iter()
            .rev()
            .copied()
            .take(req.trash_card as usize)
            .collect();
        if trash.len() < req.trash_card as usize {
            return None;
        }

        let mut rest = Vec::new();
        if req.rest_card > 0 {
            let eligible_source = source.filter(|&id| {
                state
                    .card(id)
                    .is_some_and(|c| c.is_in_play() && c.controller == player && c.is_active())
            });
            rest.extend(eligible_source);
            rest.extend(
                board
                    .characters()
                    .iter()
                    .copied()
                    .filter(|&id| Some(id) != eligible_source)
                    .filter(|&id| state.card(id).is_some_and(|c| c.is_active())),
            );
            rest.truncate(req.rest_card as usize);
            if rest.len() < req.rest_card as usize {
                return None;
            }
        }

        Some(CostPlan { don, trash, rest })
    }

    /// Check affordability without mutating anything.
    #[must_use]
    pub fn can_pay(
        state: &GameState,
        cost: &CostExpr,
        player: PlayerId,
        source: Option<EntityId>,
    ) -> bool {
        Self::plan(state, cost, player, source).is_some()
    }

    /// Pay `cost` in full, or leave the state untouched and return `false`.
    pub fn pay(
        state: &mut GameState,
        cost: &CostExpr,
        player: PlayerId,
        source: Option<EntityId>,
    ) -> bool {
        let Some(plan) = Self::plan(state, cost, player, source) else {
            debug!(%player, ?cost, "cost unaffordable");
            return false;
        };

        let applied = (|| {
            for &don in &plan.don {
                ZoneManager::set_card_state(state, don, CardState::Rested)?;
            }
            for &card in &plan.trash {
                ZoneManager::move_card(state, card, Zone::Hand, Zone::Trash, player, ZonePosition::Top)?;
            }
            for &card in &plan.rest {
                ZoneManager::set_card_state(state, card, CardState::Rested)?;
            }
            Ok::<(), ZoneError>(())
        })();

        match applied {
            Ok(()) => true,
            Err(err) => {
                error!(%player, %err, "cost payment failed after planning");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_costs_are_free() {
        assert!(CostExpr::RestDon(0).is_free());
        assert!(CostExpr::Composite(vec![]).is_free());
        assert!(!CostExpr::Composite(vec![CostExpr::TrashCard(1)]).is_free());
    }

    #[test]
    fn test_requirements_sum_kinds() {
        let cost = CostExpr::Composite(vec![
            CostExpr::RestCard(1),
            CostExpr::RestDon(2),
            CostExpr::RestCard(1),
        ]);
        assert_eq!(
            cost.requirements(),
            CostRequirements {
                rest_don: 2,
                trash_card: 0,
                rest_card: 2
            }
        );
    }
}
