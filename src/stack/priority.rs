//! LIFO effect-resolution stack with a pending-trigger queue.
//!
//! Newly raised instances wait in the pending queue until `flush` moves them
//! onto the stack as one batch. A batch is ordered active player first and
//! pushed so that its first instance ends on top, i.e. resolves first.
//! Later batches land on top of earlier ones.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::effects::EffectInstance;

/// The resolution stack.
///
/// ## Example
///
/// ```
/// use opcg_rules::core::{EntityId, PlayerId};
/// use opcg_rules::effects::{
///     EffectDefinition, EffectInstance, EffectInstanceId, EffectKind, EffectOrigin, TriggerTiming,
/// };
/// use opcg_rules::stack::EffectStack;
///
/// let def = EffectDefinition::auto(1, "draw", TriggerTiming::OnPlay, EffectKind::Draw { count: 1 });
/// let mut stack = EffectStack::new();
/// for (id, player) in [(0, 1), (1, 0)] {
///     stack.queue(EffectInstance::new(
///         EffectInstanceId(id),
///         def.clone(),
///         EntityId::new(id),
///         PlayerId::new(player),
///         EffectOrigin::Triggered,
///     ));
/// }
///
/// // Seat 0 is active: its instance goes on top.
/// assert_eq!(stack.flush(PlayerId::new(0)), 2);
/// assert_eq!(stack.pop().map(|e| e.controller), Some(PlayerId::new(0)));
/// assert_eq!(stack.pop().map(|e| e.controller), Some(PlayerId::new(1)));
/// assert!(stack.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectStack {
    /// Bottom first; the top is the last entry.
    entries: Vec<EffectInstance>,
    pending: Vec<EffectInstance>,
}

impl EffectStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an instance directly on top.
    pub fn push(&mut self, instance: EffectInstance) {
        self.entries.push(instance);
    }

    /// Remove and return the top instance.
    pub fn pop(&mut self) -> Option<EffectInstance> {
        self.entries.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&EffectInstance> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when both the stack and the pending queue are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.pending.is_empty()
    }

    /// Stack entries, bottom first.
    #[must_use]
    pub fn entries(&self) -> &[EffectInstance] {
        &self.entries
    }

    /// Instances waiting for the next flush, in raise order.
    #[must_use]
    pub fn pending(&self) -> &[EffectInstance] {
        &self.pending
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Add an instance to the pending queue.
    pub fn queue(&mut self, instance: EffectInstance) {
        self.pending.push(instance);
    }

    /// Move the pending queue onto the stack as one batch.
    ///
    /// Returns the number of instances moved.
    pub fn flush(&mut self, active: PlayerId) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let (mut batch, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|e| e.controller == active);
        batch.extend(others);

        let moved = batch.len();
        self.entries.extend(batch.into_iter().rev());
        moved
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
    }
}
