//! Release arbitration: which content-ready slot leaves the bank this step.
//!
//! The bank exposes a single output port, so at most one slot is released
//! per step even when several identifiers are simultaneously enabled and
//! content-ready. Ties across identifiers are broken by a fixed priority:
//! lowest identifier value first. Within an identifier the oldest
//! content-ready slot always wins; anything else would reorder responses.

use smallvec::SmallVec;

use super::{AgeTracker, AxiId, SlotArena, SlotIndex, SlotState};

/// Set of identifiers currently permitted to release, as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseMask(u64);

impl ReleaseMask {
    /// No identifier enabled.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Every identifier enabled.
    pub const fn all() -> Self {
        Self(u64::MAX)
    }

    /// Mask with only `id` enabled.
    pub const fn single(id: AxiId) -> Self {
        Self(1 << id)
    }

    /// This mask with `id` additionally enabled.
    pub const fn with(self, id: AxiId) -> Self {
        Self(self.0 | (1 << id))
    }

    /// Whether `id` is enabled.
    pub const fn contains(self, id: AxiId) -> bool {
        self.0 & (1 << id) != 0
    }

    /// Whether no identifier is enabled.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Per-identifier release candidate, as collected by the arbiter.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    /// Enabled identifier with at least one content-ready slot.
    pub id: AxiId,
    /// Oldest content-ready slot of that identifier.
    pub slot: SlotIndex,
}

/// Selects the slot to release, if any.
#[derive(Debug)]
pub struct ReleaseArbiter {
    num_ids: usize,
}

impl ReleaseArbiter {
    pub fn new(num_ids: usize) -> Self {
        Self { num_ids }
    }

    /// All release candidates this step: for every enabled identifier, its
    /// oldest content-ready slot, in ascending identifier order.
    pub fn candidates(
        &self,
        arena: &SlotArena,
        age: &AgeTracker,
        mask: ReleaseMask,
    ) -> SmallVec<[Candidate; 16]> {
        let mut found = SmallVec::new();
        if mask.is_empty() {
            return found;
        }
        for id in 0..self.num_ids as AxiId {
            if !mask.contains(id) {
                continue;
            }
            let ready = age
                .slots_oldest_first(id)
                .find(|&slot| arena.slot(slot).state == SlotState::Ready);
            if let Some(slot) = ready {
                found.push(Candidate { id, slot });
            }
        }
        found
    }

    /// The slot released this step if the downstream handshake completes:
    /// the candidate of the lowest enabled identifier.
    pub fn select(
        &self,
        arena: &SlotArena,
        age: &AgeTracker,
        mask: ReleaseMask,
    ) -> Option<SlotIndex> {
        self.candidates(arena, age, mask)
            .first()
            .map(|candidate| candidate.slot)
    }
}
