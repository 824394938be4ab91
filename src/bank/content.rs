//! Content store: the payload RAM and deposit matching.
//!
//! Payload words live apart from the slot metadata, one word per slot, the
//! way the message RAM sits apart from the occupancy flops in the hardware
//! bank. A deposit names only an identifier; the store re-derives which
//! reservation it belongs to by picking the oldest content-absent slot of
//! that identifier, which is what preserves per-identifier FIFO no matter
//! how deposit arrival is interleaved with reservations.

use super::{AgeTracker, AxiId, Payload, SlotArena, SlotIndex, SlotState};

/// Payload storage for every slot in the bank.
#[derive(Debug)]
pub struct ContentStore {
    payloads: Vec<Payload>,
}

impl ContentStore {
    /// Create a store with one payload word per slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            payloads: vec![0; capacity],
        }
    }

    /// Find the slot a deposit for `id` would fill: the oldest occupied,
    /// content-absent slot of that identifier.
    ///
    /// `None` means the deposit has no matching outstanding reservation and
    /// must be held off (not-ready). A deposit that stays unmatched step
    /// after step indicates a protocol-ordering bug in the caller, not in
    /// the bank.
    pub fn match_deposit(
        &self,
        arena: &SlotArena,
        age: &AgeTracker,
        id: AxiId,
    ) -> Option<SlotIndex> {
        age.slots_oldest_first(id)
            .find(|&slot| arena.slot(slot).state == SlotState::Reserved)
    }

    /// Write `payload` into a reserved slot and mark it content-ready.
    ///
    /// Filling a free or already-ready slot is an invariant violation.
    pub fn fill(&mut self, arena: &mut SlotArena, index: SlotIndex, payload: Payload) {
        let slot = arena.slot_mut(index);
        assert_eq!(
            slot.state,
            SlotState::Reserved,
            "deposit into slot {index} in state {:?}",
            slot.state
        );
        self.payloads[index] = payload;
        slot.state = SlotState::Ready;
        log::trace!("deposit: id={} slot={index} payload={payload:#x}", slot.id);
    }

    /// Read the payload of a content-ready slot.
    pub fn read(&self, index: SlotIndex) -> Payload {
        self.payloads[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::ReservationManager;

    fn bank_parts(capacity: usize) -> (SlotArena, AgeTracker, ReservationManager, ContentStore) {
        (
            SlotArena::new(capacity),
            AgeTracker::new(capacity, 4),
            ReservationManager::new(),
            ContentStore::new(capacity),
        )
    }

    #[test]
    fn test_deposit_matches_oldest_reservation() {
        let (mut arena, mut age, mut rsv, store) = bank_parts(4);
        let first = rsv.reserve(&mut arena, &mut age, 1).unwrap();
        let _second = rsv.reserve(&mut arena, &mut age, 1).unwrap();

        // Both slots are empty; the match must be the older reservation.
        assert_eq!(store.match_deposit(&arena, &age, 1), Some(first));
    }

    #[test]
    fn test_deposit_skips_filled_slots() {
        let (mut arena, mut age, mut rsv, mut store) = bank_parts(4);
        let first = rsv.reserve(&mut arena, &mut age, 2).unwrap();
        let second = rsv.reserve(&mut arena, &mut age, 2).unwrap();

        store.fill(&mut arena, first, 0xAA);
        assert_eq!(arena.slot(first).state, SlotState::Ready);
        assert_eq!(store.match_deposit(&arena, &age, 2), Some(second));
    }

    #[test]
    fn test_unmatched_deposit_has_no_target() {
        let (mut arena, mut age, mut rsv, store) = bank_parts(2);
        let _ = rsv.reserve(&mut arena, &mut age, 0).unwrap();

        // No reservation outstanding for identifier 1.
        assert_eq!(store.match_deposit(&arena, &age, 1), None);
    }

    #[test]
    #[should_panic(expected = "deposit into slot")]
    fn test_double_fill_panics() {
        let (mut arena, mut age, mut rsv, mut store) = bank_parts(2);
        let slot = rsv.reserve(&mut arena, &mut age, 0).unwrap();
        store.fill(&mut arena, slot, 1);
        store.fill(&mut arena, slot, 2);
    }
}
