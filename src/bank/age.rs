//! Relative-age tracking for occupied slots.
//!
//! The arbiter's hot question is "which occupied slot of identifier `id` is
//! the oldest". A synchronous hardware implementation answers it with a dense
//! pairwise comparison matrix updated on every occupancy change, which costs
//! O(C²) storage and update fan-in. In software the same relation falls out
//! of the monotonic insertion rank stamped at reservation time: a per-slot
//! rank table plus one ordered index per identifier answers every query in
//! O(log C).
//!
//! Both structures live here. [`AgeTracker`] (the rank index) is what the
//! bank uses; [`AgeMatrix`] (the dense relation) exists as the reference
//! implementation, and the test suite drives the two in lockstep over random
//! allocate/free traces to show they agree.

use std::collections::BTreeSet;

use super::{AxiId, SlotIndex};

/// Monotonic-rank age index.
///
/// Tracks, per identifier, the set of occupied slots ordered by insertion
/// rank. Ranks are assigned by the reservation manager and never reused, so
/// ordering is unambiguous even as slot indices are recycled.
#[derive(Debug)]
pub struct AgeTracker {
    /// Rank of each slot, `None` while the slot is untracked.
    rank_of: Vec<Option<u64>>,
    /// Per identifier: occupied slots as `(rank, slot)`, ascending rank.
    by_id: Vec<BTreeSet<(u64, SlotIndex)>>,
}

impl AgeTracker {
    /// Create a tracker for `capacity` slots and `num_ids` identifiers.
    pub fn new(capacity: usize, num_ids: usize) -> Self {
        Self {
            rank_of: vec![None; capacity],
            by_id: vec![BTreeSet::new(); num_ids],
        }
    }

    /// Start tracking a newly reserved slot.
    pub fn insert(&mut self, slot: SlotIndex, id: AxiId, rank: u64) {
        assert!(
            self.rank_of[slot].is_none(),
            "slot {slot} already age-tracked"
        );
        self.rank_of[slot] = Some(rank);
        self.by_id[id as usize].insert((rank, slot));
    }

    /// Stop tracking a slot that is being freed.
    pub fn remove(&mut self, slot: SlotIndex, id: AxiId) {
        let rank = self.rank_of[slot]
            .take()
            .unwrap_or_else(|| panic!("slot {slot} not age-tracked"));
        let removed = self.by_id[id as usize].remove(&(rank, slot));
        assert!(removed, "slot {slot} missing from identifier {id} index");
    }

    /// Insertion rank of a tracked slot.
    pub fn rank(&self, slot: SlotIndex) -> Option<u64> {
        self.rank_of[slot]
    }

    /// Whether `a` was reserved before `b`. Defined only while both slots
    /// are occupied.
    pub fn older(&self, a: SlotIndex, b: SlotIndex) -> bool {
        let ra = self.rank_of[a].expect("older() on untracked slot");
        let rb = self.rank_of[b].expect("older() on untracked slot");
        ra < rb
    }

    /// The oldest occupied slot of `id`, if any.
    pub fn oldest(&self, id: AxiId) -> Option<SlotIndex> {
        self.by_id[id as usize].iter().next().map(|&(_, slot)| slot)
    }

    /// Occupied slots of `id` in oldest-first order.
    pub fn slots_oldest_first(&self, id: AxiId) -> impl Iterator<Item = SlotIndex> + '_ {
        self.by_id[id as usize].iter().map(|&(_, slot)| slot)
    }

    /// Number of occupied slots tracked for `id`.
    pub fn count(&self, id: AxiId) -> usize {
        self.by_id[id as usize].len()
    }
}

/// Dense pairwise age relation, the shape a synchronous implementation
/// keeps in flops.
///
/// `older[a][b]` holds iff slot `a` was reserved before slot `b`; rows and
/// columns are pruned whenever a slot's occupancy changes. Updates are O(C)
/// per occupancy change and queries are O(C) per identifier scan, which is
/// why the bank itself uses [`AgeTracker`] instead.
#[derive(Debug)]
pub struct AgeMatrix {
    capacity: usize,
    /// Row-major `capacity × capacity` relation.
    older: Vec<bool>,
    /// Identifier of each occupied slot, `None` while free.
    ids: Vec<Option<AxiId>>,
}

impl AgeMatrix {
    /// Create a matrix for `capacity` slots, all free.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            older: vec![false; capacity * capacity],
            ids: vec![None; capacity],
        }
    }

    /// Record `slot` as the newest occupied slot.
    ///
    /// Must be called in reservation order: every already-occupied slot
    /// becomes older than `slot`.
    pub fn insert(&mut self, slot: SlotIndex, id: AxiId) {
        assert!(self.ids[slot].is_none(), "slot {slot} already in matrix");
        for other in 0..self.capacity {
            if other != slot && self.ids[other].is_some() {
                self.older[other * self.capacity + slot] = true;
                self.older[slot * self.capacity + other] = false;
            }
        }
        self.ids[slot] = Some(id);
    }

    /// Prune a slot that is being freed.
    pub fn remove(&mut self, slot: SlotIndex) {
        assert!(self.ids[slot].is_some(), "slot {slot} not in matrix");
        self.ids[slot] = None;
        for other in 0..self.capacity {
            self.older[other * self.capacity + slot] = false;
            self.older[slot * self.capacity + other] = false;
        }
    }

    /// Whether `a` was reserved before `b`. Defined only while both slots
    /// are occupied.
    pub fn older(&self, a: SlotIndex, b: SlotIndex) -> bool {
        assert!(
            self.ids[a].is_some() && self.ids[b].is_some(),
            "older() on free slot"
        );
        self.older[a * self.capacity + b]
    }

    /// The oldest occupied slot of `id`: the one no same-identifier slot is
    /// older than.
    pub fn oldest(&self, id: AxiId) -> Option<SlotIndex> {
        'candidate: for slot in 0..self.capacity {
            if self.ids[slot] != Some(id) {
                continue;
            }
            for other in 0..self.capacity {
                if other != slot
                    && self.ids[other] == Some(id)
                    && self.older[other * self.capacity + slot]
                {
                    continue 'candidate;
                }
            }
            return Some(slot);
        }
        None
    }
}
