//! The response bank and its synchronous step function.
//!
//! All interaction with the bank goes through [`RspBank::step`], one call
//! per clock step. The step is explicitly two-phase: every handshake
//! decision (reserve grant, deposit match, release selection) is evaluated
//! against the state the bank had when the step began, and only then are the
//! commits applied. No handshake observes another handshake's same-step
//! commit, which is exactly the visibility a synchronous design gives logic
//! sampling registered state.
//!
//! # Usage
//!
//! ```ignore
//! use simmem_bank::bank::{ReleaseMask, RspBank, StepInputs};
//! use simmem_bank::config::BankConfig;
//!
//! let mut bank = RspBank::new(BankConfig::default())?;
//! let out = bank.step(&StepInputs {
//!     reserve: Some(3),
//!     release_enable: ReleaseMask::all(),
//!     downstream_ready: true,
//!     ..Default::default()
//! });
//! if let Some(slot) = out.reserved {
//!     // reservation granted this step
//! }
//! ```

use crate::config::{BankConfig, ConfigError};

use super::{
    AgeTracker, AxiId, ContentStore, Payload, ReleaseArbiter, ReleaseMask, ReservationManager,
    SlotArena, SlotIndex,
};

/// Deposit side of the step inputs: content for one outstanding reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    /// AXI identifier the content belongs to.
    pub id: AxiId,
    /// Response payload word.
    pub payload: Payload,
}

/// One released response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    /// AXI identifier of the released transaction.
    pub id: AxiId,
    /// Released payload word.
    pub payload: Payload,
    /// Slot the payload occupied, for observability.
    pub slot: SlotIndex,
}

/// Inputs applied to the bank for one step. All three handshakes are
/// optional and independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepInputs {
    /// Reservation request: `Some(id)` raises the reserve valid signal.
    pub reserve: Option<AxiId>,
    /// Deposit request: `Some` raises the deposit valid signal.
    pub deposit: Option<Deposit>,
    /// Identifiers currently permitted to release.
    pub release_enable: ReleaseMask,
    /// Downstream readiness on the single output port.
    pub downstream_ready: bool,
}

/// Handshake results of one step.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepOutputs {
    /// Slot granted to this step's reservation request. `None` means either
    /// no request was raised or the bank was not ready (arena full).
    pub reserved: Option<SlotIndex>,
    /// Whether this step's deposit was accepted. `false` with a raised
    /// deposit means not-ready: no matching outstanding reservation.
    pub deposit_accepted: bool,
    /// The response offered on the output port this step (output valid),
    /// regardless of downstream readiness.
    pub release: Option<Release>,
    /// Whether the offered response was actually handed off and its slot
    /// freed (output valid AND downstream ready).
    pub release_fired: bool,
}

/// Running counters over a bank's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankStats {
    /// Steps executed.
    pub steps: u64,
    /// Reservation requests granted.
    pub reservations_granted: u64,
    /// Reservation requests rejected (arena full).
    pub reservations_rejected: u64,
    /// Deposits accepted.
    pub deposits_accepted: u64,
    /// Deposits rejected (no matching reservation).
    pub deposits_rejected: u64,
    /// Responses released downstream.
    pub releases: u64,
}

/// Bounded-capacity response bank with per-identifier FIFO release order.
#[derive(Debug)]
pub struct RspBank {
    config: BankConfig,
    arena: SlotArena,
    age: AgeTracker,
    reservations: ReservationManager,
    content: ContentStore,
    arbiter: ReleaseArbiter,
    cycle: u64,
    stats: BankStats,
}

impl RspBank {
    /// Build a bank from a validated configuration. Capacity, identifier
    /// space, and payload width are fixed for the bank's lifetime.
    pub fn new(config: BankConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = config.capacity;
        let num_ids = config.num_ids();
        Ok(Self {
            config,
            arena: SlotArena::new(capacity),
            age: AgeTracker::new(capacity, num_ids),
            reservations: ReservationManager::new(),
            content: ContentStore::new(capacity),
            arbiter: ReleaseArbiter::new(num_ids),
            cycle: 0,
            stats: BankStats::default(),
        })
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Steps executed since construction.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Total slot capacity.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Number of in-flight transactions.
    pub fn occupied(&self) -> usize {
        self.arena.occupied()
    }

    /// Whether a reservation raised next step would be rejected.
    pub fn is_full(&self) -> bool {
        self.arena.is_full()
    }

    /// Running counters.
    pub fn stats(&self) -> BankStats {
        self.stats
    }

    /// Reset the running counters. The cycle count is part of bank state,
    /// not a statistic, and is unaffected.
    pub fn reset_stats(&mut self) {
        self.stats = BankStats::default();
    }

    /// The response the output port would offer under `mask`, without
    /// committing anything.
    pub fn peek_release(&self, mask: ReleaseMask) -> Option<Release> {
        let slot = self.arbiter.select(&self.arena, &self.age, mask)?;
        Some(Release {
            id: self.arena.slot(slot).id,
            payload: self.content.read(slot),
            slot,
        })
    }

    /// Advance the bank by one step.
    ///
    /// Phase 1 evaluates all three handshakes against the pre-step state;
    /// phase 2 commits them. The commit targets are disjoint by slot state
    /// (reserve touches a free slot, deposit a reserved one, release a ready
    /// one), and commits run reserve first, so a slot freed by this step's
    /// release joins the free-list tail and is never handed back out in the
    /// same step.
    pub fn step(&mut self, inputs: &StepInputs) -> StepOutputs {
        self.check_inputs(inputs);

        // Phase 1: evaluate against pre-step state.
        let reserve_grant = inputs.reserve.filter(|_| !self.arena.is_full());
        let deposit_match = inputs
            .deposit
            .and_then(|d| self.content.match_deposit(&self.arena, &self.age, d.id));
        let release = self.peek_release(inputs.release_enable);
        let release_fired = release.is_some() && inputs.downstream_ready;

        // Phase 2: commit.
        let reserved = reserve_grant.and_then(|id| {
            self.reservations
                .reserve(&mut self.arena, &mut self.age, id)
        });
        debug_assert_eq!(reserved.is_some(), reserve_grant.is_some());

        if let (Some(deposit), Some(slot)) = (inputs.deposit, deposit_match) {
            self.content.fill(&mut self.arena, slot, deposit.payload);
        }

        if release_fired {
            let released = release.expect("fired release without a candidate");
            self.age.remove(released.slot, released.id);
            self.arena.free(released.slot);
            log::trace!(
                "release: id={} slot={} payload={:#x}",
                released.id,
                released.slot,
                released.payload
            );
        }

        self.cycle += 1;
        self.update_stats(inputs, reserved, deposit_match.is_some(), release_fired);

        StepOutputs {
            reserved,
            deposit_accepted: deposit_match.is_some(),
            release,
            release_fired,
        }
    }

    fn update_stats(
        &mut self,
        inputs: &StepInputs,
        reserved: Option<SlotIndex>,
        deposit_accepted: bool,
        release_fired: bool,
    ) {
        self.stats.steps += 1;
        if inputs.reserve.is_some() {
            if reserved.is_some() {
                self.stats.reservations_granted += 1;
            } else {
                self.stats.reservations_rejected += 1;
            }
        }
        if inputs.deposit.is_some() {
            if deposit_accepted {
                self.stats.deposits_accepted += 1;
            } else {
                self.stats.deposits_rejected += 1;
            }
        }
        if release_fired {
            self.stats.releases += 1;
        }
    }

    /// Out-of-range identifiers or payloads wider than configured are caller
    /// bugs, not backpressure.
    fn check_inputs(&self, inputs: &StepInputs) {
        let num_ids = self.config.num_ids();
        if let Some(id) = inputs.reserve {
            debug_assert!((id as usize) < num_ids, "reserve id {id} out of range");
        }
        if let Some(deposit) = inputs.deposit {
            debug_assert!(
                (deposit.id as usize) < num_ids,
                "deposit id {} out of range",
                deposit.id
            );
            debug_assert_eq!(
                deposit.payload & !self.config.payload_mask(),
                0,
                "deposit payload wider than configured"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axi::WriteResponse;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    fn small_bank(capacity: usize) -> RspBank {
        RspBank::new(BankConfig {
            capacity,
            id_width: 2,
            payload_width: 8,
        })
        .unwrap()
    }

    fn reserve(bank: &mut RspBank, id: AxiId) -> StepOutputs {
        bank.step(&StepInputs {
            reserve: Some(id),
            ..Default::default()
        })
    }

    fn deposit(bank: &mut RspBank, id: AxiId, payload: Payload) -> StepOutputs {
        bank.step(&StepInputs {
            deposit: Some(Deposit { id, payload }),
            ..Default::default()
        })
    }

    fn release(bank: &mut RspBank, mask: ReleaseMask) -> StepOutputs {
        bank.step(&StepInputs {
            release_enable: mask,
            downstream_ready: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_single_id_fifo_release() {
        // Reserve twice, deposit A then B, release: order must be A, B.
        let mut bank = small_bank(4);
        assert!(reserve(&mut bank, 0).reserved.is_some());
        assert!(reserve(&mut bank, 0).reserved.is_some());
        assert!(deposit(&mut bank, 0, 0xA).deposit_accepted);
        assert!(deposit(&mut bank, 0, 0xB).deposit_accepted);

        let first = release(&mut bank, ReleaseMask::all());
        assert!(first.release_fired);
        assert_eq!(first.release.unwrap().payload, 0xA);

        let second = release(&mut bank, ReleaseMask::all());
        assert!(second.release_fired);
        assert_eq!(second.release.unwrap().payload, 0xB);

        assert_eq!(bank.occupied(), 0);
    }

    #[test]
    fn test_reserve_rejected_while_full() {
        let mut bank = small_bank(2);
        assert!(reserve(&mut bank, 0).reserved.is_some());
        assert!(reserve(&mut bank, 0).reserved.is_some());
        assert!(bank.is_full());

        // Not ready until a release frees a slot.
        assert!(reserve(&mut bank, 0).reserved.is_none());
        assert!(deposit(&mut bank, 0, 1).deposit_accepted);
        assert!(release(&mut bank, ReleaseMask::all()).release_fired);
        assert!(reserve(&mut bank, 0).reserved.is_some());
    }

    #[test]
    fn test_release_order_independent_of_deposit_order() {
        // Reservations id0, id1, id0; deposits arrive id1, then id0's two in
        // reservation order. id0 must release first-reservation payload
        // before second-reservation payload.
        let mut bank = small_bank(4);
        assert!(reserve(&mut bank, 0).reserved.is_some());
        assert!(reserve(&mut bank, 1).reserved.is_some());
        assert!(reserve(&mut bank, 0).reserved.is_some());

        assert!(deposit(&mut bank, 1, 0x11).deposit_accepted);
        assert!(deposit(&mut bank, 0, 0x01).deposit_accepted);
        assert!(deposit(&mut bank, 0, 0x02).deposit_accepted);

        // Only id0 enabled: its two payloads come out in reservation order.
        let first = release(&mut bank, ReleaseMask::single(0)).release.unwrap();
        assert_eq!((first.id, first.payload), (0, 0x01));
        let second = release(&mut bank, ReleaseMask::single(0)).release.unwrap();
        assert_eq!(second.payload, 0x02);

        // id1's single payload releases once enabled.
        let out = release(&mut bank, ReleaseMask::single(1));
        assert_eq!(out.release.unwrap().id, 1);
        assert_eq!(out.release.unwrap().payload, 0x11);
    }

    #[test]
    fn test_unmatched_deposit_rejected_not_buffered() {
        let mut bank = small_bank(2);
        let out = deposit(&mut bank, 1, 0x7);
        assert!(!out.deposit_accepted);

        // The rejected deposit left no trace: a later reservation for the
        // same identifier still needs its own deposit.
        assert!(reserve(&mut bank, 1).reserved.is_some());
        assert_eq!(bank.peek_release(ReleaseMask::all()), None);
        assert_eq!(bank.stats().deposits_rejected, 1);
    }

    #[test]
    fn test_release_waits_for_enable_and_ready() {
        let mut bank = small_bank(2);
        reserve(&mut bank, 0);
        deposit(&mut bank, 0, 0x3);

        // Enabled but downstream not ready: valid is offered, nothing frees.
        let out = bank.step(&StepInputs {
            release_enable: ReleaseMask::all(),
            downstream_ready: false,
            ..Default::default()
        });
        assert!(out.release.is_some());
        assert!(!out.release_fired);
        assert_eq!(bank.occupied(), 1);

        // Ready but not enabled: no offer at all.
        let out = bank.step(&StepInputs {
            release_enable: ReleaseMask::none(),
            downstream_ready: true,
            ..Default::default()
        });
        assert!(out.release.is_none());
        assert_eq!(bank.occupied(), 1);

        assert!(release(&mut bank, ReleaseMask::all()).release_fired);
        assert_eq!(bank.occupied(), 0);
    }

    #[test]
    fn test_same_step_reserve_sees_pre_step_fullness() {
        // A release and a reservation in the same step: the reservation is
        // still rejected, because its decision reads pre-step state.
        let mut bank = small_bank(1);
        reserve(&mut bank, 0);
        deposit(&mut bank, 0, 0x1);

        let out = bank.step(&StepInputs {
            reserve: Some(0),
            release_enable: ReleaseMask::all(),
            downstream_ready: true,
            ..Default::default()
        });
        assert!(out.release_fired);
        assert!(out.reserved.is_none());
        assert_eq!(bank.stats().reservations_rejected, 1);

        // Next step the freed slot is visible.
        assert!(reserve(&mut bank, 0).reserved.is_some());
    }

    #[test]
    fn test_same_step_deposit_not_releasable() {
        let mut bank = small_bank(2);
        reserve(&mut bank, 0);

        // Deposit and release in one step: the release decision predates
        // the deposit commit, so nothing is offered yet.
        let out = bank.step(&StepInputs {
            deposit: Some(Deposit { id: 0, payload: 0x5 }),
            release_enable: ReleaseMask::all(),
            downstream_ready: true,
            ..Default::default()
        });
        assert!(out.deposit_accepted);
        assert!(out.release.is_none());

        assert!(release(&mut bank, ReleaseMask::all()).release_fired);
    }

    #[test]
    fn test_same_step_deposit_matches_pre_step_reservations_only() {
        let mut bank = small_bank(2);

        // Reservation and deposit for the same identifier in one step: the
        // deposit has no pre-step reservation to match, so it is rejected
        // even though the reservation is granted.
        let out = bank.step(&StepInputs {
            reserve: Some(1),
            deposit: Some(Deposit { id: 1, payload: 0x9 }),
            ..Default::default()
        });
        assert!(out.reserved.is_some());
        assert!(!out.deposit_accepted);

        assert!(deposit(&mut bank, 1, 0x9).deposit_accepted);
    }

    #[test]
    fn test_peek_release_is_non_destructive() {
        let mut bank = small_bank(2);
        reserve(&mut bank, 0);
        deposit(&mut bank, 0, 0x42);

        let peeked = bank.peek_release(ReleaseMask::all()).unwrap();
        assert_eq!(peeked.payload, 0x42);
        assert_eq!(bank.occupied(), 1);
        assert_eq!(bank.peek_release(ReleaseMask::all()), Some(peeked));
    }

    #[test]
    fn test_capacity_invariant_under_load() {
        let mut bank = small_bank(3);
        for i in 0..10 {
            let id = (i % 4) as AxiId;
            bank.step(&StepInputs {
                reserve: Some(id),
                ..Default::default()
            });
            assert!(bank.occupied() <= bank.capacity());
        }
        let stats = bank.stats();
        assert_eq!(stats.reservations_granted, 3);
        assert_eq!(stats.reservations_rejected, 7);
    }

    #[test]
    fn test_write_response_payloads_survive_roundtrip() {
        // Drive wire-format write responses through a bank dimensioned for
        // the full AXI identifier space.
        let mut bank = RspBank::new(BankConfig {
            capacity: 2,
            id_width: crate::axi::ID_WIDTH,
            payload_width: 8,
        })
        .unwrap();
        let msg = WriteResponse { id: 1, rsp: 0b010 };
        reserve(&mut bank, msg.id);
        deposit(&mut bank, msg.id, msg.content());

        let out = release(&mut bank, ReleaseMask::all());
        let released = out.release.unwrap();
        assert_eq!(released.id, msg.id);
        assert_eq!(released.payload, msg.content());
    }

    proptest! {
        /// Released payload order per identifier equals accepted deposit
        /// order, for arbitrary request interleavings.
        #[test]
        fn test_per_identifier_fifo_under_interleaving(
            ops in proptest::collection::vec((any::<u8>(), any::<u8>(), any::<u8>()), 1..300),
        ) {
            let mut bank = small_bank(4);
            let mut next_payload = 0u64;
            let mut expected: Vec<VecDeque<Payload>> = vec![VecDeque::new(); 4];

            for (flags, rid, did) in ops {
                let deposit = (flags & 2 != 0).then_some(Deposit {
                    id: (did % 4) as AxiId,
                    payload: next_payload & 0xFF,
                });
                let inputs = StepInputs {
                    reserve: (flags & 1 != 0).then_some((rid % 4) as AxiId),
                    deposit,
                    release_enable: ReleaseMask::all(),
                    downstream_ready: flags & 4 != 0,
                };
                let outputs = bank.step(&inputs);

                prop_assert!(bank.occupied() <= bank.capacity());
                if outputs.deposit_accepted {
                    let deposit = deposit.unwrap();
                    expected[deposit.id as usize].push_back(deposit.payload);
                    next_payload += 1;
                }
                if outputs.release_fired {
                    let release = outputs.release.unwrap();
                    let want = expected[release.id as usize].pop_front();
                    prop_assert_eq!(Some(release.payload), want);
                }
            }
        }
    }

    #[test]
    fn test_stats_reset() {
        let mut bank = small_bank(2);
        reserve(&mut bank, 0);
        deposit(&mut bank, 0, 1);
        assert_ne!(bank.stats(), BankStats::default());
        let cycle = bank.cycle();
        bank.reset_stats();
        assert_eq!(bank.stats(), BankStats::default());
        assert_eq!(bank.cycle(), cycle);
    }
}
