//! Seeded randomized stimulus generation.
//!
//! Each step draws independent coin flips for the three handshakes. Pending
//! requests follow the retry discipline of the valid/ready protocol: a
//! reservation identifier persists until granted, a deposit payload persists
//! until accepted. The deposit identifier, in contrast, is re-drawn every
//! step — holding one fixed could park the drive loop in a state where every
//! slot is reserved for other identifiers and the pending deposit can never
//! match, which is not representative of real operation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::axi::ReadData;
use crate::bank::{AxiId, Deposit, ReleaseMask, StepInputs, StepOutputs};

/// Reproducible stimulus source for one soak round.
#[derive(Debug)]
pub struct StimulusGen {
    rng: StdRng,
    num_ids: usize,
    /// Payload bits the bank under test actually stores.
    payload_mask: u64,
    /// Pending reservation identifier, renewed when granted.
    reservation_id: AxiId,
    /// Pending deposit, identifier re-drawn every step, payload renewed when
    /// accepted.
    deposit: Deposit,
}

impl StimulusGen {
    /// Create a generator drawing identifiers from `0..num_ids` and payloads
    /// masked to `payload_mask`.
    pub fn new(seed: u64, num_ids: usize, payload_mask: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let reservation_id = rng.gen_range(0..num_ids) as AxiId;
        let payload = Self::draw_payload(&mut rng, payload_mask);
        Self {
            rng,
            num_ids,
            payload_mask,
            reservation_id,
            deposit: Deposit { id: 0, payload },
        }
    }

    /// Inputs for the next step. All identifiers are release-enabled;
    /// downstream readiness is a coin flip like the request signals.
    pub fn next_inputs(&mut self) -> StepInputs {
        self.deposit.id = self.rng.gen_range(0..self.num_ids) as AxiId;

        let reserve = self.rng.gen_bool(0.5).then_some(self.reservation_id);
        let deposit = self.rng.gen_bool(0.5).then_some(self.deposit);
        let downstream_ready = self.rng.gen_bool(0.5);

        StepInputs {
            reserve,
            deposit,
            release_enable: ReleaseMask::all(),
            downstream_ready,
        }
    }

    /// Renew whatever the bank accepted this step.
    pub fn note_outcome(&mut self, outputs: &StepOutputs) {
        if outputs.reserved.is_some() {
            self.reservation_id = self.rng.gen_range(0..self.num_ids) as AxiId;
        }
        if outputs.deposit_accepted {
            self.deposit.payload = Self::draw_payload(&mut self.rng, self.payload_mask);
        }
    }

    /// A fresh read-data content word (identifier bits excluded), truncated
    /// to what the bank under test stores.
    fn draw_payload(rng: &mut StdRng, payload_mask: u64) -> u64 {
        let msg = ReadData {
            id: 0,
            data: rng.gen::<u64>() & ReadData::DATA.low_mask(),
            rsp: rng.gen::<u64>() & ReadData::RSP.low_mask(),
            last: rng.gen_bool(0.5),
        };
        msg.content() & payload_mask
    }
}
