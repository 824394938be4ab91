//! Per-identifier scoreboarding of accepted inputs against released outputs.
//!
//! Deposits are matched to reservations oldest-first inside the bank, so the
//! sequence of payloads released for an identifier must equal the sequence
//! of deposits accepted for it, in acceptance order. The scoreboard records
//! both sides as packed wire words and counts pairwise mismatches.

use std::collections::VecDeque;

use crate::bank::AxiId;

/// Input/output queues for every identifier.
#[derive(Debug)]
pub struct Scoreboard {
    inputs: Vec<VecDeque<u64>>,
    outputs: Vec<VecDeque<u64>>,
}

impl Scoreboard {
    /// Create a scoreboard for `num_ids` identifiers.
    pub fn new(num_ids: usize) -> Self {
        Self {
            inputs: vec![VecDeque::new(); num_ids],
            outputs: vec![VecDeque::new(); num_ids],
        }
    }

    /// Record a deposit the bank accepted this step.
    pub fn record_in(&mut self, id: AxiId, packed: u64) {
        self.inputs[id as usize].push_back(packed);
    }

    /// Record a release the bank fired this step.
    pub fn record_out(&mut self, id: AxiId, packed: u64) {
        self.outputs[id as usize].push_back(packed);
    }

    /// Accepted deposits not yet matched by a release.
    pub fn outstanding(&self) -> usize {
        self.inputs
            .iter()
            .zip(&self.outputs)
            .map(|(i, o)| i.len().saturating_sub(o.len()))
            .sum()
    }

    /// Drain matched input/output pairs and count inequalities.
    ///
    /// Outputs with no corresponding input (duplicated or invented
    /// releases) also count as mismatches.
    pub fn mismatches(&mut self) -> usize {
        let mut count = 0;
        for (inputs, outputs) in self.inputs.iter_mut().zip(&mut self.outputs) {
            loop {
                match (inputs.pop_front(), outputs.pop_front()) {
                    (Some(input), Some(output)) => count += usize::from(input != output),
                    (None, Some(_)) => count += 1,
                    (Some(input), None) => {
                        // Unreleased input: not a mismatch, put it back and
                        // leave it to the outstanding() accounting.
                        inputs.push_front(input);
                        break;
                    }
                    (None, None) => break,
                }
            }
        }
        count
    }
}
