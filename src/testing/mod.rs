//! Randomized test harness for the response bank.
//!
//! This module provides infrastructure for:
//! - Seeded, reproducible stimulus generation (per-step coin flips on every
//!   handshake, identifier renewal on success)
//! - Scoreboarding: per-identifier input/output queues and mismatch counting
//! - Soak rounds: drive loop plus a drain phase that must empty the bank
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --rounds 100 --steps 1000 --seed 1
//! ```

pub mod scoreboard;
pub mod soak;
pub mod stimulus;

pub use scoreboard::Scoreboard;
pub use soak::{run_round, RoundReport};
pub use stimulus::StimulusGen;
