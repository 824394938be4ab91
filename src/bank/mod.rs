//! Response bank: reservation/content/release storage with age-ordered
//! arbitration.
//!
//! The bank accepts response content that arrives in arbitrary order, tagged
//! by a small AXI identifier, and releases it strictly in the order each
//! transaction was reserved, per identifier, even though the backing storage
//! is a single pool shared by all identifiers.
//!
//! # Architecture
//!
//! ```text
//! reserve ──▶ ┌──────────────────┐      ┌─────────────┐
//!  {id}       │ ReservationMgr   │─────▶│  AgeTracker │
//!             │  (rank stamping) │      │ (rank index)│
//!             └────────┬─────────┘      └──────┬──────┘
//!                      │ allocate              │ oldest(id)
//!             ┌────────▼─────────┐      ┌──────▼──────┐
//! deposit ──▶ │    SlotArena     │◀─────│ ReleaseArb  │──▶ release
//!  {id,data}  │ (C slots + free  │ free │ (enable mask│     {id,data}
//!             │      list)       │      │  + priority)│
//!             └────────┬─────────┘      └──────▲──────┘
//!                      │ fill                  │ read
//!             ┌────────▼─────────┐             │
//!             │   ContentStore   │─────────────┘
//!             │   (payload RAM)  │
//!             └──────────────────┘
//! ```
//!
//! Every edge is a single-step valid/ready handshake: a reservation that
//! finds the arena full, or a deposit with no matching outstanding
//! reservation, is simply not ready this step and must be retried. The whole
//! bank advances through [`RspBank::step`], which evaluates all three
//! handshakes against the pre-step state and commits them atomically, the
//! way a synchronous design registers its outputs at a clock edge.

pub mod age;
pub mod arbiter;
pub mod arena;
pub mod content;
pub mod reservation;
mod rsp_bank;

pub use age::{AgeMatrix, AgeTracker};
pub use arbiter::{ReleaseArbiter, ReleaseMask};
pub use arena::{Slot, SlotArena, SlotState};
pub use content::ContentStore;
pub use reservation::ReservationManager;
pub use rsp_bank::{BankStats, Deposit, Release, RspBank, StepInputs, StepOutputs};

/// AXI identifier: a small integer tag grouping transactions that must
/// preserve relative order among themselves.
pub type AxiId = u8;

/// Index of a slot in the bank's arena.
pub type SlotIndex = usize;

/// Response payload word (identifier excluded).
pub type Payload = u64;
