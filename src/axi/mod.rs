//! AXI message dimensions and wire-format codec.
//!
//! The bank itself is agnostic to what its payload words mean; this module
//! holds the field widths of the surrounding AXI fabric and the stateless
//! packing/unpacking of response-side messages. Packing is a pure function of
//! a fixed offset/width table per message kind: the identifier always sits in
//! the low bits so that routing only needs a mask.

pub mod structures;

pub use structures::{Field, ReadData, WriteResponse};

/// AXI identifier width in bits.
pub const ID_WIDTH: u32 = 4;

/// Number of distinct AXI identifiers.
pub const NUM_IDS: usize = 1 << ID_WIDTH;

/// Data word width in bits (R channel).
pub const X_DATA_WIDTH: u32 = 32;

/// Response code width in bits (B and R channels).
pub const X_RESP_WIDTH: u32 = 3;

/// Last-beat flag width in bits.
pub const X_LAST_WIDTH: u32 = 1;

/// Width of a packed message word. Every message must fit in one word.
pub const PACKED_WIDTH: u32 = 64;

/// Content bits of a read-data message (everything above the identifier).
pub const READ_DATA_CONTENT_WIDTH: u32 = X_DATA_WIDTH + X_RESP_WIDTH + X_LAST_WIDTH;

/// Content bits of a write-response message.
pub const WRITE_RESP_CONTENT_WIDTH: u32 = X_RESP_WIDTH;
