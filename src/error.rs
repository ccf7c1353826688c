//! Error types shared by every fallible operation in the core.
//!
//! The search, scoring and tree mutation routines are all internal hot
//! paths; failures there are programming errors in the caller (bad
//! indices, mismatched lengths, undersized capacity) and are never
//! retried. The PHYLIP reader is the one place genuinely external input
//! can be malformed, so it gets a dedicated `Format` variant carrying a
//! human-readable message.

use thiserror::Error;

/// The error type threaded through every fallible core operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhyloError {
    /// The input alignment did not conform to the interleaved PHYLIP
    /// grammar. Carries a message describing what was expected.
    #[error("malformed input: {0}")]
    Format(String),

    /// Two sequences that must be the same length were not.
    #[error("sequence length mismatch: {a} vs {b}")]
    LengthMismatch { a: usize, b: usize },

    /// A node index was outside the tree's current length.
    #[error("node index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A tree mutation needed more room than its capacity allows.
    #[error("capacity exceeded: needed {needed}, capacity {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// A signature entry fell outside its valid `0..=2*(i-1)` range.
    #[error("signature entry {value} invalid at tip index {tip} (valid range 0..={max})")]
    InvalidSignatureEntry { tip: usize, value: i64, max: usize },
}

pub type Result<T> = std::result::Result<T, PhyloError>;
