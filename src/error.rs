//! Codec Error Types
//!
//! Core error taxonomy for coder construction and traversal. All failures
//! are fail-fast: errors propagate to the top-level caller with no internal
//! recovery, and only the buffer growth helper retries (see
//! [`CodecError::is_buffer_too_small`]).

use thiserror::Error;

/// Result type for voltage-codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Codec errors
#[derive(Debug, Error, Clone)]
pub enum CodecError {
    /// Length specification resolved to a negative or non-integer value
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// Fixed-length payload disagrees with the resolved length
    #[error("Length mismatch: expected {expected} unit(s), got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Buffer view is shorter than the operation requires
    #[error("Buffer too small: need {needed} byte(s), {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// Reference resolved before its target coder ran in this context
    #[error("Reference not found: coder #{0} has not recorded a value in this context")]
    RefNotFound(u64),

    /// Bit field width outside the supported 1..=32 range
    #[error("Invalid bit width for field '{field}': {width} (must be 1-32)")]
    InvalidBitWidth { field: String, width: u32 },

    /// Bit schema total is not a whole number of bytes
    #[error("Bit schema is {total_bits} bit(s); add {padding} padding bit(s) to reach a byte boundary")]
    NonByteAligned { total_bits: u32, padding: u32 },

    /// Encoded value exceeds its bit field width
    #[error("Value {value} out of range for bit field '{field}' (0..={max})")]
    BitValueOutOfRange {
        field: String,
        value: u64,
        max: u64,
    },

    /// Variant selector returned no key
    #[error("No variant selected")]
    NoVariantSelected,

    /// Variant selector returned a key absent from the refiner table
    #[error("Invalid variant key: '{0}'")]
    InvalidVariantKey(String),

    /// Growth ceiling reached without a successful encode
    #[error("Buffer growth exhausted: reached max byte length {0}")]
    BufferGrowthExhausted(usize),

    /// Configuration errors (malformed growth options, direction mismatch)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value/type mismatches between a coder and the value it was handed
    #[error("Data conversion error: {0}")]
    DataConversion(String),

    /// Recursion-depth guard tripped while walking a nested schema
    #[error("Nesting too deep: exceeded {0} level(s)")]
    NestingTooDeep(usize),
}

// Helper methods for creating errors
impl CodecError {
    pub fn invalid_length(msg: impl Into<String>) -> Self {
        CodecError::InvalidLength(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        CodecError::Config(msg.into())
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        CodecError::DataConversion(msg.into())
    }

    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        CodecError::BufferTooSmall { needed, available }
    }

    /// Check whether this is the distinguished "destination too small"
    /// failure the growth helper is allowed to retry on. Every other kind
    /// propagates immediately.
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(self, CodecError::BufferTooSmall { .. })
    }
}
