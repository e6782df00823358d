//! Error types for wiresbe core operations.

use thiserror::Error;

/// Core error type for flyweight codec operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer is too short for the requested operation.
    #[error("buffer too short: required {required} bytes, available {available} bytes")]
    BufferTooShort {
        /// Required buffer size in bytes.
        required: usize,
        /// Available buffer size in bytes.
        available: usize,
    },

    /// Value outside the declared range of the field's encoding.
    #[error("value {value} out of range [{min}, {max}]")]
    ValueOutOfRange {
        /// Offending value.
        value: i128,
        /// Minimum allowed value.
        min: i128,
        /// Maximum allowed value.
        max: i128,
    },

    /// Requested group count exceeds what the dimensions header can carry.
    #[error("group count {count} exceeds numInGroup maximum {max}")]
    GroupCountOverflow {
        /// Requested entry count.
        count: usize,
        /// Maximum representable entry count.
        max: usize,
    },

    /// Group iteration past the declared entry count.
    #[error("group index {index} out of bounds for count {count}")]
    GroupIndexOutOfBounds {
        /// Attempted entry index.
        index: usize,
        /// Declared entry count.
        count: usize,
    },

    /// Attempt to move the variable-region cursor backwards.
    #[error("cursor retreat: position {position}, attempted {attempted}")]
    CursorRetreat {
        /// Current cursor position.
        position: usize,
        /// Rejected target position.
        attempted: usize,
    },

    /// Invalid UTF-8 encoding in a string field.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where invalid UTF-8 was found.
        offset: usize,
    },

    /// Template ID mismatch during decoding.
    #[error("template mismatch: expected {expected}, actual {actual}")]
    TemplateMismatch {
        /// Expected template ID.
        expected: u16,
        /// Actual template ID found.
        actual: u16,
    },

    /// Schema ID mismatch during decoding.
    #[error("schema mismatch: expected {expected}, actual {actual}")]
    SchemaMismatch {
        /// Expected schema ID.
        expected: u16,
        /// Actual schema ID found.
        actual: u16,
    },
}

/// Result type alias for wiresbe core operations.
pub type Result<T> = std::result::Result<T, Error>;
