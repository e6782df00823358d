//! Error types for IR construction, validation, and transport.

use thiserror::Error;

/// Error type for IR operations.
#[derive(Debug, Error)]
pub enum IrError {
    /// Token list fails the well-formedness check.
    #[error("malformed IR: {reason}")]
    MalformedIr {
        /// Description of the violated rule.
        reason: String,
    },

    /// Unknown signal wire value in serialized IR.
    #[error("unknown signal value {value}")]
    UnknownSignal {
        /// Offending wire value.
        value: u8,
    },

    /// Unknown primitive type wire value in serialized IR.
    #[error("unknown primitive type value {value}")]
    UnknownPrimitiveType {
        /// Offending wire value.
        value: u8,
    },

    /// Unknown byte order wire value in serialized IR.
    #[error("unknown byte order value {value}")]
    UnknownByteOrder {
        /// Offending wire value.
        value: u8,
    },

    /// Unknown presence wire value in serialized IR.
    #[error("unknown presence value {value}")]
    UnknownPresence {
        /// Offending wire value.
        value: u8,
    },

    /// Serialized IR stream carries a template id that is neither Frame
    /// nor Token.
    #[error("unknown template id {template_id} in IR stream")]
    UnknownTemplateId {
        /// Offending template id.
        template_id: u16,
    },

    /// Serialized IR stream does not start with a Frame message.
    #[error("IR stream does not start with a frame")]
    MissingFrame,

    /// A primitive value's wire bytes do not match its declared type.
    #[error("invalid value length: expected {expected} bytes, got {actual}")]
    InvalidValueLength {
        /// Expected byte count for the declared type.
        expected: usize,
        /// Actual byte count found.
        actual: usize,
    },

    /// A serialized string field is not valid UTF-8.
    #[error("invalid UTF-8 in IR field '{field}'")]
    InvalidUtf8 {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Flyweight codec error while reading or writing serialized IR.
    #[error("codec error: {0}")]
    Codec(#[from] wiresbe_core::Error),

    /// IO error while reading or writing an `.sbeir` file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for IR operations.
pub type Result<T> = std::result::Result<T, IrError>;
