//! Error types for on-the-fly decoding.

use thiserror::Error;

/// Error type for OTF decoding operations.
///
/// A fatal error aborts the token walk; no callbacks follow it, and the
/// decoder never resumes mid-message. A fresh `decode` call starts over.
#[derive(Debug, Error)]
pub enum OtfError {
    /// Buffer access or flyweight failure (most commonly a short
    /// buffer).
    #[error("codec error: {0}")]
    Codec(#[from] wiresbe_core::Error),

    /// The envelope token list lacks a required encoding.
    #[error("header encoding '{name}' missing from envelope tokens")]
    HeaderEncodingMissing {
        /// The missing encoding name.
        name: &'static str,
    },

    /// The envelope names a template the IR collection does not know.
    #[error("template {template_id} (schema version {schema_version}) not found in IR")]
    TemplateNotFound {
        /// Template id from the envelope.
        template_id: u64,
        /// Schema version from the envelope.
        schema_version: u64,
    },

    /// Token walk hit a token of the wrong kind.
    #[error("unexpected token at index {index}: expected {expected}, found {actual}")]
    UnexpectedToken {
        /// What the walk required.
        expected: &'static str,
        /// What it found.
        actual: String,
        /// Token index.
        index: usize,
    },

    /// A group token is not followed by a dimensions composite.
    #[error("group '{group}' has no dimensions composite")]
    MissingDimensions {
        /// Group name.
        group: String,
    },

    /// An encoding that must be an unsigned integer is not.
    #[error("encoding '{name}' is not an unsigned integer")]
    NotUnsigned {
        /// Encoding name.
        name: String,
    },

    /// Token bookkeeping (component counts, list length) is
    /// inconsistent.
    #[error("malformed tokens: {reason}")]
    MalformedTokens {
        /// Description of the inconsistency.
        reason: String,
    },
}

/// Result type alias for OTF decoding operations.
pub type Result<T> = std::result::Result<T, OtfError>;
