//! Encoder contract for SBE messages.
//!
//! Generated message encoders wrap a caller-owned buffer and expose
//! field setters writing at statically known offsets, with the
//! variable-region cursor starting just past the fixed block.

use crate::error::Result;
use crate::header::MessageHeader;
use crate::message::SbeMessage;

/// Trait for zero-copy SBE message encoders.
///
/// Implementations hold `(buffer, offset, cursor)` and nothing else; no
/// allocation happens on any setter path.
///
/// # Example
/// ```ignore
/// // Generated encoder usage
/// CarEncoder::encode_header(&mut buffer, 0)?;
/// let mut car = CarEncoder::wrap_for_encode(&mut buffer, 8)?;
/// car.set_serial_number(1234)?;
/// car.set_model_year(2013)?;
/// let len = car.encoded_length();
/// ```
pub trait SbeEncoder<'a>: SbeMessage + Sized {
    /// Wraps a mutable buffer for encoding a message at `offset`.
    ///
    /// The variable-region cursor starts at `offset + BLOCK_LENGTH`.
    /// Buffer contents outside written fields are left untouched.
    ///
    /// # Arguments
    /// * `buffer` - Mutable byte buffer to write to
    /// * `offset` - Byte offset where the fixed block starts (after the
    ///   envelope)
    ///
    /// # Errors
    /// Returns `Error::BufferTooShort` when the fixed block does not fit.
    fn wrap_for_encode(buffer: &'a mut [u8], offset: usize) -> Result<Self>;

    /// Returns the number of bytes encoded so far, from the wrap offset
    /// to the cursor.
    fn encoded_length(&self) -> usize;

    /// Writes the message envelope for this type at `offset`.
    ///
    /// # Errors
    /// Returns `Error::BufferTooShort` when fewer than 8 bytes remain.
    fn encode_header(buffer: &mut [u8], offset: usize) -> Result<()> {
        Self::header().write(buffer, offset)
    }
}

/// Convenience check that an envelope matches this message type before
/// re-encoding over an existing message.
///
/// # Errors
/// Returns `Error::TemplateMismatch` or `Error::SchemaMismatch` when the
/// envelope belongs to a different message type.
pub fn validate_header_for<M: SbeMessage>(header: &MessageHeader) -> Result<()> {
    if header.template_id != M::TEMPLATE_ID {
        return Err(crate::error::Error::TemplateMismatch {
            expected: M::TEMPLATE_ID,
            actual: header.template_id,
        });
    }
    if header.schema_id != M::SCHEMA_ID {
        return Err(crate::error::Error::SchemaMismatch {
            expected: M::SCHEMA_ID,
            actual: header.schema_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Probe;

    impl SbeMessage for Probe {
        const BLOCK_LENGTH: u16 = 4;
        const TEMPLATE_ID: u16 = 9;
        const SCHEMA_ID: u16 = 2;
        const SCHEMA_VERSION: u16 = 3;
    }

    #[test]
    fn test_validate_header_for() {
        let good = MessageHeader::new(4, 9, 2, 3);
        assert!(validate_header_for::<Probe>(&good).is_ok());

        let wrong_template = MessageHeader::new(4, 8, 2, 3);
        assert_eq!(
            validate_header_for::<Probe>(&wrong_template).unwrap_err(),
            Error::TemplateMismatch {
                expected: 9,
                actual: 8,
            }
        );

        let wrong_schema = MessageHeader::new(4, 9, 7, 3);
        assert_eq!(
            validate_header_for::<Probe>(&wrong_schema).unwrap_err(),
            Error::SchemaMismatch {
                expected: 2,
                actual: 7,
            }
        );
    }
}
