//! Decoder contract for SBE messages.
//!
//! Generated message decoders wrap a received buffer with the *acting*
//! block length and version taken from the envelope, which drives
//! forward/backward schema evolution: truncated fields read their null
//! sentinel, extra trailing bytes are skipped.

use crate::error::Result;
use crate::header::MessageHeader;
use crate::message::SbeMessage;

/// Trait for zero-copy SBE message decoders.
///
/// # Example
/// ```ignore
/// // Generated decoder usage
/// let car = CarDecoder::decode(&buffer)?;
/// let serial = car.serial_number()?;
/// ```
pub trait SbeDecoder<'a>: SbeMessage + Sized {
    /// Wraps a buffer for decoding a message at `offset`.
    ///
    /// The variable-region cursor starts at
    /// `offset + acting_block_length` - the writer's block length, not
    /// the reader's, so groups and var-data are found where the writer
    /// put them.
    ///
    /// # Arguments
    /// * `buffer` - Byte buffer containing the message
    /// * `offset` - Byte offset where the fixed block starts (after the
    ///   envelope)
    /// * `acting_block_length` - Block length advertised in the envelope
    /// * `acting_version` - Schema version advertised in the envelope
    ///
    /// # Errors
    /// Returns `Error::BufferTooShort` when the acting fixed block does
    /// not fit.
    fn wrap_for_decode(
        buffer: &'a [u8],
        offset: usize,
        acting_block_length: u16,
        acting_version: u16,
    ) -> Result<Self>;

    /// Returns the number of bytes consumed so far, from the wrap offset
    /// to the cursor.
    fn encoded_length(&self) -> usize;

    /// Validates that an envelope matches this message type.
    ///
    /// # Errors
    /// Returns `Error::TemplateMismatch` or `Error::SchemaMismatch` on a
    /// foreign envelope.
    fn validate_header(header: &MessageHeader) -> Result<()> {
        crate::encoder::validate_header_for::<Self>(header)
    }

    /// Decodes a message from a buffer that starts with its envelope.
    ///
    /// Reads and validates the envelope, then wraps the message body
    /// with the acting block length and version it advertises.
    ///
    /// # Errors
    /// Returns `Error::BufferTooShort`, `Error::TemplateMismatch`, or
    /// `Error::SchemaMismatch`.
    fn decode(buffer: &'a [u8]) -> Result<Self> {
        let header = MessageHeader::read(buffer, 0)?;
        Self::validate_header(&header)?;
        Self::wrap_for_decode(
            buffer,
            MessageHeader::ENCODED_LENGTH,
            header.block_length,
            header.version,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds;
    use crate::buffer::ReadBuffer;
    use crate::cursor::Cursor;
    use crate::error::Error;

    /// Minimal single-field decoder used to exercise the trait defaults.
    #[derive(Debug)]
    struct ValueDecoder<'a> {
        buffer: &'a [u8],
        offset: usize,
        acting_block_length: u16,
        cursor: Cursor,
    }

    impl SbeMessage for ValueDecoder<'_> {
        const BLOCK_LENGTH: u16 = 4;
        const TEMPLATE_ID: u16 = 5;
        const SCHEMA_ID: u16 = 1;
        const SCHEMA_VERSION: u16 = 0;
    }

    impl<'a> SbeDecoder<'a> for ValueDecoder<'a> {
        fn wrap_for_decode(
            buffer: &'a [u8],
            offset: usize,
            acting_block_length: u16,
            acting_version: u16,
        ) -> crate::error::Result<Self> {
            let _ = acting_version;
            bounds::check(buffer.len(), offset, acting_block_length as usize)?;
            Ok(Self {
                buffer,
                offset,
                acting_block_length,
                cursor: Cursor::new(offset + acting_block_length as usize),
            })
        }

        fn encoded_length(&self) -> usize {
            self.cursor.position() - self.offset
        }
    }

    impl ValueDecoder<'_> {
        fn value(&self) -> crate::error::Result<u32> {
            bounds::check(self.buffer.len(), self.offset, 4)?;
            Ok(self.buffer.get_u32_le(self.offset))
        }
    }

    #[test]
    fn test_decode_with_envelope() {
        let mut buffer = vec![0u8; 16];
        MessageHeader::new(4, 5, 1, 0).encode(&mut buffer, 0);
        buffer[8..12].copy_from_slice(&0xCAFEBABEu32.to_le_bytes());

        let decoder = ValueDecoder::decode(&buffer).unwrap();
        assert_eq!(decoder.value().unwrap(), 0xCAFEBABE);
        assert_eq!(decoder.acting_block_length, 4);
        assert_eq!(decoder.encoded_length(), 4);
    }

    #[test]
    fn test_decode_rejects_foreign_template() {
        let mut buffer = vec![0u8; 16];
        MessageHeader::new(4, 99, 1, 0).encode(&mut buffer, 0);
        assert_eq!(
            ValueDecoder::decode(&buffer).unwrap_err(),
            Error::TemplateMismatch {
                expected: 5,
                actual: 99,
            }
        );
    }

    #[test]
    fn test_decode_envelope_only_buffer() {
        let mut buffer = vec![0u8; 8];
        MessageHeader::new(4, 5, 1, 0).encode(&mut buffer, 0);
        // Envelope reads fine, the fixed block does not fit.
        assert!(matches!(
            ValueDecoder::decode(&buffer).unwrap_err(),
            Error::BufferTooShort { .. }
        ));
    }
}
