//! Envelope decoding from IR tokens.
//!
//! The envelope layout is schema-defined; this decoder caches the
//! offset, primitive type, and byte order of the four required encodings
//! (`blockLength`, `templateId`, `schemaId`, `version`) from the
//! envelope composite's token list and reads them as unsigned integers.

use crate::decoder::read_unsigned;
use crate::error::{OtfError, Result};
use wiresbe_core::types::{ByteOrder, PrimitiveType};
use wiresbe_ir::token::{Signal, Token};

#[derive(Debug, Clone, Copy)]
struct CachedEncoding {
    offset: usize,
    primitive_type: PrimitiveType,
    byte_order: ByteOrder,
}

/// Decoder for the message envelope, built once per schema from the
/// envelope token list and reused across buffers.
#[derive(Debug)]
pub struct OtfHeaderDecoder {
    encoded_length: u32,
    block_length: CachedEncoding,
    template_id: CachedEncoding,
    schema_id: CachedEncoding,
    schema_version: CachedEncoding,
}

impl OtfHeaderDecoder {
    /// Builds a header decoder from the envelope composite tokens.
    ///
    /// # Errors
    /// Returns `OtfError::HeaderEncodingMissing` when one of the four
    /// required encodings is absent, or `OtfError::MalformedTokens`
    /// when the list does not start with a composite.
    pub fn new(tokens: &[Token]) -> Result<Self> {
        let root = tokens.first().ok_or(OtfError::MalformedTokens {
            reason: "empty envelope token list".to_string(),
        })?;
        if root.signal != Signal::BeginComposite {
            return Err(OtfError::MalformedTokens {
                reason: "envelope tokens do not start with a composite".to_string(),
            });
        }
        let encoded_length = root.encoded_length as u32;

        let cache = |name: &'static str| -> Result<CachedEncoding> {
            let token = tokens
                .iter()
                .find(|token| token.signal == Signal::Encoding && token.name == name)
                .ok_or(OtfError::HeaderEncodingMissing { name })?;
            let primitive_type = token
                .encoding
                .primitive_type
                .ok_or(OtfError::HeaderEncodingMissing { name })?;
            Ok(CachedEncoding {
                offset: token.offset as usize,
                primitive_type,
                byte_order: token.encoding.byte_order,
            })
        };

        Ok(Self {
            encoded_length,
            block_length: cache("blockLength")?,
            template_id: cache("templateId")?,
            schema_id: cache("schemaId")?,
            schema_version: cache("version")?,
        })
    }

    /// Returns the envelope's encoded length in bytes.
    #[must_use]
    pub const fn encoded_length(&self) -> u32 {
        self.encoded_length
    }

    /// Reads the fixed-block length from an envelope at the start of
    /// `buffer`.
    ///
    /// # Errors
    /// Returns `OtfError::Codec` on a short buffer or
    /// `OtfError::NotUnsigned` on a misdeclared schema.
    pub fn block_length(&self, buffer: &[u8]) -> Result<u64> {
        self.read(buffer, &self.block_length, "blockLength")
    }

    /// Reads the template id from an envelope at the start of `buffer`.
    ///
    /// # Errors
    /// Returns `OtfError::Codec` on a short buffer or
    /// `OtfError::NotUnsigned` on a misdeclared schema.
    pub fn template_id(&self, buffer: &[u8]) -> Result<u64> {
        self.read(buffer, &self.template_id, "templateId")
    }

    /// Reads the schema id from an envelope at the start of `buffer`.
    ///
    /// # Errors
    /// Returns `OtfError::Codec` on a short buffer or
    /// `OtfError::NotUnsigned` on a misdeclared schema.
    pub fn schema_id(&self, buffer: &[u8]) -> Result<u64> {
        self.read(buffer, &self.schema_id, "schemaId")
    }

    /// Reads the schema version from an envelope at the start of
    /// `buffer`.
    ///
    /// # Errors
    /// Returns `OtfError::Codec` on a short buffer or
    /// `OtfError::NotUnsigned` on a misdeclared schema.
    pub fn schema_version(&self, buffer: &[u8]) -> Result<u64> {
        self.read(buffer, &self.schema_version, "version")
    }

    fn read(&self, buffer: &[u8], encoding: &CachedEncoding, name: &str) -> Result<u64> {
        read_unsigned(
            buffer,
            encoding.offset,
            encoding.primitive_type,
            encoding.byte_order,
        )?
        .ok_or_else(|| OtfError::NotUnsigned {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiresbe_core::buffer::WriteBuffer;
    use wiresbe_core::header::MessageHeader;
    use wiresbe_ir::builder::TokenListBuilder;

    #[test]
    fn test_standard_header_decode() {
        let tokens = TokenListBuilder::standard_header().unwrap();
        let decoder = OtfHeaderDecoder::new(&tokens).unwrap();
        assert_eq!(decoder.encoded_length(), 8);

        let mut buffer = vec![0u8; 16];
        MessageHeader::new(47, 1, 6, 3).encode(&mut buffer, 0);

        assert_eq!(decoder.block_length(&buffer).unwrap(), 47);
        assert_eq!(decoder.template_id(&buffer).unwrap(), 1);
        assert_eq!(decoder.schema_id(&buffer).unwrap(), 6);
        assert_eq!(decoder.schema_version(&buffer).unwrap(), 3);
    }

    #[test]
    fn test_custom_header_layout() {
        // A schema may reorder the envelope and widen its fields; the
        // decoder follows the tokens, never fixed offsets.
        let mut builder = TokenListBuilder::new();
        builder
            .begin_composite("messageHeader", 0, 12)
            .encoding("templateId", PrimitiveType::Uint32, 0)
            .encoding("blockLength", PrimitiveType::Uint32, 4)
            .encoding("schemaId", PrimitiveType::Uint16, 8)
            .encoding("version", PrimitiveType::Uint16, 10)
            .end_composite();
        let tokens = builder.build().unwrap();
        let decoder = OtfHeaderDecoder::new(&tokens).unwrap();
        assert_eq!(decoder.encoded_length(), 12);

        let mut buffer = vec![0u8; 12];
        buffer.put_u32_le(0, 70_000);
        buffer.put_u32_le(4, 123);
        buffer.put_u16_le(8, 5);
        buffer.put_u16_le(10, 2);

        assert_eq!(decoder.template_id(&buffer).unwrap(), 70_000);
        assert_eq!(decoder.block_length(&buffer).unwrap(), 123);
        assert_eq!(decoder.schema_id(&buffer).unwrap(), 5);
        assert_eq!(decoder.schema_version(&buffer).unwrap(), 2);
    }

    #[test]
    fn test_missing_encoding_rejected() {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_composite("messageHeader", 0, 6)
            .encoding("blockLength", PrimitiveType::Uint16, 0)
            .encoding("templateId", PrimitiveType::Uint16, 2)
            .encoding("schemaId", PrimitiveType::Uint16, 4)
            .end_composite();
        let tokens = builder.build().unwrap();
        assert!(matches!(
            OtfHeaderDecoder::new(&tokens),
            Err(OtfError::HeaderEncodingMissing { name: "version" })
        ));
    }

    #[test]
    fn test_short_buffer() {
        let tokens = TokenListBuilder::standard_header().unwrap();
        let decoder = OtfHeaderDecoder::new(&tokens).unwrap();
        let buffer = vec![0u8; 7];
        assert!(decoder.schema_version(&buffer).is_err());
    }
}
