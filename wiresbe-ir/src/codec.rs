//! Serialization of the IR itself as SBE messages.
//!
//! An `.sbeir` stream is: one Frame message, then the envelope composite
//! as Token messages, then each message template's token list as Token
//! messages. Every embedded message carries the standard 8-byte
//! envelope; readers dispatch on its template id (1 = Frame, 2 = Token).
//!
//! The Frame and Token codecs below are hand-built flyweights over
//! `wiresbe-core` - the IR travels through exactly the same machinery as
//! any other SBE message.
//!
//! # Wire Format - Frame (blockLength 12)
//! ```text
//! +0: irId           (i32)
//! +4: irVersion      (i32)
//! +8: schemaVersion  (i32)
//! var: packageName, namespaceName, semanticVersion (u16 prefix each)
//! ```
//!
//! # Wire Format - Token (blockLength 24)
//! ```text
//! +0:  tokenOffset          (i32)
//! +4:  tokenSize            (i32)
//! +8:  fieldId              (i32)
//! +12: tokenVersion         (i32)
//! +16: componentTokenCount  (i32)
//! +20: signal               (u8)
//! +21: primitiveType        (u8)
//! +22: byteOrder            (u8)
//! +23: presence             (u8)
//! var: name, constValue, minValue, maxValue, nullValue,
//!      characterEncoding, epoch, timeUnit, semanticType, description
//!      (u16 prefix each)
//! ```

use crate::error::{IrError, Result};
use crate::ir::Ir;
use crate::token::{Encoding, PrimitiveValue, Signal, Token};
use std::path::Path;
use wiresbe_core::bounds;
use wiresbe_core::buffer::{ReadBuffer, WriteBuffer};
use wiresbe_core::cursor::Cursor;
use wiresbe_core::header::MessageHeader;
use wiresbe_core::message::SbeMessage;
use wiresbe_core::types::{ByteOrder, Presence, PrimitiveType};
use wiresbe_core::var_data;

/// Schema id of the serialized IR schema.
pub const IR_SCHEMA_ID: u16 = 1;
/// Version of the serialized IR schema.
pub const IR_SCHEMA_VERSION: u16 = 0;
/// Template id of the Frame message.
pub const FRAME_TEMPLATE_ID: u16 = 1;
/// Template id of the Token message.
pub const TOKEN_TEMPLATE_ID: u16 = 2;

const FRAME_BLOCK_LENGTH: u16 = 12;
const TOKEN_BLOCK_LENGTH: u16 = 24;
const VAR_FIELDS_PER_TOKEN: usize = 10;

/// Flyweight encoder for the Frame message.
pub struct FrameEncoder<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    cursor: Cursor,
}

impl SbeMessage for FrameEncoder<'_> {
    const BLOCK_LENGTH: u16 = FRAME_BLOCK_LENGTH;
    const TEMPLATE_ID: u16 = FRAME_TEMPLATE_ID;
    const SCHEMA_ID: u16 = IR_SCHEMA_ID;
    const SCHEMA_VERSION: u16 = IR_SCHEMA_VERSION;
}

impl<'a> wiresbe_core::SbeEncoder<'a> for FrameEncoder<'a> {
    fn wrap_for_encode(buffer: &'a mut [u8], offset: usize) -> wiresbe_core::Result<Self> {
        bounds::check(buffer.len(), offset, Self::BLOCK_LENGTH as usize)?;
        Ok(Self {
            buffer,
            offset,
            cursor: Cursor::new(offset + Self::BLOCK_LENGTH as usize),
        })
    }

    fn encoded_length(&self) -> usize {
        self.cursor.position() - self.offset
    }
}

impl FrameEncoder<'_> {
    /// Sets the schema id carried by the IR.
    pub fn set_ir_id(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset, value);
        self
    }

    /// Sets the serialized IR format version.
    pub fn set_ir_version(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset + 4, value);
        self
    }

    /// Sets the schema version.
    pub fn set_schema_version(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset + 8, value);
        self
    }

    /// Writes the package name var-data field.
    ///
    /// # Errors
    /// Returns a codec error when the field does not fit.
    pub fn put_package_name(&mut self, src: &[u8]) -> wiresbe_core::Result<()> {
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, src)
    }

    /// Writes the namespace name var-data field.
    ///
    /// # Errors
    /// Returns a codec error when the field does not fit.
    pub fn put_namespace_name(&mut self, src: &[u8]) -> wiresbe_core::Result<()> {
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, src)
    }

    /// Writes the semantic version var-data field.
    ///
    /// # Errors
    /// Returns a codec error when the field does not fit.
    pub fn put_semantic_version(&mut self, src: &[u8]) -> wiresbe_core::Result<()> {
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, src)
    }
}

/// Flyweight decoder for the Frame message.
pub struct FrameDecoder<'a> {
    buffer: &'a [u8],
    offset: usize,
    cursor: Cursor,
}

impl SbeMessage for FrameDecoder<'_> {
    const BLOCK_LENGTH: u16 = FRAME_BLOCK_LENGTH;
    const TEMPLATE_ID: u16 = FRAME_TEMPLATE_ID;
    const SCHEMA_ID: u16 = IR_SCHEMA_ID;
    const SCHEMA_VERSION: u16 = IR_SCHEMA_VERSION;
}

impl<'a> wiresbe_core::SbeDecoder<'a> for FrameDecoder<'a> {
    fn wrap_for_decode(
        buffer: &'a [u8],
        offset: usize,
        acting_block_length: u16,
        acting_version: u16,
    ) -> wiresbe_core::Result<Self> {
        let _ = acting_version;
        bounds::check(buffer.len(), offset, acting_block_length as usize)?;
        Ok(Self {
            buffer,
            offset,
            cursor: Cursor::new(offset + acting_block_length as usize),
        })
    }

    fn encoded_length(&self) -> usize {
        self.cursor.position() - self.offset
    }
}

impl<'a> FrameDecoder<'a> {
    /// Returns the schema id carried by the IR.
    #[must_use]
    pub fn ir_id(&self) -> i32 {
        self.buffer.get_i32_le(self.offset)
    }

    /// Returns the serialized IR format version.
    #[must_use]
    pub fn ir_version(&self) -> i32 {
        self.buffer.get_i32_le(self.offset + 4)
    }

    /// Returns the schema version.
    #[must_use]
    pub fn schema_version(&self) -> i32 {
        self.buffer.get_i32_le(self.offset + 8)
    }

    /// Reads the package name var-data field.
    ///
    /// # Errors
    /// Returns a codec error when the field crosses the buffer end.
    pub fn package_name(&mut self) -> wiresbe_core::Result<&'a [u8]> {
        var_data::get_u16_prefixed(self.buffer, &mut self.cursor)
    }

    /// Reads the namespace name var-data field.
    ///
    /// # Errors
    /// Returns a codec error when the field crosses the buffer end.
    pub fn namespace_name(&mut self) -> wiresbe_core::Result<&'a [u8]> {
        var_data::get_u16_prefixed(self.buffer, &mut self.cursor)
    }

    /// Reads the semantic version var-data field.
    ///
    /// # Errors
    /// Returns a codec error when the field crosses the buffer end.
    pub fn semantic_version(&mut self) -> wiresbe_core::Result<&'a [u8]> {
        var_data::get_u16_prefixed(self.buffer, &mut self.cursor)
    }
}

/// Flyweight encoder for the Token message.
///
/// The ten var-data fields must be written in declaration order:
/// name, constValue, minValue, maxValue, nullValue, characterEncoding,
/// epoch, timeUnit, semanticType, description.
pub struct TokenEncoder<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    cursor: Cursor,
}

impl SbeMessage for TokenEncoder<'_> {
    const BLOCK_LENGTH: u16 = TOKEN_BLOCK_LENGTH;
    const TEMPLATE_ID: u16 = TOKEN_TEMPLATE_ID;
    const SCHEMA_ID: u16 = IR_SCHEMA_ID;
    const SCHEMA_VERSION: u16 = IR_SCHEMA_VERSION;
}

impl<'a> wiresbe_core::SbeEncoder<'a> for TokenEncoder<'a> {
    fn wrap_for_encode(buffer: &'a mut [u8], offset: usize) -> wiresbe_core::Result<Self> {
        bounds::check(buffer.len(), offset, Self::BLOCK_LENGTH as usize)?;
        Ok(Self {
            buffer,
            offset,
            cursor: Cursor::new(offset + Self::BLOCK_LENGTH as usize),
        })
    }

    fn encoded_length(&self) -> usize {
        self.cursor.position() - self.offset
    }
}

impl TokenEncoder<'_> {
    /// Sets the token's byte offset within its enclosing block.
    pub fn set_token_offset(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset, value);
        self
    }

    /// Sets the token's encoded length in bytes.
    pub fn set_token_size(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset + 4, value);
        self
    }

    /// Sets the field id.
    pub fn set_field_id(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset + 8, value);
        self
    }

    /// Sets the version in which the element was added.
    pub fn set_token_version(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset + 12, value);
        self
    }

    /// Sets the token count of the element's subtree.
    pub fn set_component_token_count(&mut self, value: i32) -> &mut Self {
        self.buffer.put_i32_le(self.offset + 16, value);
        self
    }

    /// Sets the signal wire value.
    pub fn set_signal(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(self.offset + 20, value);
        self
    }

    /// Sets the primitive type wire value (0 for none).
    pub fn set_primitive_type(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(self.offset + 21, value);
        self
    }

    /// Sets the byte order wire value.
    pub fn set_byte_order(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(self.offset + 22, value);
        self
    }

    /// Sets the presence wire value.
    pub fn set_presence(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(self.offset + 23, value);
        self
    }

    /// Writes the next var-data field in declaration order.
    ///
    /// # Errors
    /// Returns a codec error when the field does not fit.
    pub fn put_var_field(&mut self, src: &[u8]) -> wiresbe_core::Result<()> {
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, src)
    }
}

/// Flyweight decoder for the Token message.
pub struct TokenDecoder<'a> {
    buffer: &'a [u8],
    offset: usize,
    cursor: Cursor,
}

impl SbeMessage for TokenDecoder<'_> {
    const BLOCK_LENGTH: u16 = TOKEN_BLOCK_LENGTH;
    const TEMPLATE_ID: u16 = TOKEN_TEMPLATE_ID;
    const SCHEMA_ID: u16 = IR_SCHEMA_ID;
    const SCHEMA_VERSION: u16 = IR_SCHEMA_VERSION;
}

impl<'a> wiresbe_core::SbeDecoder<'a> for TokenDecoder<'a> {
    fn wrap_for_decode(
        buffer: &'a [u8],
        offset: usize,
        acting_block_length: u16,
        acting_version: u16,
    ) -> wiresbe_core::Result<Self> {
        let _ = acting_version;
        bounds::check(buffer.len(), offset, acting_block_length as usize)?;
        Ok(Self {
            buffer,
            offset,
            cursor: Cursor::new(offset + acting_block_length as usize),
        })
    }

    fn encoded_length(&self) -> usize {
        self.cursor.position() - self.offset
    }
}

impl<'a> TokenDecoder<'a> {
    /// Returns the token's byte offset within its enclosing block.
    #[must_use]
    pub fn token_offset(&self) -> i32 {
        self.buffer.get_i32_le(self.offset)
    }

    /// Returns the token's encoded length in bytes.
    #[must_use]
    pub fn token_size(&self) -> i32 {
        self.buffer.get_i32_le(self.offset + 4)
    }

    /// Returns the field id.
    #[must_use]
    pub fn field_id(&self) -> i32 {
        self.buffer.get_i32_le(self.offset + 8)
    }

    /// Returns the version in which the element was added.
    #[must_use]
    pub fn token_version(&self) -> i32 {
        self.buffer.get_i32_le(self.offset + 12)
    }

    /// Returns the token count of the element's subtree.
    #[must_use]
    pub fn component_token_count(&self) -> i32 {
        self.buffer.get_i32_le(self.offset + 16)
    }

    /// Returns the signal wire value.
    #[must_use]
    pub fn signal(&self) -> u8 {
        self.buffer.get_u8(self.offset + 20)
    }

    /// Returns the primitive type wire value (0 for none).
    #[must_use]
    pub fn primitive_type(&self) -> u8 {
        self.buffer.get_u8(self.offset + 21)
    }

    /// Returns the byte order wire value.
    #[must_use]
    pub fn byte_order(&self) -> u8 {
        self.buffer.get_u8(self.offset + 22)
    }

    /// Returns the presence wire value.
    #[must_use]
    pub fn presence(&self) -> u8 {
        self.buffer.get_u8(self.offset + 23)
    }

    /// Reads the next var-data field in declaration order.
    ///
    /// # Errors
    /// Returns a codec error when the field crosses the buffer end.
    pub fn var_field(&mut self) -> wiresbe_core::Result<&'a [u8]> {
        var_data::get_u16_prefixed(self.buffer, &mut self.cursor)
    }
}

/// Serializes an [`Ir`] collection to an `.sbeir` byte stream.
pub struct IrEncoder;

impl IrEncoder {
    /// Encodes the IR: Frame first, then the envelope composite tokens,
    /// then each message's token list.
    ///
    /// # Errors
    /// Returns an error when a token carries a constant without a
    /// primitive type, or on internal codec failure.
    pub fn encode(ir: &Ir) -> Result<Vec<u8>> {
        let mut size = Self::frame_size(ir);
        for token in ir.header_tokens() {
            size += Self::token_size(token);
        }
        for message in ir.messages() {
            for token in message {
                size += Self::token_size(token);
            }
        }

        let mut buffer = vec![0u8; size];
        let mut position = Self::encode_frame(ir, &mut buffer, 0)?;
        for token in ir.header_tokens() {
            position += Self::encode_token(token, &mut buffer, position)?;
        }
        for message in ir.messages() {
            for token in message {
                position += Self::encode_token(token, &mut buffer, position)?;
            }
        }
        debug_assert_eq!(position, size);
        Ok(buffer)
    }

    /// Encodes the IR and writes it to an `.sbeir` file.
    ///
    /// # Errors
    /// Returns encoding or IO errors.
    pub fn write_file(ir: &Ir, path: impl AsRef<Path>) -> Result<()> {
        let bytes = Self::encode(ir)?;
        std::fs::write(path.as_ref(), &bytes)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            bytes = bytes.len(),
            "wrote IR file"
        );
        Ok(())
    }

    fn frame_size(ir: &Ir) -> usize {
        MessageHeader::ENCODED_LENGTH
            + FRAME_BLOCK_LENGTH as usize
            + (2 + ir.package().len())
            + (2 + ir.namespace().map_or(0, str::len))
            + (2 + ir.semantic_version().map_or(0, str::len))
    }

    fn token_size(token: &Token) -> usize {
        let value_len = |value: &Option<PrimitiveValue>| {
            value.as_ref().map_or(0, |v| {
                token
                    .encoding
                    .primitive_type
                    .map_or(0, |ty| v.wire_bytes(ty).len())
            })
        };
        let text_len = |text: &Option<String>| text.as_ref().map_or(0, String::len);

        MessageHeader::ENCODED_LENGTH
            + TOKEN_BLOCK_LENGTH as usize
            + 2 * VAR_FIELDS_PER_TOKEN
            + token.name.len()
            + value_len(&token.encoding.const_value)
            + value_len(&token.encoding.min_value)
            + value_len(&token.encoding.max_value)
            + value_len(&token.encoding.null_value)
            + text_len(&token.encoding.character_encoding)
            + text_len(&token.encoding.epoch)
            + text_len(&token.encoding.time_unit)
            + text_len(&token.encoding.semantic_type)
            + text_len(&token.description)
    }

    fn encode_frame(ir: &Ir, buffer: &mut [u8], offset: usize) -> Result<usize> {
        use wiresbe_core::SbeEncoder;

        FrameEncoder::header().write(buffer, offset)?;
        let mut frame = FrameEncoder::wrap_for_encode(buffer, offset + MessageHeader::ENCODED_LENGTH)?;
        frame
            .set_ir_id(ir.ir_id())
            .set_ir_version(ir.ir_version())
            .set_schema_version(ir.schema_version());
        frame.put_package_name(ir.package().as_bytes())?;
        frame.put_namespace_name(ir.namespace().unwrap_or("").as_bytes())?;
        frame.put_semantic_version(ir.semantic_version().unwrap_or("").as_bytes())?;
        Ok(MessageHeader::ENCODED_LENGTH + frame.encoded_length())
    }

    fn encode_token(token: &Token, buffer: &mut [u8], offset: usize) -> Result<usize> {
        use wiresbe_core::SbeEncoder;

        let value_bytes = |value: &Option<PrimitiveValue>| -> Vec<u8> {
            match (value, token.encoding.primitive_type) {
                (Some(v), Some(ty)) => v.wire_bytes(ty),
                _ => Vec::new(),
            }
        };
        let text_bytes =
            |text: &Option<String>| text.as_deref().unwrap_or("").as_bytes().to_vec();

        TokenEncoder::header().write(buffer, offset)?;
        let mut encoder =
            TokenEncoder::wrap_for_encode(buffer, offset + MessageHeader::ENCODED_LENGTH)?;
        encoder
            .set_token_offset(token.offset)
            .set_token_size(token.encoded_length)
            .set_field_id(token.id)
            .set_token_version(token.version)
            .set_component_token_count(token.component_token_count)
            .set_signal(token.signal.wire_value())
            .set_primitive_type(
                token
                    .encoding
                    .primitive_type
                    .map_or(0, |ty| ty.wire_value()),
            )
            .set_byte_order(token.encoding.byte_order.wire_value())
            .set_presence(token.encoding.presence.wire_value());

        encoder.put_var_field(token.name.as_bytes())?;
        encoder.put_var_field(&value_bytes(&token.encoding.const_value))?;
        encoder.put_var_field(&value_bytes(&token.encoding.min_value))?;
        encoder.put_var_field(&value_bytes(&token.encoding.max_value))?;
        encoder.put_var_field(&value_bytes(&token.encoding.null_value))?;
        encoder.put_var_field(&text_bytes(&token.encoding.character_encoding))?;
        encoder.put_var_field(&text_bytes(&token.encoding.epoch))?;
        encoder.put_var_field(&text_bytes(&token.encoding.time_unit))?;
        encoder.put_var_field(&text_bytes(&token.encoding.semantic_type))?;
        encoder.put_var_field(&text_bytes(&token.description))?;
        Ok(MessageHeader::ENCODED_LENGTH + encoder.encoded_length())
    }
}

/// Deserializes an [`Ir`] collection from an `.sbeir` byte stream.
pub struct IrDecoder;

impl IrDecoder {
    /// Decodes a serialized IR stream.
    ///
    /// The stream must start with a Frame; every subsequent message must
    /// be a Token. Top-level token regions are grouped by nesting: the
    /// first composite region becomes the envelope layout, each
    /// `BeginMessage` region becomes one message template. The resulting
    /// collection is fully well-formedness checked.
    ///
    /// # Errors
    /// Returns `IrError::MissingFrame`, `IrError::UnknownTemplateId`,
    /// `IrError::MalformedIr`, or a codec error on a truncated stream.
    pub fn decode(buffer: &[u8]) -> Result<Ir> {
        use wiresbe_core::SbeDecoder;

        let envelope = MessageHeader::read(buffer, 0).map_err(|_| IrError::MissingFrame)?;
        if envelope.template_id != FRAME_TEMPLATE_ID {
            return Err(IrError::MissingFrame);
        }
        if envelope.block_length < FRAME_BLOCK_LENGTH {
            return Err(IrError::MalformedIr {
                reason: format!("frame block length {} too short", { envelope.block_length }),
            });
        }

        let mut frame = FrameDecoder::wrap_for_decode(
            buffer,
            MessageHeader::ENCODED_LENGTH,
            envelope.block_length,
            envelope.version,
        )?;
        let ir_id = frame.ir_id();
        let ir_version = frame.ir_version();
        let schema_version = frame.schema_version();
        let package = utf8(frame.package_name()?, "packageName")?;
        let namespace = utf8(frame.namespace_name()?, "namespaceName")?;
        let semantic_version = utf8(frame.semantic_version()?, "semanticVersion")?;
        let mut position = MessageHeader::ENCODED_LENGTH + frame.encoded_length();

        let mut header_tokens: Option<Vec<Token>> = None;
        let mut messages: Vec<Vec<Token>> = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut depth: i32 = 0;

        while position < buffer.len() {
            let envelope = MessageHeader::read(buffer, position)?;
            if envelope.template_id != TOKEN_TEMPLATE_ID {
                return Err(IrError::UnknownTemplateId {
                    template_id: envelope.template_id,
                });
            }
            if envelope.block_length < TOKEN_BLOCK_LENGTH {
                return Err(IrError::MalformedIr {
                    reason: format!("token block length {} too short", { envelope.block_length }),
                });
            }

            let mut decoder = TokenDecoder::wrap_for_decode(
                buffer,
                position + MessageHeader::ENCODED_LENGTH,
                envelope.block_length,
                envelope.version,
            )?;
            let token = read_token(&mut decoder)?;
            position += MessageHeader::ENCODED_LENGTH + decoder.encoded_length();

            if token.signal.is_begin() {
                depth += 1;
            }
            let ends_region = token.signal.is_end();
            current.push(token);
            if ends_region {
                depth -= 1;
                if depth < 0 {
                    return Err(IrError::MalformedIr {
                        reason: "end token without a matching begin".to_string(),
                    });
                }
                if depth == 0 {
                    let region = std::mem::take(&mut current);
                    match region[0].signal {
                        Signal::BeginComposite if header_tokens.is_none() => {
                            header_tokens = Some(region);
                        }
                        Signal::BeginMessage => messages.push(region),
                        signal => {
                            return Err(IrError::MalformedIr {
                                reason: format!("unexpected top-level region {signal:?}"),
                            });
                        }
                    }
                }
            }
        }

        if depth != 0 || !current.is_empty() {
            return Err(IrError::MalformedIr {
                reason: "truncated token stream".to_string(),
            });
        }
        let header_tokens = header_tokens.ok_or_else(|| IrError::MalformedIr {
            reason: "missing envelope composite".to_string(),
        })?;

        let mut ir = Ir::new(package, ir_id, ir_version, schema_version, header_tokens)?;
        if !namespace.is_empty() {
            ir.set_namespace(namespace);
        }
        if !semantic_version.is_empty() {
            ir.set_semantic_version(semantic_version);
        }
        for message in messages {
            ir.add_message(message)?;
        }
        tracing::debug!(
            package = ir.package(),
            messages = ir.message_count(),
            "decoded IR stream"
        );
        Ok(ir)
    }

    /// Reads and decodes an `.sbeir` file.
    ///
    /// # Errors
    /// Returns decoding or IO errors.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Ir> {
        let bytes = std::fs::read(path.as_ref())?;
        tracing::debug!(
            path = %path.as_ref().display(),
            bytes = bytes.len(),
            "read IR file"
        );
        Self::decode(&bytes)
    }
}

fn utf8(bytes: &[u8], field: &'static str) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| IrError::InvalidUtf8 { field })
}

fn read_token(decoder: &mut TokenDecoder<'_>) -> Result<Token> {
    let signal = Signal::from_wire_value(decoder.signal())?;
    let primitive_type = match decoder.primitive_type() {
        0 => None,
        value => Some(
            PrimitiveType::from_wire_value(value)
                .ok_or(IrError::UnknownPrimitiveType { value })?,
        ),
    };
    let byte_order_value = decoder.byte_order();
    let byte_order = ByteOrder::from_wire_value(byte_order_value).ok_or(
        IrError::UnknownByteOrder {
            value: byte_order_value,
        },
    )?;
    let presence_value = decoder.presence();
    let presence = Presence::from_wire_value(presence_value).ok_or(IrError::UnknownPresence {
        value: presence_value,
    })?;

    let offset = decoder.token_offset();
    let encoded_length = decoder.token_size();
    let id = decoder.field_id();
    let version = decoder.token_version();
    let component_token_count = decoder.component_token_count();

    let name = utf8(decoder.var_field()?, "name")?;
    let value_field = |decoder: &mut TokenDecoder<'_>| -> Result<Option<PrimitiveValue>> {
        let bytes = decoder.var_field()?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let ty = primitive_type.ok_or_else(|| IrError::MalformedIr {
            reason: format!("value bytes without a primitive type on '{name}'"),
        })?;
        PrimitiveValue::from_wire_bytes(ty, bytes).map(Some)
    };
    let const_value = value_field(&mut *decoder)?;
    let min_value = value_field(&mut *decoder)?;
    let max_value = value_field(&mut *decoder)?;
    let null_value = value_field(&mut *decoder)?;
    let text_field = |decoder: &mut TokenDecoder<'_>, field| -> Result<Option<String>> {
        let text = utf8(decoder.var_field()?, field)?;
        Ok(if text.is_empty() { None } else { Some(text) })
    };
    let character_encoding = text_field(&mut *decoder, "characterEncoding")?;
    let epoch = text_field(&mut *decoder, "epoch")?;
    let time_unit = text_field(&mut *decoder, "timeUnit")?;
    let semantic_type = text_field(&mut *decoder, "semanticType")?;
    let description = text_field(&mut *decoder, "description")?;

    Ok(Token {
        signal,
        name,
        description,
        id,
        version,
        offset,
        encoded_length,
        component_token_count,
        encoding: Encoding {
            primitive_type,
            byte_order,
            presence,
            const_value,
            min_value,
            max_value,
            null_value,
            character_encoding,
            epoch,
            time_unit,
            semantic_type,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TokenListBuilder;

    fn sample_ir() -> Ir {
        let header = TokenListBuilder::standard_header().unwrap();
        let mut ir = Ir::new("car.schema", 6, 0, 0, header).unwrap();
        ir.set_namespace("example");
        ir.set_semantic_version("5.2");

        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("Car", 1, 14)
            .begin_field("serialNumber", 1, 0)
            .encoding("serialNumber", PrimitiveType::Uint64, 0)
            .end_field()
            .begin_field("available", 2, 0)
            .begin_enum("BooleanType", PrimitiveType::Uint8, 8)
            .valid_value("F", PrimitiveValue::Uint(0))
            .valid_value("T", PrimitiveValue::Uint(1))
            .end_enum()
            .end_field()
            .begin_field("fuel", 3, 0)
            .constant(
                "fuel",
                PrimitiveType::Char,
                PrimitiveValue::Bytes(b"Petrol".to_vec()),
            )
            .end_field()
            .begin_group("fuelFigures", 9, 6)
            .begin_field("speed", 10, 0)
            .encoding("speed", PrimitiveType::Uint16, 0)
            .end_field()
            .begin_field("mpg", 11, 1)
            .encoding("mpg", PrimitiveType::Float, 2)
            .end_field()
            .end_group()
            .var_data("manufacturer", 18, PrimitiveType::Uint16)
            .end_message();
        ir.add_message(builder.build().unwrap()).unwrap();
        ir
    }

    #[test]
    fn test_ir_round_trip() {
        let ir = sample_ir();
        let bytes = IrEncoder::encode(&ir).unwrap();
        let decoded = IrDecoder::decode(&bytes).unwrap();
        assert_eq!(decoded, ir);
    }

    #[test]
    fn test_stream_layout_starts_with_frame() {
        let ir = sample_ir();
        let bytes = IrEncoder::encode(&ir).unwrap();

        let envelope = MessageHeader::read(&bytes, 0).unwrap();
        assert_eq!({ envelope.template_id }, FRAME_TEMPLATE_ID);
        assert_eq!({ envelope.block_length }, FRAME_BLOCK_LENGTH);
        assert_eq!({ envelope.schema_id }, IR_SCHEMA_ID);
    }

    #[test]
    fn test_tokens_carry_their_own_envelope() {
        let ir = sample_ir();
        let bytes = IrEncoder::encode(&ir).unwrap();

        // Skip the frame, then the next envelope must announce a Token.
        let frame_total = 8
            + FRAME_BLOCK_LENGTH as usize
            + (2 + ir.package().len())
            + (2 + ir.namespace().unwrap().len())
            + (2 + ir.semantic_version().unwrap().len());
        let envelope = MessageHeader::read(&bytes, frame_total).unwrap();
        assert_eq!({ envelope.template_id }, TOKEN_TEMPLATE_ID);
        assert_eq!({ envelope.block_length }, TOKEN_BLOCK_LENGTH);
    }

    #[test]
    fn test_decode_rejects_missing_frame() {
        let mut bytes = vec![0u8; 64];
        MessageHeader::new(TOKEN_BLOCK_LENGTH, TOKEN_TEMPLATE_ID, IR_SCHEMA_ID, 0)
            .encode(&mut bytes, 0);
        assert!(matches!(
            IrDecoder::decode(&bytes),
            Err(IrError::MissingFrame)
        ));
        assert!(matches!(
            IrDecoder::decode(&[]),
            Err(IrError::MissingFrame)
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_template() {
        let ir = sample_ir();
        let mut bytes = IrEncoder::encode(&ir).unwrap();
        // Corrupt the first token envelope's template id.
        let frame_total = 8
            + FRAME_BLOCK_LENGTH as usize
            + (2 + ir.package().len())
            + (2 + ir.namespace().unwrap().len())
            + (2 + ir.semantic_version().unwrap().len());
        bytes[frame_total + 2] = 99;
        assert!(matches!(
            IrDecoder::decode(&bytes),
            Err(IrError::UnknownTemplateId { template_id: 99 })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_stream() {
        let ir = sample_ir();
        let bytes = IrEncoder::encode(&ir).unwrap();
        // Cut off the last token message entirely.
        let truncated = &bytes[..bytes.len() - 40];
        assert!(IrDecoder::decode(truncated).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let ir = sample_ir();
        let path = std::env::temp_dir().join("wiresbe-ir-codec-test.sbeir");
        IrEncoder::write_file(&ir, &path).unwrap();
        let decoded = IrDecoder::read_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(decoded, ir);
    }
}
