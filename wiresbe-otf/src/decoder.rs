//! On-the-fly message decoding: a token walk in lockstep with a buffer
//! cursor.
//!
//! [`decode_message`] drives a [`TokenListener`] over one encoded
//! message body given its token list, acting version, and acting block
//! length. Fields, nested repeating groups, and var-data are visited in
//! declaration order with no lookahead; elements unknown to the writer
//! (added after the acting version) or truncated away by a shorter
//! acting block are skipped via `component_token_count` without touching
//! the buffer.

use crate::error::{OtfError, Result};
use crate::header_decoder::OtfHeaderDecoder;
use crate::listener::TokenListener;
use wiresbe_core::bounds;
use wiresbe_core::buffer::ReadBuffer;
use wiresbe_core::types::{ByteOrder, PrimitiveType};
use wiresbe_ir::ir::Ir;
use wiresbe_ir::token::{Signal, Token};

/// Reads an unsigned integer encoding at `offset` with the declared
/// type and byte order.
///
/// Returns `Ok(None)` when the type is not an unsigned integer (char
/// counts as `uint8`, per the envelope rules).
///
/// # Errors
/// Returns a codec error when the read crosses the buffer end.
pub fn read_unsigned<B: ReadBuffer + ?Sized>(
    buffer: &B,
    offset: usize,
    ty: PrimitiveType,
    order: ByteOrder,
) -> Result<Option<u64>> {
    bounds::check(buffer.len(), offset, ty.size()).map_err(OtfError::Codec)?;
    Ok(Some(match (ty, order) {
        (PrimitiveType::Char | PrimitiveType::Uint8, _) => buffer.get_u8(offset) as u64,
        (PrimitiveType::Uint16, ByteOrder::LittleEndian) => buffer.get_u16_le(offset) as u64,
        (PrimitiveType::Uint16, ByteOrder::BigEndian) => buffer.get_u16_be(offset) as u64,
        (PrimitiveType::Uint32, ByteOrder::LittleEndian) => buffer.get_u32_le(offset) as u64,
        (PrimitiveType::Uint32, ByteOrder::BigEndian) => buffer.get_u32_be(offset) as u64,
        (PrimitiveType::Uint64, ByteOrder::LittleEndian) => buffer.get_u64_le(offset),
        (PrimitiveType::Uint64, ByteOrder::BigEndian) => buffer.get_u64_be(offset),
        _ => return Ok(None),
    }))
}

/// Decodes one message body, dispatching listener callbacks in
/// declaration order.
///
/// `buffer` starts at the message's fixed block (just past the
/// envelope). Returns the total number of body bytes consumed.
///
/// # Arguments
/// * `buffer` - Message body bytes
/// * `acting_version` - Schema version advertised by the writer
/// * `acting_block_length` - Fixed-block length advertised by the writer
/// * `tokens` - The message's token list
/// * `listener` - Callback sink
///
/// # Errors
/// Returns `OtfError` on a short buffer or inconsistent token list; no
/// callbacks follow a fatal error.
pub fn decode_message<L: TokenListener>(
    buffer: &[u8],
    acting_version: u64,
    acting_block_length: usize,
    tokens: &[Token],
    listener: &mut L,
) -> Result<usize> {
    if tokens.is_empty() {
        return Err(OtfError::MalformedTokens {
            reason: "empty message token list".to_string(),
        });
    }
    bounds::check(buffer.len(), 0, acting_block_length)?;

    listener.on_begin_message(&tokens[0]);

    let token_index = decode_fields(
        buffer,
        0,
        acting_block_length,
        acting_version,
        tokens,
        1,
        listener,
    )?;

    let (buffer_index, token_index) = decode_groups(
        buffer,
        acting_block_length,
        acting_version,
        tokens,
        token_index,
        listener,
    )?;

    let (buffer_index, _) = decode_data(buffer, buffer_index, acting_version, tokens, token_index, listener)?;

    listener.on_end_message(&tokens[tokens.len() - 1]);
    Ok(buffer_index)
}

/// Walks consecutive `BeginField` regions starting at `token_index`,
/// reading each field's wire image at `buffer_index + offset`.
///
/// Returns the token index of the first non-field token.
fn decode_fields<L: TokenListener>(
    buffer: &[u8],
    buffer_index: usize,
    acting_block_length: usize,
    acting_version: u64,
    tokens: &[Token],
    mut token_index: usize,
    listener: &mut L,
) -> Result<usize> {
    while token_index < tokens.len() {
        let field_token = &tokens[token_index];
        if field_token.signal != Signal::BeginField {
            break;
        }
        let next_field_index = checked_skip(tokens, token_index)?;
        if next_field_index < token_index + 3 {
            return Err(OtfError::MalformedTokens {
                reason: format!("field '{}' has no type tokens", field_token.name),
            });
        }

        // A field the writer did not know: semantically absent, no
        // callback, no bytes.
        if !field_token.matches_since_version(acting_version) {
            token_index = next_field_index;
            continue;
        }

        let type_token = &tokens[token_index + 1];
        let type_index = token_index + 1;

        if type_token.is_constant_encoding() {
            listener.on_encoding(field_token, &[], type_token, acting_version);
            token_index = next_field_index;
            continue;
        }

        // A field truncated away by a shorter acting block: same
        // absence semantics as a version miss.
        let field_offset = type_token.offset as usize;
        let field_size = type_token.encoded_length as usize;
        if field_offset + field_size > acting_block_length {
            token_index = next_field_index;
            continue;
        }

        let offset = buffer_index + field_offset;
        bounds::check(buffer.len(), offset, field_size)?;

        match type_token.signal {
            Signal::Encoding => {
                listener.on_encoding(
                    field_token,
                    &buffer[offset..offset + field_size],
                    type_token,
                    acting_version,
                );
            }
            Signal::BeginComposite => {
                decode_composite(
                    field_token,
                    buffer,
                    offset,
                    tokens,
                    type_index,
                    next_field_index - 2,
                    acting_version,
                    listener,
                )?;
            }
            Signal::BeginEnum => {
                listener.on_enum(
                    field_token,
                    &buffer[offset..offset + field_size],
                    tokens,
                    type_index,
                    next_field_index - 2,
                    acting_version,
                );
            }
            Signal::BeginSet => {
                listener.on_bit_set(
                    field_token,
                    &buffer[offset..offset + field_size],
                    tokens,
                    type_index,
                    next_field_index - 2,
                    acting_version,
                );
            }
            signal => {
                return Err(OtfError::UnexpectedToken {
                    expected: "field type token",
                    actual: format!("{signal:?}"),
                    index: type_index,
                });
            }
        }

        token_index = next_field_index;
    }

    Ok(token_index)
}

/// Dispatches the encodings of a composite field at `base_offset`,
/// recursing into nested composites with their relative offsets.
#[allow(clippy::too_many_arguments)]
fn decode_composite<L: TokenListener>(
    field_token: &Token,
    buffer: &[u8],
    base_offset: usize,
    tokens: &[Token],
    from: usize,
    to: usize,
    acting_version: u64,
    listener: &mut L,
) -> Result<()> {
    listener.on_begin_composite(field_token, tokens, from, to);

    let mut index = from + 1;
    while index < to {
        let token = &tokens[index];
        match token.signal {
            Signal::Encoding => {
                if token.is_constant_encoding() {
                    listener.on_encoding(token, &[], token, acting_version);
                } else {
                    let offset = base_offset + token.offset as usize;
                    let size = token.encoded_length as usize;
                    bounds::check(buffer.len(), offset, size)?;
                    listener.on_encoding(
                        token,
                        &buffer[offset..offset + size],
                        token,
                        acting_version,
                    );
                }
                index += 1;
            }
            Signal::BeginComposite => {
                let next = checked_skip(tokens, index)?;
                decode_composite(
                    token,
                    buffer,
                    base_offset + token.offset as usize,
                    tokens,
                    index,
                    next - 1,
                    acting_version,
                    listener,
                )?;
                index = next;
            }
            _ => {
                index += tokens[index].component_token_count.max(1) as usize;
            }
        }
    }

    listener.on_end_composite(field_token, tokens, from, to);
    Ok(())
}

/// Walks consecutive `BeginGroup` regions, iterating each group's
/// entries and recursing into their fields, nested groups, and
/// var-data.
///
/// Returns `(buffer_index, token_index)` past the groups.
fn decode_groups<L: TokenListener>(
    buffer: &[u8],
    mut buffer_index: usize,
    acting_version: u64,
    tokens: &[Token],
    mut token_index: usize,
    listener: &mut L,
) -> Result<(usize, usize)> {
    while token_index < tokens.len() {
        let token = &tokens[token_index];
        if token.signal != Signal::BeginGroup {
            break;
        }
        let next_group_index = checked_skip(tokens, token_index)?;

        // A group the writer did not know: zero entries, zero bytes.
        if !token.matches_since_version(acting_version) {
            token_index = next_group_index;
            continue;
        }

        let dimensions_index = token_index + 1;
        let dimensions = tokens.get(dimensions_index).filter(|t| t.signal == Signal::BeginComposite)
            .ok_or_else(|| OtfError::MissingDimensions {
                group: token.name.clone(),
            })?;
        let dimensions_length = dimensions.encoded_length as usize;
        let dimensions_end = dimensions_index + dimensions.component_token_count as usize;
        bounds::check(buffer.len(), buffer_index, dimensions_length)?;

        // The dimensions layout comes from the IR, never from assumed
        // offsets or widths.
        let block_length = read_dimension(
            buffer,
            buffer_index,
            tokens,
            dimensions_index,
            dimensions_end,
            "blockLength",
            token,
        )? as usize;
        let num_in_group = read_dimension(
            buffer,
            buffer_index,
            tokens,
            dimensions_index,
            dimensions_end,
            "numInGroup",
            token,
        )?;

        buffer_index += dimensions_length;
        let begin_fields_index = dimensions_end;

        listener.on_group_header(token, num_in_group);

        for group_index in 0..num_in_group {
            listener.on_begin_group(token, group_index, num_in_group);

            let after_fields = decode_fields(
                buffer,
                buffer_index,
                block_length,
                acting_version,
                tokens,
                begin_fields_index,
                listener,
            )?;
            bounds::check(buffer.len(), buffer_index, block_length)?;
            buffer_index += block_length;

            let (index, after_groups) = decode_groups(
                buffer,
                buffer_index,
                acting_version,
                tokens,
                after_fields,
                listener,
            )?;
            buffer_index = index;

            let (index, _) = decode_data(
                buffer,
                buffer_index,
                acting_version,
                tokens,
                after_groups,
                listener,
            )?;
            buffer_index = index;

            listener.on_end_group(token, group_index, num_in_group);
        }

        token_index = next_group_index;
    }

    Ok((buffer_index, token_index))
}

/// Walks consecutive `BeginVarData` regions.
///
/// Returns `(buffer_index, token_index)` past the var-data fields.
fn decode_data<L: TokenListener>(
    buffer: &[u8],
    mut buffer_index: usize,
    acting_version: u64,
    tokens: &[Token],
    mut token_index: usize,
    listener: &mut L,
) -> Result<(usize, usize)> {
    while token_index < tokens.len() {
        let token = &tokens[token_index];
        if token.signal != Signal::BeginVarData {
            break;
        }
        let next_index = checked_skip(tokens, token_index)?;
        if next_index < token_index + 6 {
            return Err(OtfError::MalformedTokens {
                reason: format!("var-data '{}' region too small", token.name),
            });
        }

        // Var-data the writer did not know: length zero, zero bytes.
        if !token.matches_since_version(acting_version) {
            token_index = next_index;
            continue;
        }

        let length_token = &tokens[token_index + 2];
        let data_token = &tokens[token_index + 3];

        // The prefix width and type come from the schema's var-data
        // encoding composite.
        let prefix_type =
            length_token
                .encoding
                .primitive_type
                .ok_or_else(|| OtfError::MalformedTokens {
                    reason: format!("var-data '{}' length has no type", token.name),
                })?;
        let data_length = read_unsigned(
            buffer,
            buffer_index + length_token.offset as usize,
            prefix_type,
            length_token.encoding.byte_order,
        )?
        .ok_or_else(|| OtfError::NotUnsigned {
            name: length_token.name.clone(),
        })? as usize;

        buffer_index += data_token.offset as usize;
        bounds::check(buffer.len(), buffer_index, data_length)?;
        listener.on_var_data(
            token,
            &buffer[buffer_index..buffer_index + data_length],
            data_length as u64,
            data_token,
        );
        buffer_index += data_length;

        token_index = next_index;
    }

    Ok((buffer_index, token_index))
}

/// Reads one dimensions encoding by name from the group's dimensions
/// composite.
fn read_dimension(
    buffer: &[u8],
    buffer_index: usize,
    tokens: &[Token],
    dimensions_index: usize,
    dimensions_end: usize,
    name: &'static str,
    group_token: &Token,
) -> Result<u64> {
    let token = tokens[dimensions_index + 1..dimensions_end - 1]
        .iter()
        .find(|token| token.signal == Signal::Encoding && token.name == name)
        .ok_or_else(|| OtfError::MissingDimensions {
            group: group_token.name.clone(),
        })?;
    let ty = token
        .encoding
        .primitive_type
        .ok_or_else(|| OtfError::MissingDimensions {
            group: group_token.name.clone(),
        })?;
    read_unsigned(
        buffer,
        buffer_index + token.offset as usize,
        ty,
        token.encoding.byte_order,
    )?
    .ok_or_else(|| OtfError::NotUnsigned {
        name: token.name.clone(),
    })
}

/// Returns `token_index + component_token_count`, validated against the
/// list length.
fn checked_skip(tokens: &[Token], token_index: usize) -> Result<usize> {
    let count = tokens[token_index].component_token_count;
    if count <= 0 {
        return Err(OtfError::MalformedTokens {
            reason: format!(
                "non-positive component token count on '{}'",
                tokens[token_index].name
            ),
        });
    }
    let next = token_index + count as usize;
    if next > tokens.len() {
        return Err(OtfError::MalformedTokens {
            reason: format!(
                "component token count on '{}' runs past the list",
                tokens[token_index].name
            ),
        });
    }
    Ok(next)
}

/// Schema-driven decoder pairing an [`Ir`] collection with its envelope
/// decoder: reads the envelope, looks up the template, and walks the
/// message.
#[derive(Debug)]
pub struct OtfDecoder<'ir> {
    ir: &'ir Ir,
    header: OtfHeaderDecoder,
}

impl<'ir> OtfDecoder<'ir> {
    /// Builds a decoder over an immutable IR collection.
    ///
    /// # Errors
    /// Returns an error when the IR's envelope tokens are unusable.
    pub fn new(ir: &'ir Ir) -> Result<Self> {
        let header = OtfHeaderDecoder::new(ir.header_tokens())?;
        Ok(Self { ir, header })
    }

    /// Returns the envelope decoder.
    #[must_use]
    pub const fn header(&self) -> &OtfHeaderDecoder {
        &self.header
    }

    /// Decodes one complete message (envelope plus body), returning the
    /// total bytes consumed.
    ///
    /// # Errors
    /// Returns `OtfError::TemplateNotFound` when the envelope names an
    /// unknown template, or any token-walk error.
    pub fn decode<L: TokenListener>(&self, buffer: &[u8], listener: &mut L) -> Result<usize> {
        let header_length = self.header.encoded_length() as usize;
        let block_length = self.header.block_length(buffer)?;
        let template_id = self.header.template_id(buffer)?;
        let schema_version = self.header.schema_version(buffer)?;
        bounds::check(buffer.len(), 0, header_length)?;

        let tokens = self
            .ir
            .message(template_id as i32)
            .ok_or(OtfError::TemplateNotFound {
                template_id,
                schema_version,
            })?;

        let consumed = decode_message(
            &buffer[header_length..],
            schema_version,
            block_length as usize,
            tokens,
            listener,
        )?;
        Ok(header_length + consumed)
    }
}
