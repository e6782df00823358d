//! Listener trait driven by the token walk, plus value-resolution
//! helpers for enums and bit sets.
//!
//! Callbacks arrive in strict byte order and strict token order. The
//! Rx-style triad maps onto Rust as: the trait methods are `OnNext`, the
//! decoder's `Err` return is `OnError`, and its `Ok` return is
//! `OnCompleted`.

use wiresbe_core::buffer::ReadBuffer;
use wiresbe_core::types::{ByteOrder, PrimitiveType};
use wiresbe_ir::token::{PrimitiveValue, Signal, Token};

/// Visitor over one decoded message.
///
/// Every method has a no-op default, so a listener implements only what
/// it cares about. For enums, bit sets, and composites the listener
/// receives the token sub-range `[from, to)` where `from` is the type
/// token and `from + 1 .. to` are its children.
pub trait TokenListener {
    /// Called once before any field of the message.
    fn on_begin_message(&mut self, _token: &Token) {}

    /// Called once after every field of the message.
    fn on_end_message(&mut self, _token: &Token) {}

    /// Called for a primitive encoding; `bytes` is the field's wire
    /// image, empty for constant encodings (take the value from the
    /// type token's `const_value`).
    fn on_encoding(
        &mut self,
        _field_token: &Token,
        _bytes: &[u8],
        _type_token: &Token,
        _acting_version: u64,
    ) {
    }

    /// Called for an enum field; resolve with
    /// [`resolve_valid_value`].
    fn on_enum(
        &mut self,
        _field_token: &Token,
        _bytes: &[u8],
        _tokens: &[Token],
        _from: usize,
        _to: usize,
        _acting_version: u64,
    ) {
    }

    /// Called for a bit-set field; resolve with [`active_choices`].
    fn on_bit_set(
        &mut self,
        _field_token: &Token,
        _bytes: &[u8],
        _tokens: &[Token],
        _from: usize,
        _to: usize,
        _acting_version: u64,
    ) {
    }

    /// Called before the encodings of a composite field.
    fn on_begin_composite(
        &mut self,
        _field_token: &Token,
        _tokens: &[Token],
        _from: usize,
        _to: usize,
    ) {
    }

    /// Called after the encodings of a composite field.
    fn on_end_composite(
        &mut self,
        _field_token: &Token,
        _tokens: &[Token],
        _from: usize,
        _to: usize,
    ) {
    }

    /// Called once per group with the entry count from the wire, before
    /// any entry.
    fn on_group_header(&mut self, _token: &Token, _num_in_group: u64) {}

    /// Called before each group entry.
    fn on_begin_group(&mut self, _token: &Token, _group_index: u64, _num_in_group: u64) {}

    /// Called after each group entry.
    fn on_end_group(&mut self, _token: &Token, _group_index: u64, _num_in_group: u64) {}

    /// Called for a var-data field with a zero-copy view of the payload.
    fn on_var_data(&mut self, _field_token: &Token, _bytes: &[u8], _length: u64, _type_token: &Token) {
    }
}

/// Reads an encoding's wire image as a widened u64.
///
/// Signed values and floats return `None`; use the type token to decide
/// how to interpret those. Char reads the first byte.
#[must_use]
pub fn unsigned_value(type_token: &Token, bytes: &[u8]) -> Option<u64> {
    let ty = type_token.encoding.primitive_type?;
    if bytes.len() < ty.size() {
        return None;
    }
    let order = type_token.encoding.byte_order;
    Some(match (ty, order) {
        (PrimitiveType::Char | PrimitiveType::Uint8, _) => bytes.get_u8(0) as u64,
        (PrimitiveType::Uint16, ByteOrder::LittleEndian) => bytes.get_u16_le(0) as u64,
        (PrimitiveType::Uint16, ByteOrder::BigEndian) => bytes.get_u16_be(0) as u64,
        (PrimitiveType::Uint32, ByteOrder::LittleEndian) => bytes.get_u32_le(0) as u64,
        (PrimitiveType::Uint32, ByteOrder::BigEndian) => bytes.get_u32_be(0) as u64,
        (PrimitiveType::Uint64, ByteOrder::LittleEndian) => bytes.get_u64_le(0),
        (PrimitiveType::Uint64, ByteOrder::BigEndian) => bytes.get_u64_be(0),
        _ => return None,
    })
}

/// Resolves an enum's wire value to its `ValidValue` token within
/// `tokens[from + 1 .. to]`.
///
/// Returns `None` when no valid value matches - the null-sentinel case,
/// never an error - or when a matching value was added after
/// `acting_version`.
#[must_use]
pub fn resolve_valid_value<'t>(
    tokens: &'t [Token],
    from: usize,
    to: usize,
    raw: u64,
    acting_version: u64,
) -> Option<&'t Token> {
    tokens[from + 1..to]
        .iter()
        .filter(|token| token.signal == Signal::ValidValue)
        .filter(|token| token.matches_since_version(acting_version))
        .find(|token| {
            token
                .encoding
                .const_value
                .as_ref()
                .and_then(PrimitiveValue::as_u64)
                == Some(raw)
        })
}

/// Returns the `Choice` tokens of `tokens[from + 1 .. to]` whose bit is
/// set in the wire value.
#[must_use]
pub fn active_choices<'t>(tokens: &'t [Token], from: usize, to: usize, raw: u64) -> Vec<&'t Token> {
    tokens[from + 1..to]
        .iter()
        .filter(|token| token.signal == Signal::Choice)
        .filter(|token| {
            token
                .encoding
                .const_value
                .as_ref()
                .and_then(PrimitiveValue::as_u64)
                .is_some_and(|bit| raw & (1u64 << bit) != 0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiresbe_ir::builder::TokenListBuilder;

    fn enum_tokens() -> Vec<Token> {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("M", 1, 1)
            .begin_field("code", 1, 0)
            .begin_enum("Model", PrimitiveType::Char, 0)
            .valid_value("A", PrimitiveValue::Bytes(vec![b'A']))
            .valid_value("B", PrimitiveValue::Bytes(vec![b'B']))
            .valid_value("C", PrimitiveValue::Bytes(vec![b'C']))
            .end_enum()
            .end_field()
            .end_message();
        builder.build().unwrap()
    }

    #[test]
    fn test_resolve_valid_value() {
        let tokens = enum_tokens();
        // BeginEnum at index 2; EndEnum at 6.
        assert_eq!(tokens[2].signal, Signal::BeginEnum);
        let resolved = resolve_valid_value(&tokens, 2, 6, b'B' as u64, 0).unwrap();
        assert_eq!(resolved.name, "B");
        // Unknown value resolves to none, the null-sentinel case.
        assert!(resolve_valid_value(&tokens, 2, 6, b'Z' as u64, 0).is_none());
    }

    #[test]
    fn test_resolve_valid_value_respects_version() {
        let mut tokens = enum_tokens();
        let index = tokens.iter().position(|t| t.name == "C").unwrap();
        tokens[index].version = 2;
        assert!(resolve_valid_value(&tokens, 2, 6, b'C' as u64, 1).is_none());
        assert!(resolve_valid_value(&tokens, 2, 6, b'C' as u64, 2).is_some());
    }

    #[test]
    fn test_active_choices() {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("M", 1, 1)
            .begin_field("extras", 1, 0)
            .begin_set("OptionalExtras", PrimitiveType::Uint8, 0)
            .choice("sunRoof", 0)
            .choice("sportsPack", 1)
            .choice("cruiseControl", 2)
            .end_set()
            .end_field()
            .end_message();
        let tokens = builder.build().unwrap();

        assert_eq!(tokens[2].signal, Signal::BeginSet);
        let active = active_choices(&tokens, 2, 6, 0b110);
        let names: Vec<&str> = active.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sportsPack", "cruiseControl"]);

        assert!(active_choices(&tokens, 2, 6, 0).is_empty());
    }

    #[test]
    fn test_unsigned_value() {
        let mut token = Token::new(Signal::Encoding, "x");
        token.encoding = wiresbe_ir::token::Encoding::of(
            PrimitiveType::Uint16,
            ByteOrder::LittleEndian,
        );
        assert_eq!(unsigned_value(&token, &[0x34, 0x12]), Some(0x1234));

        token.encoding.byte_order = ByteOrder::BigEndian;
        assert_eq!(unsigned_value(&token, &[0x12, 0x34]), Some(0x1234));

        // Too short or signed yields none.
        assert_eq!(unsigned_value(&token, &[0x12]), None);
        token.encoding = wiresbe_ir::token::Encoding::of(
            PrimitiveType::Int32,
            ByteOrder::LittleEndian,
        );
        assert_eq!(unsigned_value(&token, &[0, 0, 0, 0]), None);
    }
}
