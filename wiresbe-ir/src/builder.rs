//! Programmatic assembly of well-formed token lists.
//!
//! The XML schema compiler is an external collaborator; at runtime an IR
//! is either deserialized from an `.sbeir` stream or assembled in memory
//! with [`TokenListBuilder`]. The builder keeps a stack of open regions
//! and patches `component_token_count` on every matching begin/end pair,
//! so a finished list always passes the well-formedness check.

use crate::error::{IrError, Result};
use crate::ir::validate_token_nesting;
use crate::token::{Encoding, PrimitiveValue, Signal, Token};
use wiresbe_core::types::{Presence, PrimitiveType};

/// Stack-based builder for message and type token lists.
#[derive(Debug, Default)]
pub struct TokenListBuilder {
    tokens: Vec<Token>,
    stack: Vec<usize>,
    error: Option<IrError>,
}

impl TokenListBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the canonical 8-byte message envelope composite:
    /// `blockLength`, `templateId`, `schemaId`, `version`, all `uint16`
    /// little-endian.
    ///
    /// # Errors
    /// Never fails in practice; kept fallible for symmetry with
    /// [`TokenListBuilder::build`].
    pub fn standard_header() -> Result<Vec<Token>> {
        let mut builder = Self::new();
        builder
            .begin_composite("messageHeader", 0, 8)
            .encoding("blockLength", PrimitiveType::Uint16, 0)
            .encoding("templateId", PrimitiveType::Uint16, 2)
            .encoding("schemaId", PrimitiveType::Uint16, 4)
            .encoding("version", PrimitiveType::Uint16, 6)
            .end_composite();
        builder.build()
    }

    /// Opens a message region.
    ///
    /// # Arguments
    /// * `name` - Message name
    /// * `template_id` - Message template id
    /// * `block_length` - Fixed-block length in bytes
    pub fn begin_message(
        &mut self,
        name: impl Into<String>,
        template_id: i32,
        block_length: i32,
    ) -> &mut Self {
        let mut token = Token::new(Signal::BeginMessage, name);
        token.id = template_id;
        token.encoded_length = block_length;
        self.push_begin(token);
        self
    }

    /// Closes the current message region.
    pub fn end_message(&mut self) -> &mut Self {
        self.push_end(Signal::EndMessage);
        self
    }

    /// Opens a composite region.
    ///
    /// # Arguments
    /// * `name` - Composite name
    /// * `offset` - Byte offset within the enclosing block
    /// * `encoded_length` - Total composite size in bytes
    pub fn begin_composite(
        &mut self,
        name: impl Into<String>,
        offset: i32,
        encoded_length: i32,
    ) -> &mut Self {
        let mut token = Token::new(Signal::BeginComposite, name);
        token.offset = offset;
        token.encoded_length = encoded_length;
        self.push_begin(token);
        self
    }

    /// Closes the current composite region.
    pub fn end_composite(&mut self) -> &mut Self {
        self.push_end(Signal::EndComposite);
        self
    }

    /// Opens a field region wrapping the field's type tokens.
    ///
    /// # Arguments
    /// * `name` - Field name
    /// * `id` - Field id
    /// * `version` - Schema version in which the field was added
    pub fn begin_field(&mut self, name: impl Into<String>, id: i32, version: i32) -> &mut Self {
        let mut token = Token::new(Signal::BeginField, name);
        token.id = id;
        token.version = version;
        self.push_begin(token);
        self
    }

    /// Closes the current field region.
    pub fn end_field(&mut self) -> &mut Self {
        self.push_end(Signal::EndField);
        self
    }

    /// Adds a required primitive encoding leaf.
    ///
    /// # Arguments
    /// * `name` - Encoding name
    /// * `ty` - Primitive type
    /// * `offset` - Byte offset within the enclosing block or composite
    pub fn encoding(
        &mut self,
        name: impl Into<String>,
        ty: PrimitiveType,
        offset: i32,
    ) -> &mut Self {
        let mut token = Token::new(Signal::Encoding, name);
        token.offset = offset;
        token.encoded_length = ty.size() as i32;
        token.encoding = Encoding::of(ty, Default::default());
        self.tokens.push(token);
        self
    }

    /// Adds a fixed-length array encoding leaf (for example a char
    /// array).
    ///
    /// # Arguments
    /// * `name` - Encoding name
    /// * `ty` - Element primitive type
    /// * `offset` - Byte offset within the enclosing block
    /// * `length` - Element count
    pub fn encoding_array(
        &mut self,
        name: impl Into<String>,
        ty: PrimitiveType,
        offset: i32,
        length: i32,
    ) -> &mut Self {
        let mut token = Token::new(Signal::Encoding, name);
        token.offset = offset;
        token.encoded_length = ty.size() as i32 * length;
        token.encoding = Encoding::of(ty, Default::default());
        self.tokens.push(token);
        self
    }

    /// Adds a constant encoding leaf; occupies no wire bytes.
    ///
    /// # Arguments
    /// * `name` - Encoding name
    /// * `ty` - Primitive type of the constant
    /// * `value` - The constant value
    pub fn constant(
        &mut self,
        name: impl Into<String>,
        ty: PrimitiveType,
        value: PrimitiveValue,
    ) -> &mut Self {
        let mut token = Token::new(Signal::Encoding, name);
        token.encoded_length = 0;
        token.encoding = Encoding {
            primitive_type: Some(ty),
            presence: Presence::Constant,
            const_value: Some(value),
            ..Encoding::default()
        };
        self.tokens.push(token);
        self
    }

    /// Opens an enum region.
    ///
    /// # Arguments
    /// * `name` - Enum type name
    /// * `ty` - Encoding primitive type
    /// * `offset` - Byte offset within the enclosing block
    pub fn begin_enum(
        &mut self,
        name: impl Into<String>,
        ty: PrimitiveType,
        offset: i32,
    ) -> &mut Self {
        let mut token = Token::new(Signal::BeginEnum, name);
        token.offset = offset;
        token.encoded_length = ty.size() as i32;
        token.encoding = Encoding::of(ty, Default::default());
        self.push_begin(token);
        self
    }

    /// Adds a named valid value to the current enum region.
    ///
    /// The value's primitive type is taken from the enclosing
    /// `BeginEnum` token.
    pub fn valid_value(&mut self, name: impl Into<String>, value: PrimitiveValue) -> &mut Self {
        let ty = self.enclosing_primitive_type();
        let mut token = Token::new(Signal::ValidValue, name);
        token.encoding = Encoding {
            primitive_type: ty,
            const_value: Some(value),
            ..Encoding::default()
        };
        self.tokens.push(token);
        self
    }

    /// Closes the current enum region.
    pub fn end_enum(&mut self) -> &mut Self {
        self.push_end(Signal::EndEnum);
        self
    }

    /// Opens a bit-set region.
    ///
    /// # Arguments
    /// * `name` - Set type name
    /// * `ty` - Encoding primitive type
    /// * `offset` - Byte offset within the enclosing block
    pub fn begin_set(
        &mut self,
        name: impl Into<String>,
        ty: PrimitiveType,
        offset: i32,
    ) -> &mut Self {
        let mut token = Token::new(Signal::BeginSet, name);
        token.offset = offset;
        token.encoded_length = ty.size() as i32;
        token.encoding = Encoding::of(ty, Default::default());
        self.push_begin(token);
        self
    }

    /// Adds a named choice (bit position) to the current set region.
    pub fn choice(&mut self, name: impl Into<String>, bit: u8) -> &mut Self {
        let ty = self.enclosing_primitive_type();
        let mut token = Token::new(Signal::Choice, name);
        token.encoding = Encoding {
            primitive_type: ty,
            const_value: Some(PrimitiveValue::Uint(bit as u64)),
            ..Encoding::default()
        };
        self.tokens.push(token);
        self
    }

    /// Closes the current set region.
    pub fn end_set(&mut self) -> &mut Self {
        self.push_end(Signal::EndSet);
        self
    }

    /// Opens a repeating-group region and emits the canonical
    /// `groupSizeEncoding` dimensions composite (`uint16 blockLength`,
    /// `uint16 numInGroup`).
    ///
    /// Schemas with a custom dimensions shape assemble their composite
    /// with [`TokenListBuilder::begin_composite`] after a raw
    /// [`TokenListBuilder::push`] of the group token.
    ///
    /// # Arguments
    /// * `name` - Group name
    /// * `id` - Group id
    /// * `block_length` - Fixed-block length of one entry in bytes
    pub fn begin_group(
        &mut self,
        name: impl Into<String>,
        id: i32,
        block_length: i32,
    ) -> &mut Self {
        let mut token = Token::new(Signal::BeginGroup, name);
        token.id = id;
        token.encoded_length = block_length;
        self.push_begin(token);
        self.begin_composite("groupSizeEncoding", 0, 4)
            .encoding("blockLength", PrimitiveType::Uint16, 0)
            .encoding("numInGroup", PrimitiveType::Uint16, 2)
            .end_composite()
    }

    /// Closes the current group region.
    pub fn end_group(&mut self) -> &mut Self {
        self.push_end(Signal::EndGroup);
        self
    }

    /// Adds a complete var-data field region: the field token, its
    /// `varDataEncoding` composite with `length` and `varData`
    /// encodings, and the end token.
    ///
    /// # Arguments
    /// * `name` - Field name
    /// * `id` - Field id
    /// * `length_type` - Unsigned prefix type (`Uint8`, `Uint16`, or
    ///   `Uint32`)
    pub fn var_data(
        &mut self,
        name: impl Into<String>,
        id: i32,
        length_type: PrimitiveType,
    ) -> &mut Self {
        let name = name.into();
        let prefix_size = length_type.size() as i32;

        let mut field = Token::new(Signal::BeginVarData, name.clone());
        field.id = id;
        field.encoded_length = Token::VARIABLE_LENGTH;
        self.push_begin(field);

        self.begin_composite("varDataEncoding", 0, Token::VARIABLE_LENGTH)
            .encoding("length", length_type, 0);

        let mut data = Token::new(Signal::Encoding, "varData");
        data.offset = prefix_size;
        data.encoded_length = Token::VARIABLE_LENGTH;
        data.encoding = Encoding {
            primitive_type: Some(PrimitiveType::Uint8),
            character_encoding: Some("UTF-8".to_string()),
            ..Encoding::default()
        };
        self.tokens.push(data);

        self.end_composite();
        self.push_end(Signal::EndVarData);
        self
    }

    /// Pushes a fully formed leaf token; escape hatch for shapes the
    /// helpers do not cover.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Finishes the list.
    ///
    /// # Errors
    /// Returns `IrError::MalformedIr` when an end had no matching begin,
    /// a region is still open, or the nesting check fails.
    pub fn build(self) -> Result<Vec<Token>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(&begin_index) = self.stack.last() {
            return Err(IrError::MalformedIr {
                reason: format!(
                    "unterminated {:?} for '{}'",
                    self.tokens[begin_index].signal, self.tokens[begin_index].name
                ),
            });
        }
        validate_token_nesting(&self.tokens)?;
        Ok(self.tokens)
    }

    fn push_begin(&mut self, token: Token) {
        self.stack.push(self.tokens.len());
        self.tokens.push(token);
    }

    fn push_end(&mut self, signal: Signal) {
        let Some(begin_index) = self.stack.pop() else {
            if self.error.is_none() {
                self.error = Some(IrError::MalformedIr {
                    reason: format!("{signal:?} without a matching begin"),
                });
            }
            return;
        };
        let span = (self.tokens.len() - begin_index + 1) as i32;

        let begin = &mut self.tokens[begin_index];
        begin.component_token_count = span;
        let mut end = Token::new(signal, begin.name.clone());
        end.id = begin.id;
        end.version = begin.version;
        end.component_token_count = span;
        self.tokens.push(end);
    }

    fn enclosing_primitive_type(&self) -> Option<PrimitiveType> {
        self.stack
            .last()
            .and_then(|&index| self.tokens[index].encoding.primitive_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::validate_message_tokens;

    #[test]
    fn test_standard_header() {
        let tokens = TokenListBuilder::standard_header().unwrap();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].signal, Signal::BeginComposite);
        assert_eq!(tokens[0].name, "messageHeader");
        assert_eq!(tokens[0].encoded_length, 8);
        assert_eq!(tokens[0].component_token_count, 6);
        assert_eq!(tokens[1].name, "blockLength");
        assert_eq!(tokens[2].name, "templateId");
        assert_eq!(tokens[2].offset, 2);
        assert_eq!(tokens[4].name, "version");
        assert_eq!(tokens[4].offset, 6);
        assert_eq!(tokens[5].signal, Signal::EndComposite);
    }

    #[test]
    fn test_simple_message_counts() {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("Quote", 7, 12)
            .begin_field("bid", 1, 0)
            .encoding("bid", PrimitiveType::Int64, 0)
            .end_field()
            .begin_field("size", 2, 0)
            .encoding("size", PrimitiveType::Uint32, 8)
            .end_field()
            .end_message();
        let tokens = builder.build().unwrap();

        assert!(validate_message_tokens(&tokens).is_ok());
        assert_eq!(tokens[0].component_token_count, tokens.len() as i32);
        // Field spans BeginField + Encoding + EndField.
        assert_eq!(tokens[1].component_token_count, 3);
        assert_eq!(tokens[1].id, 1);
    }

    #[test]
    fn test_enum_and_set_regions() {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("Flags", 1, 2)
            .begin_field("side", 1, 0)
            .begin_enum("Side", PrimitiveType::Uint8, 0)
            .valid_value("Buy", PrimitiveValue::Uint(1))
            .valid_value("Sell", PrimitiveValue::Uint(2))
            .end_enum()
            .end_field()
            .begin_field("extras", 2, 0)
            .begin_set("Extras", PrimitiveType::Uint8, 1)
            .choice("sunRoof", 0)
            .choice("sportsPack", 1)
            .end_set()
            .end_field()
            .end_message();
        let tokens = builder.build().unwrap();

        assert!(validate_message_tokens(&tokens).is_ok());
        let begin_enum = tokens
            .iter()
            .find(|t| t.signal == Signal::BeginEnum)
            .unwrap();
        assert_eq!(begin_enum.component_token_count, 4);
        let valid = tokens
            .iter()
            .find(|t| t.signal == Signal::ValidValue)
            .unwrap();
        assert_eq!(
            valid.encoding.primitive_type,
            Some(PrimitiveType::Uint8)
        );
        assert_eq!(valid.encoding.const_value, Some(PrimitiveValue::Uint(1)));
        let choice = tokens.iter().find(|t| t.signal == Signal::Choice).unwrap();
        assert_eq!(choice.encoding.const_value, Some(PrimitiveValue::Uint(0)));
    }

    #[test]
    fn test_group_emits_dimensions() {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("Order", 1, 0)
            .begin_group("legs", 10, 6)
            .begin_field("px", 11, 0)
            .encoding("px", PrimitiveType::Int32, 0)
            .end_field()
            .end_group()
            .end_message();
        let tokens = builder.build().unwrap();

        assert!(validate_message_tokens(&tokens).is_ok());
        let group_index = tokens
            .iter()
            .position(|t| t.signal == Signal::BeginGroup)
            .unwrap();
        assert_eq!(tokens[group_index + 1].signal, Signal::BeginComposite);
        assert_eq!(tokens[group_index + 1].name, "groupSizeEncoding");
        assert_eq!(tokens[group_index + 1].encoded_length, 4);
        assert_eq!(tokens[group_index + 2].name, "blockLength");
        assert_eq!(tokens[group_index + 3].name, "numInGroup");
        assert_eq!(tokens[group_index + 3].offset, 2);
    }

    #[test]
    fn test_var_data_region_shape() {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("Note", 1, 0)
            .var_data("text", 5, PrimitiveType::Uint16)
            .end_message();
        let tokens = builder.build().unwrap();

        let field_index = tokens
            .iter()
            .position(|t| t.signal == Signal::BeginVarData)
            .unwrap();
        assert_eq!(tokens[field_index].component_token_count, 6);
        assert_eq!(tokens[field_index + 1].signal, Signal::BeginComposite);
        assert_eq!(tokens[field_index + 2].name, "length");
        assert_eq!(
            tokens[field_index + 2].encoding.primitive_type,
            Some(PrimitiveType::Uint16)
        );
        assert_eq!(tokens[field_index + 3].name, "varData");
        assert_eq!(tokens[field_index + 3].offset, 2);
        assert_eq!(tokens[field_index + 3].encoded_length, Token::VARIABLE_LENGTH);
        assert_eq!(tokens[field_index + 5].signal, Signal::EndVarData);
    }

    #[test]
    fn test_unterminated_region_rejected() {
        let mut builder = TokenListBuilder::new();
        builder.begin_message("Broken", 1, 0);
        assert!(matches!(
            builder.build(),
            Err(IrError::MalformedIr { .. })
        ));
    }

    #[test]
    fn test_constant_occupies_no_bytes() {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("Car", 1, 0)
            .begin_field("fuel", 3, 0)
            .constant(
                "fuel",
                PrimitiveType::Char,
                PrimitiveValue::Bytes(b"Petrol".to_vec()),
            )
            .end_field()
            .end_message();
        let tokens = builder.build().unwrap();
        let constant = tokens
            .iter()
            .find(|t| t.signal == Signal::Encoding)
            .unwrap();
        assert_eq!(constant.encoded_length, 0);
        assert!(constant.is_constant_encoding());
    }
}
