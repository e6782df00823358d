//! IR collection: header tokens plus message token lists.
//!
//! One [`Ir`] holds everything a decoder needs for a schema: the message
//! envelope layout, a token list per message template, and schema
//! metadata. It is loaded (or built) once and then shared immutably;
//! concurrent decoders read it by reference.

use crate::error::{IrError, Result};
use crate::token::{Signal, Token};
use std::collections::HashMap;

/// The intermediate representation of one message schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Ir {
    package: String,
    namespace: Option<String>,
    semantic_version: Option<String>,
    ir_id: i32,
    ir_version: i32,
    schema_version: i32,
    header_tokens: Vec<Token>,
    messages: Vec<Vec<Token>>,
    by_template_id: HashMap<i32, usize>,
}

impl Ir {
    /// Creates an IR collection from schema metadata and the envelope
    /// token list.
    ///
    /// # Arguments
    /// * `package` - Schema package name
    /// * `ir_id` - Schema id
    /// * `ir_version` - Serialized IR format version
    /// * `schema_version` - Schema version
    /// * `header_tokens` - Token list of the envelope composite
    ///
    /// # Errors
    /// Returns `IrError::MalformedIr` when the envelope tokens are not a
    /// well-formed composite.
    pub fn new(
        package: impl Into<String>,
        ir_id: i32,
        ir_version: i32,
        schema_version: i32,
        header_tokens: Vec<Token>,
    ) -> Result<Self> {
        validate_header_tokens(&header_tokens)?;
        Ok(Self {
            package: package.into(),
            namespace: None,
            semantic_version: None,
            ir_id,
            ir_version,
            schema_version,
            header_tokens,
            messages: Vec::new(),
            by_template_id: HashMap::new(),
        })
    }

    /// Sets the namespace name.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = Some(namespace.into());
    }

    /// Sets the semantic version string.
    pub fn set_semantic_version(&mut self, semantic_version: impl Into<String>) {
        self.semantic_version = Some(semantic_version.into());
    }

    /// Adds a message token list, indexed by the template id carried on
    /// its `BeginMessage` token.
    ///
    /// # Errors
    /// Returns `IrError::MalformedIr` when the list is not well-formed or
    /// a message with the same template id already exists.
    pub fn add_message(&mut self, tokens: Vec<Token>) -> Result<()> {
        validate_message_tokens(&tokens)?;
        let template_id = tokens[0].id;
        if self.by_template_id.contains_key(&template_id) {
            return Err(IrError::MalformedIr {
                reason: format!("duplicate template id {template_id}"),
            });
        }
        tracing::debug!(
            template_id,
            name = %tokens[0].name,
            tokens = tokens.len(),
            "added message to IR"
        );
        self.by_template_id.insert(template_id, self.messages.len());
        self.messages.push(tokens);
        Ok(())
    }

    /// Returns the token list for a template id, if known.
    #[must_use]
    pub fn message(&self, template_id: i32) -> Option<&[Token]> {
        self.by_template_id
            .get(&template_id)
            .map(|&index| self.messages[index].as_slice())
    }

    /// Returns the envelope token list.
    #[must_use]
    pub fn header_tokens(&self) -> &[Token] {
        &self.header_tokens
    }

    /// Iterates over all message token lists in insertion order.
    pub fn messages(&self) -> impl Iterator<Item = &[Token]> {
        self.messages.iter().map(Vec::as_slice)
    }

    /// Returns the number of message templates.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns the schema package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the namespace name, if set.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the semantic version string, if set.
    #[must_use]
    pub fn semantic_version(&self) -> Option<&str> {
        self.semantic_version.as_deref()
    }

    /// Returns the schema id.
    #[must_use]
    pub const fn ir_id(&self) -> i32 {
        self.ir_id
    }

    /// Returns the serialized IR format version.
    #[must_use]
    pub const fn ir_version(&self) -> i32 {
        self.ir_version
    }

    /// Returns the schema version.
    #[must_use]
    pub const fn schema_version(&self) -> i32 {
        self.schema_version
    }
}

/// Validates the envelope token list: a single well-formed composite.
///
/// # Errors
/// Returns `IrError::MalformedIr` on violation.
pub fn validate_header_tokens(tokens: &[Token]) -> Result<()> {
    if tokens.is_empty() {
        return Err(IrError::MalformedIr {
            reason: "empty header token list".to_string(),
        });
    }
    if tokens[0].signal != Signal::BeginComposite {
        return Err(IrError::MalformedIr {
            reason: "header token list does not start with a composite".to_string(),
        });
    }
    validate_token_nesting(tokens)
}

/// Validates a message token list: starts with `BeginMessage`, ends with
/// `EndMessage`, and every subtree is well-formed.
///
/// # Errors
/// Returns `IrError::MalformedIr` on violation.
pub fn validate_message_tokens(tokens: &[Token]) -> Result<()> {
    if tokens.len() < 2 {
        return Err(IrError::MalformedIr {
            reason: "message token list needs at least begin and end".to_string(),
        });
    }
    if tokens[0].signal != Signal::BeginMessage {
        return Err(IrError::MalformedIr {
            reason: "message token list does not start with BeginMessage".to_string(),
        });
    }
    if tokens[tokens.len() - 1].signal != Signal::EndMessage {
        return Err(IrError::MalformedIr {
            reason: "message token list does not end with EndMessage".to_string(),
        });
    }
    validate_token_nesting(tokens)
}

/// Checks begin/end pairing and `component_token_count` bookkeeping over
/// a token list.
///
/// Every `Begin*` must have its matching `End*` at the same depth, and
/// its `component_token_count` must equal the index distance to that end
/// plus one.
///
/// # Errors
/// Returns `IrError::MalformedIr` on violation.
pub fn validate_token_nesting(tokens: &[Token]) -> Result<()> {
    let mut stack: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        if token.signal.is_begin() {
            stack.push(index);
        } else if token.signal.is_end() {
            let Some(begin_index) = stack.pop() else {
                return Err(IrError::MalformedIr {
                    reason: format!(
                        "unmatched {:?} for '{}' at token {index}",
                        token.signal, token.name
                    ),
                });
            };
            let begin = &tokens[begin_index];
            if begin.signal.matching_end() != Some(token.signal) {
                return Err(IrError::MalformedIr {
                    reason: format!(
                        "mismatched {:?}/{:?} for '{}' at token {index}",
                        begin.signal, token.signal, begin.name
                    ),
                });
            }
            let span = (index - begin_index + 1) as i32;
            if begin.component_token_count != span {
                return Err(IrError::MalformedIr {
                    reason: format!(
                        "component token count {} on '{}' does not match span {span}",
                        begin.component_token_count, begin.name
                    ),
                });
            }
        }
    }

    if let Some(begin_index) = stack.pop() {
        return Err(IrError::MalformedIr {
            reason: format!(
                "unterminated {:?} for '{}' at token {begin_index}",
                tokens[begin_index].signal, tokens[begin_index].name
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TokenListBuilder;
    use wiresbe_core::types::PrimitiveType;

    fn header_tokens() -> Vec<Token> {
        TokenListBuilder::standard_header().expect("header builds")
    }

    fn tiny_message(template_id: i32) -> Vec<Token> {
        let mut builder = TokenListBuilder::new();
        builder
            .begin_message("Tiny", template_id, 4)
            .begin_field("value", 1, 0)
            .encoding("value", PrimitiveType::Uint32, 0)
            .end_field()
            .end_message();
        builder.build().expect("message builds")
    }

    #[test]
    fn test_ir_lookup_by_template_id() {
        let mut ir = Ir::new("test", 6, 0, 0, header_tokens()).unwrap();
        ir.add_message(tiny_message(1)).unwrap();
        ir.add_message(tiny_message(2)).unwrap();

        assert_eq!(ir.message_count(), 2);
        assert_eq!(ir.message(1).unwrap()[0].id, 1);
        assert_eq!(ir.message(2).unwrap()[0].id, 2);
        assert!(ir.message(3).is_none());
    }

    #[test]
    fn test_ir_rejects_duplicate_template_id() {
        let mut ir = Ir::new("test", 6, 0, 0, header_tokens()).unwrap();
        ir.add_message(tiny_message(1)).unwrap();
        assert!(matches!(
            ir.add_message(tiny_message(1)),
            Err(IrError::MalformedIr { .. })
        ));
    }

    #[test]
    fn test_ir_metadata() {
        let mut ir = Ir::new("car.schema", 6, 0, 3, header_tokens()).unwrap();
        ir.set_namespace("example");
        ir.set_semantic_version("5.2");

        assert_eq!(ir.package(), "car.schema");
        assert_eq!(ir.namespace(), Some("example"));
        assert_eq!(ir.semantic_version(), Some("5.2"));
        assert_eq!(ir.ir_id(), 6);
        assert_eq!(ir.ir_version(), 0);
        assert_eq!(ir.schema_version(), 3);
    }

    #[test]
    fn test_validate_rejects_missing_end() {
        let mut tokens = tiny_message(1);
        tokens.pop();
        assert!(matches!(
            validate_message_tokens(&tokens),
            Err(IrError::MalformedIr { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_component_count() {
        let mut tokens = tiny_message(1);
        tokens[0].component_token_count += 1;
        assert!(matches!(
            validate_message_tokens(&tokens),
            Err(IrError::MalformedIr { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_mismatched_pair() {
        let mut tokens = tiny_message(1);
        let last = tokens.len() - 1;
        tokens[last].signal = Signal::EndGroup;
        assert!(matches!(
            validate_message_tokens(&tokens),
            Err(IrError::MalformedIr { .. })
        ));
    }

    #[test]
    fn test_validate_header_requires_composite() {
        assert!(matches!(
            validate_header_tokens(&[]),
            Err(IrError::MalformedIr { .. })
        ));
        let message = tiny_message(1);
        assert!(matches!(
            validate_header_tokens(&message),
            Err(IrError::MalformedIr { .. })
        ));
    }
}
