//! Token model: one node of the linearized schema.
//!
//! A schema compiles to an ordered token list. Composite, enum, set,
//! group, and var-data regions are delimited by matching begin/end
//! tokens; `component_token_count` on a begin token spans its whole
//! subtree, which is what makes O(1) skipping of unknown elements
//! possible.

use crate::error::{IrError, Result};
use wiresbe_core::types::{ByteOrder, Presence, PrimitiveType};

/// Token signal: the role a token plays in the linearized schema.
///
/// Wire values are those of the serialized IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Start of a message token list.
    BeginMessage,
    /// End of a message token list.
    EndMessage,
    /// Start of a composite type.
    BeginComposite,
    /// End of a composite type.
    EndComposite,
    /// Start of a field (wraps the field's type tokens).
    BeginField,
    /// End of a field.
    EndField,
    /// Start of a repeating group.
    BeginGroup,
    /// End of a repeating group.
    EndGroup,
    /// Start of an enum type.
    BeginEnum,
    /// One named valid value of an enum.
    ValidValue,
    /// End of an enum type.
    EndEnum,
    /// Start of a bit-set type.
    BeginSet,
    /// One named choice (bit position) of a bit set.
    Choice,
    /// End of a bit-set type.
    EndSet,
    /// Start of a variable-length data field.
    BeginVarData,
    /// End of a variable-length data field.
    EndVarData,
    /// A primitive encoding leaf.
    Encoding,
}

impl Signal {
    /// Returns the serialized IR wire value.
    #[must_use]
    pub const fn wire_value(&self) -> u8 {
        match self {
            Self::BeginMessage => 1,
            Self::EndMessage => 2,
            Self::BeginComposite => 3,
            Self::EndComposite => 4,
            Self::BeginField => 5,
            Self::EndField => 6,
            Self::BeginGroup => 7,
            Self::EndGroup => 8,
            Self::BeginEnum => 9,
            Self::ValidValue => 10,
            Self::EndEnum => 11,
            Self::BeginSet => 12,
            Self::Choice => 13,
            Self::EndSet => 14,
            Self::BeginVarData => 15,
            Self::EndVarData => 16,
            Self::Encoding => 17,
        }
    }

    /// Parses a serialized IR wire value.
    ///
    /// # Errors
    /// Returns `IrError::UnknownSignal` for values outside 1..=17.
    pub fn from_wire_value(value: u8) -> Result<Self> {
        Ok(match value {
            1 => Self::BeginMessage,
            2 => Self::EndMessage,
            3 => Self::BeginComposite,
            4 => Self::EndComposite,
            5 => Self::BeginField,
            6 => Self::EndField,
            7 => Self::BeginGroup,
            8 => Self::EndGroup,
            9 => Self::BeginEnum,
            10 => Self::ValidValue,
            11 => Self::EndEnum,
            12 => Self::BeginSet,
            13 => Self::Choice,
            14 => Self::EndSet,
            15 => Self::BeginVarData,
            16 => Self::EndVarData,
            17 => Self::Encoding,
            _ => return Err(IrError::UnknownSignal { value }),
        })
    }

    /// Returns the matching end signal for a begin signal.
    #[must_use]
    pub const fn matching_end(&self) -> Option<Self> {
        match self {
            Self::BeginMessage => Some(Self::EndMessage),
            Self::BeginComposite => Some(Self::EndComposite),
            Self::BeginField => Some(Self::EndField),
            Self::BeginGroup => Some(Self::EndGroup),
            Self::BeginEnum => Some(Self::EndEnum),
            Self::BeginSet => Some(Self::EndSet),
            Self::BeginVarData => Some(Self::EndVarData),
            _ => None,
        }
    }

    /// Returns true for begin signals.
    #[must_use]
    pub const fn is_begin(&self) -> bool {
        self.matching_end().is_some()
    }

    /// Returns true for end signals.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        matches!(
            self,
            Self::EndMessage
                | Self::EndComposite
                | Self::EndField
                | Self::EndGroup
                | Self::EndEnum
                | Self::EndSet
                | Self::EndVarData
        )
    }
}

/// A typed constant carried by a token: enum valid values, bit-set
/// choices, constant fields, and min/max/null overrides.
///
/// On the wire the value is the raw little-endian byte image of the
/// declared primitive type; char-array constants are the bytes
/// themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    Uint(u64),
    /// 32-bit floating point value.
    Float(f32),
    /// 64-bit floating point value.
    Double(f64),
    /// Raw bytes: char constants and char-array constants.
    Bytes(Vec<u8>),
}

impl PrimitiveValue {
    /// Returns the raw wire bytes of this value for the given declared
    /// type.
    #[must_use]
    pub fn wire_bytes(&self, ty: PrimitiveType) -> Vec<u8> {
        match (self, ty) {
            (Self::Bytes(bytes), _) => bytes.clone(),
            (Self::Uint(v), PrimitiveType::Char | PrimitiveType::Uint8) => vec![*v as u8],
            (Self::Uint(v), PrimitiveType::Uint16) => (*v as u16).to_le_bytes().to_vec(),
            (Self::Uint(v), PrimitiveType::Uint32) => (*v as u32).to_le_bytes().to_vec(),
            (Self::Uint(v), PrimitiveType::Uint64) => v.to_le_bytes().to_vec(),
            (Self::Int(v), PrimitiveType::Int8) => (*v as i8).to_le_bytes().to_vec(),
            (Self::Int(v), PrimitiveType::Int16) => (*v as i16).to_le_bytes().to_vec(),
            (Self::Int(v), PrimitiveType::Int32) => (*v as i32).to_le_bytes().to_vec(),
            (Self::Int(v), PrimitiveType::Int64) => v.to_le_bytes().to_vec(),
            (Self::Float(v), _) => v.to_le_bytes().to_vec(),
            (Self::Double(v), _) => v.to_le_bytes().to_vec(),
            // Cross-signedness fallbacks keep the declared width.
            (Self::Int(v), _) => {
                let mut bytes = v.to_le_bytes().to_vec();
                bytes.truncate(ty.size());
                bytes
            }
            (Self::Uint(v), _) => {
                let mut bytes = v.to_le_bytes().to_vec();
                bytes.truncate(ty.size());
                bytes
            }
        }
    }

    /// Parses raw wire bytes into a value of the given declared type.
    ///
    /// Char values of any length become [`PrimitiveValue::Bytes`] so
    /// char-array constants survive.
    ///
    /// # Errors
    /// Returns `IrError::InvalidValueLength` when the byte count does not
    /// match the declared type size.
    pub fn from_wire_bytes(ty: PrimitiveType, bytes: &[u8]) -> Result<Self> {
        if ty == PrimitiveType::Char {
            return Ok(Self::Bytes(bytes.to_vec()));
        }
        if bytes.len() != ty.size() {
            return Err(IrError::InvalidValueLength {
                expected: ty.size(),
                actual: bytes.len(),
            });
        }
        Ok(match ty {
            PrimitiveType::Int8 => Self::Int(bytes[0] as i8 as i64),
            PrimitiveType::Int16 => Self::Int(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
            PrimitiveType::Int32 => {
                Self::Int(i32::from_le_bytes(bytes.try_into().unwrap()) as i64)
            }
            PrimitiveType::Int64 => Self::Int(i64::from_le_bytes(bytes.try_into().unwrap())),
            PrimitiveType::Uint8 => Self::Uint(bytes[0] as u64),
            PrimitiveType::Uint16 => Self::Uint(u16::from_le_bytes([bytes[0], bytes[1]]) as u64),
            PrimitiveType::Uint32 => {
                Self::Uint(u32::from_le_bytes(bytes.try_into().unwrap()) as u64)
            }
            PrimitiveType::Uint64 => Self::Uint(u64::from_le_bytes(bytes.try_into().unwrap())),
            PrimitiveType::Float => Self::Float(f32::from_le_bytes(bytes.try_into().unwrap())),
            PrimitiveType::Double => Self::Double(f64::from_le_bytes(bytes.try_into().unwrap())),
            PrimitiveType::Char => unreachable!(),
        })
    }

    /// Returns the value widened to u64 for enum and bit-set matching.
    ///
    /// Multi-byte char constants and negative integers return `None`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            Self::Int(v) if *v >= 0 => Some(*v as u64),
            Self::Bytes(bytes) if bytes.len() == 1 => Some(bytes[0] as u64),
            _ => None,
        }
    }
}

/// Metadata of a primitive encoding or type region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Encoding {
    /// Primitive type, absent on structural tokens.
    pub primitive_type: Option<PrimitiveType>,
    /// Declared byte order.
    pub byte_order: ByteOrder,
    /// Field presence.
    pub presence: Presence,
    /// Constant value for constant presence, valid values, and choices.
    pub const_value: Option<PrimitiveValue>,
    /// Schema override of the minimum valid value.
    pub min_value: Option<PrimitiveValue>,
    /// Schema override of the maximum valid value.
    pub max_value: Option<PrimitiveValue>,
    /// Schema override of the null sentinel.
    pub null_value: Option<PrimitiveValue>,
    /// Character encoding name for char arrays and var-data.
    pub character_encoding: Option<String>,
    /// Epoch annotation for time fields.
    pub epoch: Option<String>,
    /// Time unit annotation for time fields.
    pub time_unit: Option<String>,
    /// Semantic type annotation.
    pub semantic_type: Option<String>,
}

impl Encoding {
    /// Creates an encoding for a required primitive type with the given
    /// byte order.
    #[must_use]
    pub fn of(primitive_type: PrimitiveType, byte_order: ByteOrder) -> Self {
        Self {
            primitive_type: Some(primitive_type),
            byte_order,
            ..Self::default()
        }
    }
}

/// One node in the linearized schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The role of this token.
    pub signal: Signal,
    /// UTF-8 element name.
    pub name: String,
    /// Optional description from the schema.
    pub description: Option<String>,
    /// Field or group id; [`Token::INVALID_ID`] when not applicable.
    pub id: i32,
    /// Schema version in which this element was added.
    pub version: i32,
    /// Byte offset relative to the enclosing block or composite.
    pub offset: i32,
    /// Bytes this element occupies; [`Token::VARIABLE_LENGTH`] for
    /// var-length elements.
    pub encoded_length: i32,
    /// Total tokens spanned by this element's subtree, begin and end
    /// included.
    pub component_token_count: i32,
    /// Encoding metadata.
    pub encoding: Encoding,
}

impl Token {
    /// Id value for tokens without a field id.
    pub const INVALID_ID: i32 = -1;

    /// Encoded-length sentinel for var-length elements.
    pub const VARIABLE_LENGTH: i32 = -1;

    /// Creates a structural token with default metadata.
    ///
    /// # Arguments
    /// * `signal` - The token's role
    /// * `name` - Element name
    #[must_use]
    pub fn new(signal: Signal, name: impl Into<String>) -> Self {
        Self {
            signal,
            name: name.into(),
            description: None,
            id: Self::INVALID_ID,
            version: 0,
            offset: 0,
            encoded_length: 0,
            component_token_count: 1,
            encoding: Encoding::default(),
        }
    }

    /// Returns true when the element carries a constant and so occupies
    /// no wire bytes.
    #[must_use]
    pub fn is_constant_encoding(&self) -> bool {
        self.encoding.presence.is_constant()
    }

    /// Returns true when this element exists in a message of the given
    /// acting version.
    #[must_use]
    pub fn matches_since_version(&self, acting_version: u64) -> bool {
        self.version as u64 <= acting_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_wire_round_trip() {
        for value in 1..=17u8 {
            let signal = Signal::from_wire_value(value).unwrap();
            assert_eq!(signal.wire_value(), value);
        }
        assert!(Signal::from_wire_value(0).is_err());
        assert!(Signal::from_wire_value(18).is_err());
        assert!(Signal::from_wire_value(255).is_err());
    }

    #[test]
    fn test_signal_begin_end_pairs() {
        assert_eq!(Signal::BeginMessage.matching_end(), Some(Signal::EndMessage));
        assert_eq!(Signal::BeginGroup.matching_end(), Some(Signal::EndGroup));
        assert_eq!(Signal::BeginVarData.matching_end(), Some(Signal::EndVarData));
        assert_eq!(Signal::Encoding.matching_end(), None);
        assert_eq!(Signal::ValidValue.matching_end(), None);

        assert!(Signal::BeginEnum.is_begin());
        assert!(Signal::EndEnum.is_end());
        assert!(!Signal::Choice.is_begin());
        assert!(!Signal::Choice.is_end());
    }

    #[test]
    fn test_primitive_value_wire_bytes_uint() {
        let value = PrimitiveValue::Uint(0x0102);
        assert_eq!(value.wire_bytes(PrimitiveType::Uint16), vec![0x02, 0x01]);
        assert_eq!(
            value.wire_bytes(PrimitiveType::Uint32),
            vec![0x02, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn test_primitive_value_wire_bytes_int() {
        let value = PrimitiveValue::Int(-2);
        assert_eq!(value.wire_bytes(PrimitiveType::Int8), vec![0xFE]);
        assert_eq!(value.wire_bytes(PrimitiveType::Int16), vec![0xFE, 0xFF]);
    }

    #[test]
    fn test_primitive_value_wire_bytes_char() {
        let value = PrimitiveValue::Bytes(b"123".to_vec());
        assert_eq!(value.wire_bytes(PrimitiveType::Char), b"123".to_vec());
    }

    #[test]
    fn test_primitive_value_from_wire_bytes_round_trip() {
        let cases = [
            (PrimitiveType::Int8, PrimitiveValue::Int(-5)),
            (PrimitiveType::Int32, PrimitiveValue::Int(-100_000)),
            (PrimitiveType::Int64, PrimitiveValue::Int(i64::MIN + 1)),
            (PrimitiveType::Uint8, PrimitiveValue::Uint(200)),
            (PrimitiveType::Uint16, PrimitiveValue::Uint(9000)),
            (PrimitiveType::Uint64, PrimitiveValue::Uint(u64::MAX - 1)),
            (PrimitiveType::Float, PrimitiveValue::Float(35.9)),
            (PrimitiveType::Double, PrimitiveValue::Double(-0.25)),
            (PrimitiveType::Char, PrimitiveValue::Bytes(b"Petrol".to_vec())),
        ];
        for (ty, value) in cases {
            let bytes = value.wire_bytes(ty);
            let parsed = PrimitiveValue::from_wire_bytes(ty, &bytes).unwrap();
            assert_eq!(parsed, value, "round trip failed for {:?}", ty);
        }
    }

    #[test]
    fn test_primitive_value_length_mismatch() {
        assert!(matches!(
            PrimitiveValue::from_wire_bytes(PrimitiveType::Uint32, &[1, 2]),
            Err(IrError::InvalidValueLength {
                expected: 4,
                actual: 2,
            })
        ));
    }

    #[test]
    fn test_primitive_value_as_u64() {
        assert_eq!(PrimitiveValue::Uint(7).as_u64(), Some(7));
        assert_eq!(PrimitiveValue::Int(7).as_u64(), Some(7));
        assert_eq!(PrimitiveValue::Int(-1).as_u64(), None);
        assert_eq!(PrimitiveValue::Bytes(vec![b'A']).as_u64(), Some(65));
        assert_eq!(PrimitiveValue::Bytes(b"AB".to_vec()).as_u64(), None);
        assert_eq!(PrimitiveValue::Double(1.0).as_u64(), None);
    }

    #[test]
    fn test_token_defaults() {
        let token = Token::new(Signal::BeginMessage, "Car");
        assert_eq!(token.id, Token::INVALID_ID);
        assert_eq!(token.version, 0);
        assert_eq!(token.component_token_count, 1);
        assert!(!token.is_constant_encoding());
        assert!(token.matches_since_version(0));
        assert!(token.matches_since_version(3));
    }

    #[test]
    fn test_token_since_version() {
        let mut token = Token::new(Signal::Encoding, "discountedModel");
        token.version = 2;
        assert!(!token.matches_since_version(0));
        assert!(!token.matches_since_version(1));
        assert!(token.matches_since_version(2));
        assert!(token.matches_since_version(5));
    }
}
