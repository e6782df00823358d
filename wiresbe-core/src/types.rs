//! Primitive type definitions and sentinel values for SBE encoding.
//!
//! This module maps SBE primitive types to Rust types and defines the
//! per-type null/min/max sentinel values used for optional fields and
//! schema evolution. The wire values match the serialized IR encoding.

/// SBE primitive type enumeration.
///
/// Wire values are those of the serialized IR (`char = 1` through
/// `double = 11`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Single character (1 byte).
    Char,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
}

impl PrimitiveType {
    /// Returns the size of the primitive type in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Char | Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float => 4,
            Self::Int64 | Self::Uint64 | Self::Double => 8,
        }
    }

    /// Returns the SBE type name.
    #[must_use]
    pub const fn sbe_name(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Parses a primitive type from its SBE name.
    #[must_use]
    pub fn from_sbe_name(name: &str) -> Option<Self> {
        match name {
            "char" => Some(Self::Char),
            "int8" => Some(Self::Int8),
            "int16" => Some(Self::Int16),
            "int32" => Some(Self::Int32),
            "int64" => Some(Self::Int64),
            "uint8" => Some(Self::Uint8),
            "uint16" => Some(Self::Uint16),
            "uint32" => Some(Self::Uint32),
            "uint64" => Some(Self::Uint64),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            _ => None,
        }
    }

    /// Returns the serialized IR wire value for this type.
    #[must_use]
    pub const fn wire_value(&self) -> u8 {
        match self {
            Self::Char => 1,
            Self::Int8 => 2,
            Self::Int16 => 3,
            Self::Int32 => 4,
            Self::Int64 => 5,
            Self::Uint8 => 6,
            Self::Uint16 => 7,
            Self::Uint32 => 8,
            Self::Uint64 => 9,
            Self::Float => 10,
            Self::Double => 11,
        }
    }

    /// Parses a serialized IR wire value.
    ///
    /// Value `0` means "no type" and maps to `None`, as does any unknown
    /// value.
    #[must_use]
    pub const fn from_wire_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Char),
            2 => Some(Self::Int8),
            3 => Some(Self::Int16),
            4 => Some(Self::Int32),
            5 => Some(Self::Int64),
            6 => Some(Self::Uint8),
            7 => Some(Self::Uint16),
            8 => Some(Self::Uint32),
            9 => Some(Self::Uint64),
            10 => Some(Self::Float),
            11 => Some(Self::Double),
            _ => None,
        }
    }

    /// Returns true if this is a signed integer type.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns true if this is an unsigned integer type.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64
        )
    }

    /// Returns true if this is a floating point type.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

/// Null sentinel values for SBE primitive types.
///
/// Signed integers use the type minimum, unsigned integers the type
/// maximum, floating point NaN (any NaN decodes as null), char zero.
pub mod null_values {
    /// Null value for char type.
    pub const CHAR_NULL: u8 = 0;

    /// Null value for int8 type.
    pub const INT8_NULL: i8 = i8::MIN;

    /// Null value for int16 type.
    pub const INT16_NULL: i16 = i16::MIN;

    /// Null value for int32 type.
    pub const INT32_NULL: i32 = i32::MIN;

    /// Null value for int64 type.
    pub const INT64_NULL: i64 = i64::MIN;

    /// Null value for uint8 type.
    pub const UINT8_NULL: u8 = u8::MAX;

    /// Null value for uint16 type.
    pub const UINT16_NULL: u16 = u16::MAX;

    /// Null value for uint32 type.
    pub const UINT32_NULL: u32 = u32::MAX;

    /// Null value for uint64 type.
    pub const UINT64_NULL: u64 = u64::MAX;

    /// Null value for float type (NaN).
    pub const FLOAT_NULL: f32 = f32::NAN;

    /// Null value for double type (NaN).
    pub const DOUBLE_NULL: f64 = f64::NAN;
}

/// Minimum valid values for SBE primitive types.
///
/// One above the type minimum for signed integers (the minimum itself is
/// the null sentinel), zero for unsigned, printable-ASCII start for
/// char.
pub mod min_values {
    /// Minimum valid char (space).
    pub const CHAR_MIN: u8 = 0x20;

    /// Minimum valid int8.
    pub const INT8_MIN: i8 = i8::MIN + 1;

    /// Minimum valid int16.
    pub const INT16_MIN: i16 = i16::MIN + 1;

    /// Minimum valid int32.
    pub const INT32_MIN: i32 = i32::MIN + 1;

    /// Minimum valid int64.
    pub const INT64_MIN: i64 = i64::MIN + 1;

    /// Minimum valid uint8.
    pub const UINT8_MIN: u8 = 0;

    /// Minimum valid uint16.
    pub const UINT16_MIN: u16 = 0;

    /// Minimum valid uint32.
    pub const UINT32_MIN: u32 = 0;

    /// Minimum valid uint64.
    pub const UINT64_MIN: u64 = 0;

    /// Minimum valid float (smallest positive normal value).
    pub const FLOAT_MIN: f32 = f32::MIN_POSITIVE;

    /// Minimum valid double (smallest positive normal value).
    pub const DOUBLE_MIN: f64 = f64::MIN_POSITIVE;
}

/// Maximum valid values for SBE primitive types.
///
/// One below the type maximum for unsigned integers (the maximum itself
/// is the null sentinel), the type maximum for signed, printable-ASCII
/// end for char.
pub mod max_values {
    /// Maximum valid char (tilde).
    pub const CHAR_MAX: u8 = 0x7E;

    /// Maximum valid int8.
    pub const INT8_MAX: i8 = i8::MAX;

    /// Maximum valid int16.
    pub const INT16_MAX: i16 = i16::MAX;

    /// Maximum valid int32.
    pub const INT32_MAX: i32 = i32::MAX;

    /// Maximum valid int64.
    pub const INT64_MAX: i64 = i64::MAX;

    /// Maximum valid uint8.
    pub const UINT8_MAX: u8 = u8::MAX - 1;

    /// Maximum valid uint16.
    pub const UINT16_MAX: u16 = u16::MAX - 1;

    /// Maximum valid uint32.
    pub const UINT32_MAX: u32 = u32::MAX - 1;

    /// Maximum valid uint64.
    pub const UINT64_MAX: u64 = u64::MAX - 1;

    /// Maximum valid float.
    pub const FLOAT_MAX: f32 = f32::MAX;

    /// Maximum valid double.
    pub const DOUBLE_MAX: f64 = f64::MAX;
}

/// Validates a value against a declared range, for strict-mode setters.
///
/// Default setters store and trust; a generated codec built in strict
/// mode calls this before writing.
///
/// # Errors
/// Returns `Error::ValueOutOfRange` when `value` lies outside
/// `[min, max]`.
pub fn check_range<T>(value: T, min: T, max: T) -> crate::error::Result<()>
where
    T: PartialOrd + Copy + Into<i128>,
{
    if value < min || value > max {
        return Err(crate::error::Error::ValueOutOfRange {
            value: value.into(),
            min: min.into(),
            max: max.into(),
        });
    }
    Ok(())
}

/// Byte order for SBE encoding.
///
/// Wire values are those of the serialized IR (LE = 0, BE = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Little-endian byte order (default for SBE).
    #[default]
    LittleEndian,
    /// Big-endian byte order.
    BigEndian,
}

impl ByteOrder {
    /// Parses byte order from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "littleendian" | "little-endian" | "le" => Some(Self::LittleEndian),
            "bigendian" | "big-endian" | "be" => Some(Self::BigEndian),
            _ => None,
        }
    }

    /// Returns the serialized IR wire value.
    #[must_use]
    pub const fn wire_value(&self) -> u8 {
        match self {
            Self::LittleEndian => 0,
            Self::BigEndian => 1,
        }
    }

    /// Parses a serialized IR wire value.
    #[must_use]
    pub const fn from_wire_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::LittleEndian),
            1 => Some(Self::BigEndian),
            _ => None,
        }
    }

    /// Returns true if this byte order matches the native platform byte
    /// order.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        #[cfg(target_endian = "little")]
        {
            matches!(self, Self::LittleEndian)
        }
        #[cfg(target_endian = "big")]
        {
            matches!(self, Self::BigEndian)
        }
    }
}

/// Field presence indicator.
///
/// Wire values are those of the serialized IR (required = 0,
/// optional = 1, constant = 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presence {
    /// Field is required and must have a value.
    #[default]
    Required,
    /// Field is optional and may be null.
    Optional,
    /// Field has a constant value defined in the schema and occupies no
    /// wire bytes.
    Constant,
}

impl Presence {
    /// Parses presence from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "required" => Some(Self::Required),
            "optional" => Some(Self::Optional),
            "constant" => Some(Self::Constant),
            _ => None,
        }
    }

    /// Returns the serialized IR wire value.
    #[must_use]
    pub const fn wire_value(&self) -> u8 {
        match self {
            Self::Required => 0,
            Self::Optional => 1,
            Self::Constant => 2,
        }
    }

    /// Parses a serialized IR wire value.
    #[must_use]
    pub const fn from_wire_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Required),
            1 => Some(Self::Optional),
            2 => Some(Self::Constant),
            _ => None,
        }
    }

    /// Returns true if this is a required field.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// Returns true if this is an optional field.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional)
    }

    /// Returns true if this is a constant field.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_type_size() {
        assert_eq!(PrimitiveType::Char.size(), 1);
        assert_eq!(PrimitiveType::Int8.size(), 1);
        assert_eq!(PrimitiveType::Uint8.size(), 1);
        assert_eq!(PrimitiveType::Int16.size(), 2);
        assert_eq!(PrimitiveType::Uint16.size(), 2);
        assert_eq!(PrimitiveType::Int32.size(), 4);
        assert_eq!(PrimitiveType::Uint32.size(), 4);
        assert_eq!(PrimitiveType::Float.size(), 4);
        assert_eq!(PrimitiveType::Int64.size(), 8);
        assert_eq!(PrimitiveType::Uint64.size(), 8);
        assert_eq!(PrimitiveType::Double.size(), 8);
    }

    #[test]
    fn test_primitive_type_names() {
        for ty in [
            PrimitiveType::Char,
            PrimitiveType::Int8,
            PrimitiveType::Int16,
            PrimitiveType::Int32,
            PrimitiveType::Int64,
            PrimitiveType::Uint8,
            PrimitiveType::Uint16,
            PrimitiveType::Uint32,
            PrimitiveType::Uint64,
            PrimitiveType::Float,
            PrimitiveType::Double,
        ] {
            assert_eq!(PrimitiveType::from_sbe_name(ty.sbe_name()), Some(ty));
        }
        assert_eq!(PrimitiveType::from_sbe_name("invalid"), None);
    }

    #[test]
    fn test_primitive_type_wire_values() {
        assert_eq!(PrimitiveType::Char.wire_value(), 1);
        assert_eq!(PrimitiveType::Double.wire_value(), 11);
        for value in 1..=11u8 {
            let ty = PrimitiveType::from_wire_value(value).unwrap();
            assert_eq!(ty.wire_value(), value);
        }
        assert_eq!(PrimitiveType::from_wire_value(0), None);
        assert_eq!(PrimitiveType::from_wire_value(12), None);
        assert_eq!(PrimitiveType::from_wire_value(255), None);
    }

    #[test]
    fn test_primitive_type_classification() {
        assert!(PrimitiveType::Int8.is_signed());
        assert!(PrimitiveType::Int64.is_signed());
        assert!(!PrimitiveType::Uint8.is_signed());
        assert!(!PrimitiveType::Char.is_signed());

        assert!(PrimitiveType::Uint16.is_unsigned());
        assert!(!PrimitiveType::Int16.is_unsigned());
        assert!(!PrimitiveType::Float.is_unsigned());

        assert!(PrimitiveType::Float.is_float());
        assert!(PrimitiveType::Double.is_float());
        assert!(!PrimitiveType::Int32.is_float());
    }

    #[test]
    fn test_null_values() {
        assert_eq!(null_values::CHAR_NULL, 0);
        assert_eq!(null_values::INT8_NULL, i8::MIN);
        assert_eq!(null_values::INT16_NULL, i16::MIN);
        assert_eq!(null_values::INT32_NULL, i32::MIN);
        assert_eq!(null_values::INT64_NULL, i64::MIN);
        assert_eq!(null_values::UINT8_NULL, u8::MAX);
        assert_eq!(null_values::UINT16_NULL, u16::MAX);
        assert_eq!(null_values::UINT32_NULL, u32::MAX);
        assert_eq!(null_values::UINT64_NULL, u64::MAX);
        assert!(null_values::FLOAT_NULL.is_nan());
        assert!(null_values::DOUBLE_NULL.is_nan());
    }

    #[test]
    fn test_min_max_values() {
        assert_eq!(min_values::INT8_MIN, -127);
        assert_eq!(max_values::INT8_MAX, 127);
        assert_eq!(min_values::UINT8_MIN, 0);
        assert_eq!(max_values::UINT8_MAX, 254);
        assert_eq!(min_values::INT32_MIN, i32::MIN + 1);
        assert_eq!(max_values::INT32_MAX, i32::MAX);
        assert_eq!(min_values::UINT64_MIN, 0);
        assert_eq!(max_values::UINT64_MAX, u64::MAX - 1);
        assert_eq!(min_values::CHAR_MIN, b' ');
        assert_eq!(max_values::CHAR_MAX, b'~');
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(100u16, min_values::UINT16_MIN, max_values::UINT16_MAX).is_ok());
        assert!(check_range(max_values::UINT16_MAX, 0, max_values::UINT16_MAX).is_ok());
        let err =
            check_range(u16::MAX, min_values::UINT16_MIN, max_values::UINT16_MAX).unwrap_err();
        assert_eq!(
            err,
            crate::error::Error::ValueOutOfRange {
                value: 65535,
                min: 0,
                max: 65534,
            }
        );
        assert!(check_range(-128i8, min_values::INT8_MIN, max_values::INT8_MAX).is_err());
    }

    #[test]
    fn test_byte_order() {
        assert_eq!(
            ByteOrder::parse("littleEndian"),
            Some(ByteOrder::LittleEndian)
        );
        assert_eq!(ByteOrder::parse("bigEndian"), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::parse("invalid"), None);
        assert_eq!(ByteOrder::default(), ByteOrder::LittleEndian);

        assert_eq!(ByteOrder::LittleEndian.wire_value(), 0);
        assert_eq!(ByteOrder::BigEndian.wire_value(), 1);
        assert_eq!(
            ByteOrder::from_wire_value(0),
            Some(ByteOrder::LittleEndian)
        );
        assert_eq!(ByteOrder::from_wire_value(1), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::from_wire_value(2), None);
    }

    #[test]
    fn test_presence() {
        assert_eq!(Presence::parse("required"), Some(Presence::Required));
        assert_eq!(Presence::parse("optional"), Some(Presence::Optional));
        assert_eq!(Presence::parse("constant"), Some(Presence::Constant));
        assert_eq!(Presence::parse("invalid"), None);

        assert!(Presence::Required.is_required());
        assert!(Presence::Optional.is_optional());
        assert!(Presence::Constant.is_constant());

        for value in 0..=2u8 {
            let presence = Presence::from_wire_value(value).unwrap();
            assert_eq!(presence.wire_value(), value);
        }
        assert_eq!(Presence::from_wire_value(3), None);
    }
}
