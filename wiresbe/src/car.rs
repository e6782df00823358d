//! Hand-written codec for the canonical Car message, shaped the way the
//! code generator emits message codecs: schema constants, offset-based
//! field accessors, composite flyweights, group iteration over the
//! shared cursor, and var-data in declaration order.
//!
//! Schema: envelope `{blockLength=47, templateId=1, schemaId=6,
//! version=0}`, fixed block of 47 bytes, three repeating groups (one
//! nested), three var-data fields with u16 length prefixes.

use wiresbe_core::bounds;
use wiresbe_core::buffer::{ReadBuffer, WriteBuffer};
use wiresbe_core::cursor::Cursor;
use wiresbe_core::decoder::SbeDecoder;
use wiresbe_core::encoder::SbeEncoder;
use wiresbe_core::error::Result;
use wiresbe_core::group::{GroupDecoder, GroupEncoder};
use wiresbe_core::message::SbeMessage;
use wiresbe_core::types::{PrimitiveType, null_values};
use wiresbe_core::var_data;
use wiresbe_ir::builder::TokenListBuilder;
use wiresbe_ir::ir::Ir;
use wiresbe_ir::token::PrimitiveValue;

/// Installs the fmt subscriber once so the IR load diagnostics emitted
/// through `tracing` surface under `RUST_LOG` when tests run with
/// `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Availability flag, `uint8` encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanType {
    F,
    T,
    NullVal,
}

impl BooleanType {
    pub fn encode(self) -> u8 {
        match self {
            Self::F => 0,
            Self::T => 1,
            Self::NullVal => null_values::UINT8_NULL,
        }
    }

    pub fn decode(value: u8) -> Self {
        match value {
            0 => Self::F,
            1 => Self::T,
            _ => Self::NullVal,
        }
    }
}

/// Model code, `char` encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    A,
    B,
    C,
    NullVal,
}

impl Model {
    pub fn encode(self) -> u8 {
        match self {
            Self::A => b'A',
            Self::B => b'B',
            Self::C => b'C',
            Self::NullVal => null_values::CHAR_NULL,
        }
    }

    pub fn decode(value: u8) -> Self {
        match value {
            b'A' => Self::A,
            b'B' => Self::B,
            b'C' => Self::C,
            _ => Self::NullVal,
        }
    }
}

/// Engine booster kind, `char` encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostType {
    Turbo,
    Supercharger,
    Nitrous,
    Kers,
    NullVal,
}

impl BoostType {
    pub fn encode(self) -> u8 {
        match self {
            Self::Turbo => b'T',
            Self::Supercharger => b'S',
            Self::Nitrous => b'N',
            Self::Kers => b'K',
            Self::NullVal => null_values::CHAR_NULL,
        }
    }

    pub fn decode(value: u8) -> Self {
        match value {
            b'T' => Self::Turbo,
            b'S' => Self::Supercharger,
            b'N' => Self::Nitrous,
            b'K' => Self::Kers,
            _ => Self::NullVal,
        }
    }
}

/// Optional extras bit set, `uint8` encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionalExtras(u8);

impl OptionalExtras {
    const SUN_ROOF: u8 = 0;
    const SPORTS_PACK: u8 = 1;
    const CRUISE_CONTROL: u8 = 2;

    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn sun_roof(self) -> bool {
        self.0 & (1 << Self::SUN_ROOF) != 0
    }

    pub fn sports_pack(self) -> bool {
        self.0 & (1 << Self::SPORTS_PACK) != 0
    }

    pub fn cruise_control(self) -> bool {
        self.0 & (1 << Self::CRUISE_CONTROL) != 0
    }

    pub fn set_sun_roof(&mut self, on: bool) -> &mut Self {
        self.set(Self::SUN_ROOF, on);
        self
    }

    pub fn set_sports_pack(&mut self, on: bool) -> &mut Self {
        self.set(Self::SPORTS_PACK, on);
        self
    }

    pub fn set_cruise_control(&mut self, on: bool) -> &mut Self {
        self.set(Self::CRUISE_CONTROL, on);
        self
    }

    fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= 1 << bit;
        } else {
            self.0 &= !(1 << bit);
        }
    }
}

/// One decoded fuelFigures entry.
#[derive(Debug, PartialEq)]
pub struct FuelFigure<'a> {
    pub speed: u16,
    pub mpg: f32,
    pub usage_description: &'a [u8],
}

const ENGINE_OFFSET: usize = 39;
const ENGINE_ENCODED_LENGTH: usize = 8;
const FUEL_FIGURES_BLOCK_LENGTH: u16 = 6;
const PERFORMANCE_FIGURES_BLOCK_LENGTH: u16 = 1;
const ACCELERATION_BLOCK_LENGTH: u16 = 6;

/// Composite flyweight over the engine region of the fixed block.
pub struct EngineEncoder<'a> {
    buffer: &'a mut [u8],
    offset: usize,
}

impl EngineEncoder<'_> {
    pub fn set_capacity(&mut self, value: u16) -> &mut Self {
        self.buffer.put_u16_le(self.offset, value);
        self
    }

    pub fn set_num_cylinders(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(self.offset + 2, value);
        self
    }

    pub fn set_manufacturer_code(&mut self, code: &[u8; 3]) -> &mut Self {
        self.buffer.put_bytes(self.offset + 3, code);
        self
    }

    pub fn set_boost_type(&mut self, value: BoostType) -> &mut Self {
        self.buffer.put_u8(self.offset + 6, value.encode());
        self
    }

    pub fn set_horse_power(&mut self, value: u8) -> &mut Self {
        self.buffer.put_u8(self.offset + 7, value);
        self
    }
}

/// Composite flyweight over a decoded engine region; absent when the
/// acting block is too short to contain it.
pub struct EngineDecoder<'a> {
    buffer: &'a [u8],
    offset: usize,
    present: bool,
}

impl EngineDecoder<'_> {
    /// Constant from the schema; occupies no wire bytes.
    pub const fn max_rpm() -> u16 {
        9000
    }

    /// Constant from the schema; occupies no wire bytes.
    pub const fn fuel() -> &'static [u8] {
        b"Petrol"
    }

    pub fn capacity(&self) -> u16 {
        if !self.present {
            return null_values::UINT16_NULL;
        }
        self.buffer.get_u16_le(self.offset)
    }

    pub fn num_cylinders(&self) -> u8 {
        if !self.present {
            return null_values::UINT8_NULL;
        }
        self.buffer.get_u8(self.offset + 2)
    }

    pub fn manufacturer_code(&self) -> [u8; 3] {
        if !self.present {
            return [0; 3];
        }
        let mut code = [0u8; 3];
        code.copy_from_slice(self.buffer.get_bytes(self.offset + 3, 3));
        code
    }

    pub fn boost_type(&self) -> BoostType {
        if !self.present {
            return BoostType::NullVal;
        }
        BoostType::decode(self.buffer.get_u8(self.offset + 6))
    }

    pub fn horse_power(&self) -> u8 {
        if !self.present {
            return null_values::UINT8_NULL;
        }
        self.buffer.get_u8(self.offset + 7)
    }
}

/// Flyweight encoder for the Car message.
pub struct CarEncoder<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    cursor: Cursor,
}

impl SbeMessage for CarEncoder<'_> {
    const BLOCK_LENGTH: u16 = 47;
    const TEMPLATE_ID: u16 = 1;
    const SCHEMA_ID: u16 = 6;
    const SCHEMA_VERSION: u16 = 0;
}

impl<'a> SbeEncoder<'a> for CarEncoder<'a> {
    fn wrap_for_encode(buffer: &'a mut [u8], offset: usize) -> Result<Self> {
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

impl CarEncoder<'_> {
    pub const SERIAL_NUMBER_ID: u16 = 1;
    pub const MODEL_YEAR_ID: u16 = 2;
    pub const AVAILABLE_ID: u16 = 3;
    pub const CODE_ID: u16 = 4;
    pub const SOME_NUMBERS_ID: u16 = 5;
    pub const VEHICLE_CODE_ID: u16 = 6;
    pub const EXTRAS_ID: u16 = 7;
    pub const ENGINE_ID: u16 = 8;
    pub const FUEL_FIGURES_ID: u16 = 9;
    pub const PERFORMANCE_FIGURES_ID: u16 = 13;
    pub const MANUFACTURER_ID: u16 = 18;
    pub const MODEL_ID: u16 = 19;
    pub const ACTIVATION_CODE_ID: u16 = 20;

    /// Character encoding of the vehicleCode char array.
    pub const fn vehicle_code_character_encoding() -> &'static str {
        "UTF-8"
    }

    pub fn set_serial_number(&mut self, value: u64) -> &mut Self {
        self.buffer.put_u64_le(self.offset, value);
        self
    }

    pub fn set_model_year(&mut self, value: u16) -> &mut Self {
        self.buffer.put_u16_le(self.offset + 8, value);
        self
    }

    pub fn set_available(&mut self, value: BooleanType) -> &mut Self {
        self.buffer.put_u8(self.offset + 10, value.encode());
        self
    }

    pub fn set_code(&mut self, value: Model) -> &mut Self {
        self.buffer.put_u8(self.offset + 11, value.encode());
        self
    }

    pub fn set_some_numbers(&mut self, values: &[i32; 5]) -> &mut Self {
        for (index, value) in values.iter().enumerate() {
            self.buffer.put_i32_le(self.offset + 12 + index * 4, *value);
        }
        self
    }

    pub fn set_vehicle_code(&mut self, code: &[u8; 6]) -> &mut Self {
        self.buffer.put_bytes(self.offset + 32, code);
        self
    }

    pub fn set_extras(&mut self, value: OptionalExtras) -> &mut Self {
        self.buffer.put_u8(self.offset + 38, value.bits());
        self
    }

    pub fn engine(&mut self) -> EngineEncoder<'_> {
        EngineEncoder {
            buffer: &mut *self.buffer,
            offset: self.offset + ENGINE_OFFSET,
        }
    }

    /// Writes the fuelFigures dimensions header for `count` entries.
    pub fn fuel_figures_count(&mut self, count: usize) -> Result<GroupEncoder> {
        GroupEncoder::wrap(
            &mut *self.buffer,
            &mut self.cursor,
            FUEL_FIGURES_BLOCK_LENGTH,
            count,
        )
    }

    /// Writes one fuelFigures entry: fixed fields, then its var-data.
    pub fn add_fuel_figure(
        &mut self,
        group: &mut GroupEncoder,
        speed: u16,
        mpg: f32,
        usage_description: &[u8],
    ) -> Result<()> {
        let base = group.next(&*self.buffer, &mut self.cursor)?;
        self.buffer.put_u16_le(base, speed);
        self.buffer.put_f32_le(base + 2, mpg);
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, usage_description)
    }

    /// Writes the performanceFigures dimensions header for `count`
    /// entries.
    pub fn performance_figures_count(&mut self, count: usize) -> Result<GroupEncoder> {
        GroupEncoder::wrap(
            &mut *self.buffer,
            &mut self.cursor,
            PERFORMANCE_FIGURES_BLOCK_LENGTH,
            count,
        )
    }

    /// Writes one performanceFigures entry's fixed block; follow with
    /// [`CarEncoder::acceleration_count`] for its nested group.
    pub fn add_performance_figure(&mut self, group: &mut GroupEncoder, octane: u8) -> Result<()> {
        let base = group.next(&*self.buffer, &mut self.cursor)?;
        self.buffer.put_u8(base, octane);
        Ok(())
    }

    /// Writes the nested acceleration dimensions header for the current
    /// performanceFigures entry.
    pub fn acceleration_count(&mut self, count: usize) -> Result<GroupEncoder> {
        GroupEncoder::wrap(
            &mut *self.buffer,
            &mut self.cursor,
            ACCELERATION_BLOCK_LENGTH,
            count,
        )
    }

    /// Writes one acceleration entry.
    pub fn add_acceleration(
        &mut self,
        group: &mut GroupEncoder,
        mph: u16,
        seconds: f32,
    ) -> Result<()> {
        let base = group.next(&*self.buffer, &mut self.cursor)?;
        self.buffer.put_u16_le(base, mph);
        self.buffer.put_f32_le(base + 2, seconds);
        Ok(())
    }

    pub fn put_manufacturer(&mut self, value: &[u8]) -> Result<()> {
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, value)
    }

    pub fn put_model(&mut self, value: &[u8]) -> Result<()> {
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, value)
    }

    pub fn put_activation_code(&mut self, value: &[u8]) -> Result<()> {
        var_data::put_u16_prefixed(&mut *self.buffer, &mut self.cursor, value)
    }
}

/// Flyweight decoder for the Car message.
///
/// Fixed-block getters honor the acting block length: a field the
/// writer's shorter schema never carried reads as its null sentinel.
pub struct CarDecoder<'a> {
    buffer: &'a [u8],
    offset: usize,
    acting_block_length: u16,
    acting_version: u16,
    cursor: Cursor,
}

impl SbeMessage for CarDecoder<'_> {
    const BLOCK_LENGTH: u16 = 47;
    const TEMPLATE_ID: u16 = 1;
    const SCHEMA_ID: u16 = 6;
    const SCHEMA_VERSION: u16 = 0;
}

impl<'a> SbeDecoder<'a> for CarDecoder<'a> {
    fn wrap_for_decode(
        buffer: &'a [u8],
        offset: usize,
        acting_block_length: u16,
        acting_version: u16,
    ) -> Result<Self> {
        bounds::check(buffer.len(), offset, acting_block_length as usize)?;
        Ok(Self {
            buffer,
            offset,
            acting_block_length,
            acting_version,
            cursor: Cursor::new(offset + acting_block_length as usize),
        })
    }

    fn encoded_length(&self) -> usize {
        self.cursor.position() - self.offset
    }
}

impl<'a> CarDecoder<'a> {
    pub fn acting_version(&self) -> u16 {
        self.acting_version
    }

    fn in_acting_block(&self, field_offset: usize, size: usize) -> bool {
        field_offset + size <= self.acting_block_length as usize
    }

    pub fn serial_number(&self) -> u64 {
        if !self.in_acting_block(0, 8) {
            return null_values::UINT64_NULL;
        }
        self.buffer.get_u64_le(self.offset)
    }

    pub fn model_year(&self) -> u16 {
        if !self.in_acting_block(8, 2) {
            return null_values::UINT16_NULL;
        }
        self.buffer.get_u16_le(self.offset + 8)
    }

    pub fn available(&self) -> BooleanType {
        if !self.in_acting_block(10, 1) {
            return BooleanType::NullVal;
        }
        BooleanType::decode(self.buffer.get_u8(self.offset + 10))
    }

    pub fn code(&self) -> Model {
        if !self.in_acting_block(11, 1) {
            return Model::NullVal;
        }
        Model::decode(self.buffer.get_u8(self.offset + 11))
    }

    pub fn some_numbers(&self) -> [i32; 5] {
        if !self.in_acting_block(12, 20) {
            return [null_values::INT32_NULL; 5];
        }
        let mut values = [0i32; 5];
        for (index, value) in values.iter_mut().enumerate() {
            *value = self.buffer.get_i32_le(self.offset + 12 + index * 4);
        }
        values
    }

    pub fn vehicle_code(&self) -> [u8; 6] {
        if !self.in_acting_block(32, 6) {
            return [null_values::CHAR_NULL; 6];
        }
        let mut code = [0u8; 6];
        code.copy_from_slice(self.buffer.get_bytes(self.offset + 32, 6));
        code
    }

    pub fn extras(&self) -> OptionalExtras {
        if !self.in_acting_block(38, 1) {
            return OptionalExtras::default();
        }
        OptionalExtras::new(self.buffer.get_u8(self.offset + 38))
    }

    pub fn engine(&self) -> EngineDecoder<'a> {
        EngineDecoder {
            buffer: self.buffer,
            offset: self.offset + ENGINE_OFFSET,
            present: self.in_acting_block(ENGINE_OFFSET, ENGINE_ENCODED_LENGTH),
        }
    }

    /// Reads the fuelFigures dimensions header.
    pub fn fuel_figures(&mut self) -> Result<GroupDecoder> {
        GroupDecoder::wrap(self.buffer, &mut self.cursor)
    }

    /// Reads one fuelFigures entry: fixed fields, then its var-data.
    pub fn next_fuel_figure(&mut self, group: &mut GroupDecoder) -> Result<FuelFigure<'a>> {
        let base = group.next(self.buffer, &mut self.cursor)?;
        let speed = self.buffer.get_u16_le(base);
        let mpg = self.buffer.get_f32_le(base + 2);
        let usage_description = var_data::get_u16_prefixed(self.buffer, &mut self.cursor)?;
        Ok(FuelFigure {
            speed,
            mpg,
            usage_description,
        })
    }

    /// Reads the performanceFigures dimensions header.
    pub fn performance_figures(&mut self) -> Result<GroupDecoder> {
        GroupDecoder::wrap(self.buffer, &mut self.cursor)
    }

    /// Reads one performanceFigures entry's fixed block; follow with
    /// [`CarDecoder::acceleration`] for its nested group.
    pub fn next_performance_figure(&mut self, group: &mut GroupDecoder) -> Result<u8> {
        let base = group.next(self.buffer, &mut self.cursor)?;
        Ok(self.buffer.get_u8(base))
    }

    /// Reads the nested acceleration dimensions header for the current
    /// performanceFigures entry.
    pub fn acceleration(&mut self) -> Result<GroupDecoder> {
        GroupDecoder::wrap(self.buffer, &mut self.cursor)
    }

    /// Reads one acceleration entry as `(mph, seconds)`.
    pub fn next_acceleration(&mut self, group: &mut GroupDecoder) -> Result<(u16, f32)> {
        let base = group.next(self.buffer, &mut self.cursor)?;
        Ok((
            self.buffer.get_u16_le(base),
            self.buffer.get_f32_le(base + 2),
        ))
    }

    pub fn manufacturer(&mut self) -> Result<&'a [u8]> {
        var_data::get_u16_prefixed(self.buffer, &mut self.cursor)
    }

    pub fn model(&mut self) -> Result<&'a [u8]> {
        var_data::get_u16_prefixed(self.buffer, &mut self.cursor)
    }

    pub fn activation_code(&mut self) -> Result<&'a [u8]> {
        var_data::get_u16_prefixed(self.buffer, &mut self.cursor)
    }
}

/// Encodes the canonical Car message (envelope included) into `buffer`,
/// returning the total encoded length.
pub fn encode_car(buffer: &mut [u8]) -> Result<usize> {
    CarEncoder::encode_header(buffer, 0)?;
    let mut car = CarEncoder::wrap_for_encode(buffer, 8)?;

    car.set_serial_number(1234)
        .set_model_year(2013)
        .set_available(BooleanType::T)
        .set_code(Model::A)
        .set_some_numbers(&[0, 1, 2, 3, 4])
        .set_vehicle_code(b"abcdef")
        .set_extras(*OptionalExtras::default().set_cruise_control(true).set_sports_pack(true));
    car.engine()
        .set_capacity(2000)
        .set_num_cylinders(4)
        .set_manufacturer_code(b"123")
        .set_boost_type(BoostType::Nitrous)
        .set_horse_power(200);

    let mut fuel = car.fuel_figures_count(3)?;
    car.add_fuel_figure(&mut fuel, 30, 35.9, b"Urban Cycle")?;
    car.add_fuel_figure(&mut fuel, 55, 49.0, b"Combined Cycle")?;
    car.add_fuel_figure(&mut fuel, 75, 40.0, b"Highway Cycle")?;

    let mut performance = car.performance_figures_count(2)?;
    car.add_performance_figure(&mut performance, 95)?;
    let mut acceleration = car.acceleration_count(3)?;
    car.add_acceleration(&mut acceleration, 30, 4.0)?;
    car.add_acceleration(&mut acceleration, 60, 7.5)?;
    car.add_acceleration(&mut acceleration, 100, 12.2)?;
    car.add_performance_figure(&mut performance, 99)?;
    let mut acceleration = car.acceleration_count(3)?;
    car.add_acceleration(&mut acceleration, 30, 3.8)?;
    car.add_acceleration(&mut acceleration, 60, 7.1)?;
    car.add_acceleration(&mut acceleration, 100, 11.8)?;

    car.put_manufacturer(b"Honda")?;
    car.put_model(b"Civic VTi")?;
    car.put_activation_code(b"deadbeef")?;

    Ok(8 + car.encoded_length())
}

/// Builds the Car schema as an IR collection, mirroring the hand-written
/// codec above token for token.
pub fn car_ir() -> Ir {
    let header = TokenListBuilder::standard_header().unwrap();
    let mut ir = Ir::new("example.car", 6, 0, 0, header).unwrap();

    let mut builder = TokenListBuilder::new();
    builder
        .begin_message("Car", 1, 47)
        .begin_field("serialNumber", 1, 0)
        .encoding("serialNumber", PrimitiveType::Uint64, 0)
        .end_field()
        .begin_field("modelYear", 2, 0)
        .encoding("modelYear", PrimitiveType::Uint16, 8)
        .end_field()
        .begin_field("available", 3, 0)
        .begin_enum("BooleanType", PrimitiveType::Uint8, 10)
        .valid_value("F", PrimitiveValue::Uint(0))
        .valid_value("T", PrimitiveValue::Uint(1))
        .end_enum()
        .end_field()
        .begin_field("code", 4, 0)
        .begin_enum("Model", PrimitiveType::Char, 11)
        .valid_value("A", PrimitiveValue::Bytes(vec![b'A']))
        .valid_value("B", PrimitiveValue::Bytes(vec![b'B']))
        .valid_value("C", PrimitiveValue::Bytes(vec![b'C']))
        .end_enum()
        .end_field()
        .begin_field("someNumbers", 5, 0)
        .encoding_array("someNumbers", PrimitiveType::Int32, 12, 5)
        .end_field()
        .begin_field("vehicleCode", 6, 0)
        .encoding_array("vehicleCode", PrimitiveType::Char, 32, 6)
        .end_field()
        .begin_field("extras", 7, 0)
        .begin_set("OptionalExtras", PrimitiveType::Uint8, 38)
        .choice("sunRoof", 0)
        .choice("sportsPack", 1)
        .choice("cruiseControl", 2)
        .end_set()
        .end_field()
        .begin_field("engine", 8, 0)
        .begin_composite("Engine", 39, 8)
        .encoding("capacity", PrimitiveType::Uint16, 0)
        .encoding("numCylinders", PrimitiveType::Uint8, 2)
        .constant("maxRpm", PrimitiveType::Uint16, PrimitiveValue::Uint(9000))
        .encoding_array("manufacturerCode", PrimitiveType::Char, 3, 3)
        .constant(
            "fuel",
            PrimitiveType::Char,
            PrimitiveValue::Bytes(b"Petrol".to_vec()),
        )
        .begin_composite("booster", 6, 2)
        .encoding("boostType", PrimitiveType::Char, 0)
        .encoding("horsePower", PrimitiveType::Uint8, 1)
        .end_composite()
        .end_composite()
        .end_field()
        .begin_group("fuelFigures", 9, 6)
        .begin_field("speed", 10, 0)
        .encoding("speed", PrimitiveType::Uint16, 0)
        .end_field()
        .begin_field("mpg", 11, 0)
        .encoding("mpg", PrimitiveType::Float, 2)
        .end_field()
        .var_data("usageDescription", 12, PrimitiveType::Uint16)
        .end_group()
        .begin_group("performanceFigures", 13, 1)
        .begin_field("octane", 14, 0)
        .encoding("octane", PrimitiveType::Uint8, 0)
        .end_field()
        .begin_group("acceleration", 15, 6)
        .begin_field("mph", 16, 0)
        .encoding("mph", PrimitiveType::Uint16, 0)
        .end_field()
        .begin_field("seconds", 17, 0)
        .encoding("seconds", PrimitiveType::Float, 2)
        .end_field()
        .end_group()
        .end_group()
        .var_data("manufacturer", 18, PrimitiveType::Uint16)
        .var_data("model", 19, PrimitiveType::Uint16)
        .var_data("activationCode", 20, PrimitiveType::Uint16)
        .end_message();

    ir.add_message(builder.build().unwrap()).unwrap();
    ir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_block_round_trip() {
        let mut buffer = vec![0u8; 256];
        let length = encode_car(&mut buffer).unwrap();
        let car = CarDecoder::decode(&buffer[..length]).unwrap();

        assert_eq!(car.serial_number(), 1234);
        assert_eq!(car.model_year(), 2013);
        assert_eq!(car.available(), BooleanType::T);
        assert_eq!(car.code(), Model::A);
        assert_eq!(car.some_numbers(), [0, 1, 2, 3, 4]);
        assert_eq!(&car.vehicle_code(), b"abcdef");

        let extras = car.extras();
        assert!(extras.cruise_control());
        assert!(extras.sports_pack());
        assert!(!extras.sun_roof());
        assert_eq!(extras.bits(), 0b110);

        let engine = car.engine();
        assert_eq!(engine.capacity(), 2000);
        assert_eq!(engine.num_cylinders(), 4);
        assert_eq!(&engine.manufacturer_code(), b"123");
        assert_eq!(engine.boost_type(), BoostType::Nitrous);
        assert_eq!(engine.horse_power(), 200);
        assert_eq!(EngineDecoder::max_rpm(), 9000);
        assert_eq!(EngineDecoder::fuel(), b"Petrol");
    }

    #[test]
    fn test_enum_unknown_decodes_to_null() {
        assert_eq!(BooleanType::decode(7), BooleanType::NullVal);
        assert_eq!(Model::decode(b'Z'), Model::NullVal);
        assert_eq!(BoostType::decode(0), BoostType::NullVal);
    }

    #[test]
    fn test_schema_constants() {
        assert_eq!(CarEncoder::BLOCK_LENGTH, 47);
        assert_eq!(CarEncoder::TEMPLATE_ID, 1);
        assert_eq!(CarEncoder::SCHEMA_ID, 6);
        assert_eq!(CarEncoder::SCHEMA_VERSION, 0);
        let header = CarEncoder::header();
        assert_eq!({ header.block_length }, 47);
        assert_eq!(CarEncoder::vehicle_code_character_encoding(), "UTF-8");
    }

    #[test]
    fn test_field_ids_match_ir() {
        init_tracing();
        let ir = car_ir();
        let tokens = ir.message(1).unwrap();
        let id_of = |name: &str| {
            tokens
                .iter()
                .find(|t| t.name == name && t.id >= 0)
                .unwrap()
                .id as u16
        };
        assert_eq!(id_of("serialNumber"), CarEncoder::SERIAL_NUMBER_ID);
        assert_eq!(id_of("modelYear"), CarEncoder::MODEL_YEAR_ID);
        assert_eq!(id_of("available"), CarEncoder::AVAILABLE_ID);
        assert_eq!(id_of("code"), CarEncoder::CODE_ID);
        assert_eq!(id_of("someNumbers"), CarEncoder::SOME_NUMBERS_ID);
        assert_eq!(id_of("vehicleCode"), CarEncoder::VEHICLE_CODE_ID);
        assert_eq!(id_of("extras"), CarEncoder::EXTRAS_ID);
        assert_eq!(id_of("engine"), CarEncoder::ENGINE_ID);
        assert_eq!(id_of("fuelFigures"), CarEncoder::FUEL_FIGURES_ID);
        assert_eq!(
            id_of("performanceFigures"),
            CarEncoder::PERFORMANCE_FIGURES_ID
        );
        assert_eq!(id_of("manufacturer"), CarEncoder::MANUFACTURER_ID);
        assert_eq!(id_of("model"), CarEncoder::MODEL_ID);
        assert_eq!(id_of("activationCode"), CarEncoder::ACTIVATION_CODE_ID);
    }

    #[test]
    fn test_car_ir_is_well_formed() {
        init_tracing();
        let ir = car_ir();
        assert_eq!(ir.message_count(), 1);
        let tokens = ir.message(1).unwrap();
        assert_eq!(tokens[0].name, "Car");
        assert_eq!(tokens[0].encoded_length, 47);
        assert_eq!(
            tokens[0].component_token_count as usize,
            tokens.len()
        );
    }
}
