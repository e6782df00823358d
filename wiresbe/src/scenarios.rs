//! End-to-end scenarios over the Car message: round trips, empty and
//! nested groups, envelope-only decoding, schema evolution, buffer
//! bounds, IR transport, and the equivalence of on-the-fly and
//! generated decoding.

use crate::car::{
    BooleanType, BoostType, CarDecoder, CarEncoder, Model, OptionalExtras, car_ir, encode_car,
    init_tracing,
};
use wiresbe_core::buffer::WriteBuffer;
use wiresbe_core::cursor::Cursor;
use wiresbe_core::decoder::SbeDecoder;
use wiresbe_core::encoder::SbeEncoder;
use wiresbe_core::error::Error;
use wiresbe_core::group::GroupEncoder;
use wiresbe_core::header::MessageHeader;
use wiresbe_core::types::null_values;
use wiresbe_core::var_data;
use wiresbe_ir::codec::{IrDecoder, IrEncoder};
use wiresbe_ir::token::Token;
use wiresbe_otf::decoder::OtfDecoder;
use wiresbe_otf::error::OtfError;
use wiresbe_otf::header_decoder::OtfHeaderDecoder;
use wiresbe_otf::listener::TokenListener;

/// Collects every wire-visible element as `(name, bytes)` in callback
/// order, plus group boundary events.
#[derive(Default)]
struct Capture {
    fields: Vec<(String, Vec<u8>)>,
    groups: Vec<String>,
}

impl TokenListener for Capture {
    fn on_encoding(&mut self, field_token: &Token, bytes: &[u8], _type_token: &Token, _acting_version: u64) {
        self.fields.push((field_token.name.clone(), bytes.to_vec()));
    }

    fn on_enum(
        &mut self,
        field_token: &Token,
        bytes: &[u8],
        _tokens: &[Token],
        _from: usize,
        _to: usize,
        _acting_version: u64,
    ) {
        self.fields.push((field_token.name.clone(), bytes.to_vec()));
    }

    fn on_bit_set(
        &mut self,
        field_token: &Token,
        bytes: &[u8],
        _tokens: &[Token],
        _from: usize,
        _to: usize,
        _acting_version: u64,
    ) {
        self.fields.push((field_token.name.clone(), bytes.to_vec()));
    }

    fn on_var_data(&mut self, field_token: &Token, bytes: &[u8], _length: u64, _type_token: &Token) {
        self.fields.push((field_token.name.clone(), bytes.to_vec()));
    }

    fn on_group_header(&mut self, token: &Token, num_in_group: u64) {
        self.groups.push(format!("header {} n={num_in_group}", token.name));
    }

    fn on_begin_group(&mut self, token: &Token, group_index: u64, num_in_group: u64) {
        self.groups
            .push(format!("begin {} {group_index}/{num_in_group}", token.name));
    }

    fn on_end_group(&mut self, token: &Token, group_index: u64, num_in_group: u64) {
        self.groups
            .push(format!("end {} {group_index}/{num_in_group}", token.name));
    }
}

impl Capture {
    fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    fn field_count(&self, name: &str) -> usize {
        self.fields.iter().filter(|(n, _)| n == name).count()
    }
}

/// S1: canonical Car round trip, 199 bytes total.
#[test]
fn test_s1_car_round_trip() {
    let mut buffer = vec![0u8; 256];
    let length = encode_car(&mut buffer).unwrap();
    assert_eq!(length, 199, "8 envelope + 191 message");

    let header = MessageHeader::read(&buffer, 0).unwrap();
    assert_eq!(header, MessageHeader::new(47, 1, 6, 0));

    let mut car = CarDecoder::decode(&buffer[..length]).unwrap();
    assert_eq!(car.serial_number(), 1234);
    assert_eq!(car.model_year(), 2013);
    assert_eq!(car.available(), BooleanType::T);
    assert_eq!(car.code(), Model::A);
    assert_eq!(car.some_numbers(), [0, 1, 2, 3, 4]);
    assert_eq!(&car.vehicle_code(), b"abcdef");
    assert_eq!(car.extras().bits(), 0b110);
    assert_eq!(car.engine().capacity(), 2000);

    let mut fuel = car.fuel_figures().unwrap();
    assert_eq!(fuel.count(), 3);
    let expected_fuel: [(u16, f32, &[u8]); 3] = [
        (30, 35.9, b"Urban Cycle"),
        (55, 49.0, b"Combined Cycle"),
        (75, 40.0, b"Highway Cycle"),
    ];
    for (speed, mpg, usage) in expected_fuel {
        let figure = car.next_fuel_figure(&mut fuel).unwrap();
        assert_eq!(figure.speed, speed);
        assert_eq!(figure.mpg, mpg);
        assert_eq!(figure.usage_description, usage);
    }

    let mut performance = car.performance_figures().unwrap();
    assert_eq!(performance.count(), 2);
    let expected_acceleration: [[(u16, f32); 3]; 2] = [
        [(30, 4.0), (60, 7.5), (100, 12.2)],
        [(30, 3.8), (60, 7.1), (100, 11.8)],
    ];
    for (octane, runs) in [(95u8, expected_acceleration[0]), (99, expected_acceleration[1])] {
        assert_eq!(car.next_performance_figure(&mut performance).unwrap(), octane);
        let mut acceleration = car.acceleration().unwrap();
        assert_eq!(acceleration.count(), 3);
        for (mph, seconds) in runs {
            assert_eq!(
                car.next_acceleration(&mut acceleration).unwrap(),
                (mph, seconds)
            );
        }
    }

    assert_eq!(car.manufacturer().unwrap(), b"Honda");
    assert_eq!(car.model().unwrap(), b"Civic VTi");
    assert_eq!(car.activation_code().unwrap(), b"deadbeef");
    assert_eq!(car.encoded_length(), 191);
}

/// S2: an empty group writes only its dimensions header and advances
/// the cursor by its size.
#[test]
fn test_s2_empty_group_encode() {
    let mut buffer = vec![0u8; 128];
    CarEncoder::encode_header(&mut buffer, 0).unwrap();
    let mut car = CarEncoder::wrap_for_encode(&mut buffer, 8).unwrap();
    car.set_serial_number(9).set_model_year(2020);
    let before = car.encoded_length();
    let fuel = car.fuel_figures_count(0).unwrap();
    assert_eq!(car.encoded_length(), before + 4, "dimensions header only");
    assert!(!fuel.has_next());
    assert_eq!(fuel.count(), 0);
}

/// S2 continued on the decode side, including the OTF callback shape.
#[test]
fn test_s2_empty_group_decode() {
    init_tracing();
    let mut buffer = vec![0u8; 128];
    CarEncoder::encode_header(&mut buffer, 0).unwrap();
    let mut car = CarEncoder::wrap_for_encode(&mut buffer, 8).unwrap();
    car.set_serial_number(9).set_model_year(2020);
    let mut fuel = car.fuel_figures_count(0).unwrap();
    assert!(car.add_fuel_figure(&mut fuel, 1, 1.0, b"x").is_err());
    car.performance_figures_count(0).unwrap();
    car.put_manufacturer(b"").unwrap();
    car.put_model(b"").unwrap();
    car.put_activation_code(b"").unwrap();
    let length = 8 + car.encoded_length();

    let mut decoded = CarDecoder::decode(&buffer[..length]).unwrap();
    let mut group = decoded.fuel_figures().unwrap();
    assert_eq!(group.count(), 0);
    assert!(decoded.next_fuel_figure(&mut group).is_err());
    let mut performance = decoded.performance_figures().unwrap();
    assert_eq!(performance.count(), 0);
    assert_eq!(decoded.manufacturer().unwrap(), b"");

    let ir = car_ir();
    let otf = OtfDecoder::new(&ir).unwrap();
    let mut capture = Capture::default();
    let consumed = otf.decode(&buffer[..length], &mut capture).unwrap();
    assert_eq!(consumed, length);
    assert!(capture.groups.contains(&"header fuelFigures n=0".to_string()));
    assert!(!capture.groups.iter().any(|e| e.starts_with("begin fuelFigures")));
}

/// S3: three outer entries each holding two nested entries; every
/// boundary reports `(group_index, num_in_group)`.
#[test]
fn test_s3_nested_groups() {
    init_tracing();
    let mut buffer = vec![0u8; 256];
    CarEncoder::encode_header(&mut buffer, 0).unwrap();
    let mut car = CarEncoder::wrap_for_encode(&mut buffer, 8).unwrap();
    car.set_serial_number(77);
    car.fuel_figures_count(0).unwrap();
    let mut performance = car.performance_figures_count(3).unwrap();
    for outer in 0..3u8 {
        car.add_performance_figure(&mut performance, 90 + outer).unwrap();
        let mut acceleration = car.acceleration_count(2).unwrap();
        for inner in 0..2u16 {
            car.add_acceleration(&mut acceleration, 30 * (inner + 1), outer as f32 + inner as f32)
                .unwrap();
        }
    }
    car.put_manufacturer(b"").unwrap();
    car.put_model(b"").unwrap();
    car.put_activation_code(b"").unwrap();
    let length = 8 + car.encoded_length();

    // Generated-style decode sees 3 x 2 entries with the right values.
    let mut decoded = CarDecoder::decode(&buffer[..length]).unwrap();
    decoded.fuel_figures().unwrap();
    let mut outer_group = decoded.performance_figures().unwrap();
    assert_eq!(outer_group.count(), 3);
    let mut inner_total = 0;
    for outer in 0..3u8 {
        assert_eq!(
            decoded.next_performance_figure(&mut outer_group).unwrap(),
            90 + outer
        );
        let mut acceleration = decoded.acceleration().unwrap();
        assert_eq!(acceleration.count(), 2);
        while acceleration.has_next() {
            decoded.next_acceleration(&mut acceleration).unwrap();
            inner_total += 1;
        }
    }
    assert_eq!(inner_total, 6);

    // The OTF walk reports every boundary in order.
    let ir = car_ir();
    let otf = OtfDecoder::new(&ir).unwrap();
    let mut capture = Capture::default();
    otf.decode(&buffer[..length], &mut capture).unwrap();
    assert_eq!(capture.field_count("octane"), 3);
    assert_eq!(capture.field_count("mph"), 6);
    for outer in 0..3 {
        assert!(capture
            .groups
            .contains(&format!("begin performanceFigures {outer}/3")));
        assert!(capture
            .groups
            .contains(&format!("end performanceFigures {outer}/3")));
        for inner in 0..2 {
            assert!(capture.groups.contains(&format!("begin acceleration {inner}/2")));
        }
    }
}

/// S4: OTF envelope decode of a large buffer holding the canonical
/// message.
#[test]
fn test_s4_otf_header_decode() {
    init_tracing();
    let mut buffer = vec![0u8; 2048];
    encode_car(&mut buffer).unwrap();

    let ir = car_ir();
    let header = OtfHeaderDecoder::new(ir.header_tokens()).unwrap();
    assert_eq!(header.template_id(&buffer).unwrap(), 1);
    assert_eq!(header.block_length(&buffer).unwrap(), 47);
    assert_eq!(header.schema_id(&buffer).unwrap(), 6);
    assert_eq!(header.encoded_length(), 8);
}

/// Writes the group and var-data regions shared by S1 and S5.
fn encode_car_tail(buffer: &mut [u8], cursor: &mut Cursor) {
    let mut fuel = GroupEncoder::wrap(buffer, cursor, 6, 3).unwrap();
    let figures: [(u16, f32, &[u8]); 3] = [
        (30, 35.9, b"Urban Cycle"),
        (55, 49.0, b"Combined Cycle"),
        (75, 40.0, b"Highway Cycle"),
    ];
    for (speed, mpg, usage) in figures {
        let base = fuel.next(buffer, cursor).unwrap();
        buffer.put_u16_le(base, speed);
        buffer.put_f32_le(base + 2, mpg);
        var_data::put_u16_prefixed(buffer, cursor, usage).unwrap();
    }

    let mut performance = GroupEncoder::wrap(buffer, cursor, 1, 2).unwrap();
    let runs: [(u8, [(u16, f32); 3]); 2] = [
        (95, [(30, 4.0), (60, 7.5), (100, 12.2)]),
        (99, [(30, 3.8), (60, 7.1), (100, 11.8)]),
    ];
    for (octane, accelerations) in runs {
        let base = performance.next(buffer, cursor).unwrap();
        buffer.put_u8(base, octane);
        let mut acceleration = GroupEncoder::wrap(buffer, cursor, 6, 3).unwrap();
        for (mph, seconds) in accelerations {
            let entry = acceleration.next(buffer, cursor).unwrap();
            buffer.put_u16_le(entry, mph);
            buffer.put_f32_le(entry + 2, seconds);
        }
    }

    var_data::put_u16_prefixed(buffer, cursor, b"Honda").unwrap();
    var_data::put_u16_prefixed(buffer, cursor, b"Civic VTi").unwrap();
    var_data::put_u16_prefixed(buffer, cursor, b"deadbeef").unwrap();
}

/// S5: a buffer written by an older schema revision with a 30-byte
/// fixed block. Truncated fields read their null sentinels; groups and
/// var-data still decode because their positions follow the acting
/// block length from the envelope.
#[test]
fn test_s5_schema_evolution_truncated_block() {
    init_tracing();
    let mut buffer = vec![0u8; 256];
    MessageHeader::new(30, 1, 6, 0).encode(&mut buffer, 0);
    buffer.put_u64_le(8, 1234);
    buffer.put_u16_le(16, 2013);
    buffer.put_u8(18, BooleanType::T.encode());
    buffer.put_u8(19, Model::A.encode());
    // The older block carried a shorter someNumbers array; its trailing
    // two bytes are padding.
    for index in 0..4 {
        buffer.put_i32_le(20 + index * 4, index as i32);
    }
    let mut cursor = Cursor::new(8 + 30);
    encode_car_tail(&mut buffer, &mut cursor);
    let length = cursor.position();

    let mut car = CarDecoder::decode(&buffer[..length]).unwrap();
    // Fields within the acting block decode normally.
    assert_eq!(car.serial_number(), 1234);
    assert_eq!(car.model_year(), 2013);
    assert_eq!(car.available(), BooleanType::T);
    assert_eq!(car.code(), Model::A);
    // Fields past the acting block read as null sentinels.
    assert_eq!(car.some_numbers(), [null_values::INT32_NULL; 5]);
    assert_eq!(car.vehicle_code(), [0u8; 6]);
    assert_eq!(car.extras(), OptionalExtras::default());
    assert_eq!(car.engine().capacity(), null_values::UINT16_NULL);
    assert_eq!(car.engine().boost_type(), BoostType::NullVal);
    // The variable region still lines up.
    let mut fuel = car.fuel_figures().unwrap();
    assert_eq!(fuel.count(), 3);
    let first = car.next_fuel_figure(&mut fuel).unwrap();
    assert_eq!((first.speed, first.usage_description), (30, &b"Urban Cycle"[..]));
    car.next_fuel_figure(&mut fuel).unwrap();
    car.next_fuel_figure(&mut fuel).unwrap();
    let mut performance = car.performance_figures().unwrap();
    while performance.has_next() {
        car.next_performance_figure(&mut performance).unwrap();
        let mut acceleration = car.acceleration().unwrap();
        while acceleration.has_next() {
            car.next_acceleration(&mut acceleration).unwrap();
        }
    }
    assert_eq!(car.manufacturer().unwrap(), b"Honda");
    assert_eq!(car.model().unwrap(), b"Civic VTi");
    assert_eq!(car.activation_code().unwrap(), b"deadbeef");

    // The OTF walk skips exactly the truncated fields.
    let ir = car_ir();
    let otf = OtfDecoder::new(&ir).unwrap();
    let mut capture = Capture::default();
    let consumed = otf.decode(&buffer[..length], &mut capture).unwrap();
    assert_eq!(consumed, length);
    assert!(capture.has_field("serialNumber"));
    assert!(capture.has_field("modelYear"));
    assert!(!capture.has_field("someNumbers"));
    assert!(!capture.has_field("vehicleCode"));
    assert!(!capture.has_field("extras"));
    assert!(!capture.has_field("capacity"));
    assert_eq!(capture.field_count("speed"), 3);
    assert!(capture.has_field("manufacturer"));
}

/// A writer with a longer fixed block than the reader's schema: the
/// extra trailing bytes are skipped via the acting block length and
/// every known field decodes identically.
#[test]
fn test_p7_extra_block_bytes_skipped() {
    init_tracing();
    let mut buffer = vec![0u8; 256];
    MessageHeader::new(51, 1, 6, 0).encode(&mut buffer, 0);
    // The 47 bytes this reader knows, laid out exactly as in S1.
    buffer.put_u64_le(8, 1234);
    buffer.put_u16_le(16, 2013);
    buffer.put_u8(18, BooleanType::T.encode());
    buffer.put_u8(19, Model::A.encode());
    for index in 0..5 {
        buffer.put_i32_le(20 + index * 4, index as i32);
    }
    buffer.put_bytes(40, b"abcdef");
    buffer.put_u8(46, 0b110);
    buffer.put_u16_le(47, 2000);
    buffer.put_u8(49, 4);
    buffer.put_bytes(50, b"123");
    buffer.put_u8(53, b'N');
    buffer.put_u8(54, 200);
    // Four trailing bytes added by the newer writer's schema.
    buffer.put_bytes(55, &[0xEE; 4]);
    let mut cursor = Cursor::new(8 + 51);
    encode_car_tail(&mut buffer, &mut cursor);
    let length = cursor.position();

    let mut car = CarDecoder::decode(&buffer[..length]).unwrap();
    assert_eq!(car.serial_number(), 1234);
    assert_eq!(car.model_year(), 2013);
    assert_eq!(car.some_numbers(), [0, 1, 2, 3, 4]);
    assert_eq!(&car.vehicle_code(), b"abcdef");
    assert_eq!(car.extras().bits(), 0b110);
    assert_eq!(car.engine().capacity(), 2000);
    assert_eq!(car.engine().boost_type(), BoostType::Nitrous);
    let mut fuel = car.fuel_figures().unwrap();
    assert_eq!(fuel.count(), 3);
    let first = car.next_fuel_figure(&mut fuel).unwrap();
    assert_eq!(first.usage_description, b"Urban Cycle");

    let ir = car_ir();
    let otf = OtfDecoder::new(&ir).unwrap();
    let mut capture = Capture::default();
    let consumed = otf.decode(&buffer[..length], &mut capture).unwrap();
    assert_eq!(consumed, length);
    assert!(capture.has_field("someNumbers"));
    assert!(capture.has_field("capacity"));
    assert_eq!(capture.field_count("speed"), 3);
}

/// S6: one byte short fails the encode; an envelope-only buffer decodes
/// its header but nothing after it.
#[test]
fn test_s6_buffer_bounds() {
    let mut exact = vec![0u8; 199];
    assert_eq!(encode_car(&mut exact).unwrap(), 199);

    let mut short = vec![0u8; 198];
    assert!(matches!(
        encode_car(&mut short),
        Err(Error::BufferTooShort {
            required: 199,
            available: 198,
        })
    ));

    let envelope_only = &exact[..8];
    let header = MessageHeader::read(envelope_only, 0).unwrap();
    assert_eq!({ header.block_length }, 47);
    assert!(matches!(
        CarDecoder::decode(envelope_only),
        Err(Error::BufferTooShort { .. })
    ));
}

/// P9: the Car schema survives the IR codec byte-for-byte.
#[test]
fn test_p9_ir_round_trip() {
    init_tracing();
    let ir = car_ir();
    let bytes = IrEncoder::encode(&ir).unwrap();
    let decoded = IrDecoder::decode(&bytes).unwrap();
    assert_eq!(decoded, ir);

    // And again through the file form.
    let path = std::env::temp_dir().join("wiresbe-car-schema.sbeir");
    IrEncoder::write_file(&ir, &path).unwrap();
    let from_file = IrDecoder::read_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(from_file, ir);
}

/// P10: the OTF decoder's `(field, bytes)` stream equals what the
/// generated decoder reads in declaration order.
#[test]
fn test_p10_otf_equals_generated() {
    init_tracing();
    let mut buffer = vec![0u8; 256];
    let length = encode_car(&mut buffer).unwrap();

    let ir = car_ir();
    let otf = OtfDecoder::new(&ir).unwrap();
    let mut capture = Capture::default();
    let consumed = otf.decode(&buffer[..length], &mut capture).unwrap();
    assert_eq!(consumed, length);

    let mut expected: Vec<(String, Vec<u8>)> = Vec::new();
    let push = |expected: &mut Vec<(String, Vec<u8>)>, name: &str, bytes: Vec<u8>| {
        expected.push((name.to_string(), bytes));
    };

    let mut car = CarDecoder::decode(&buffer[..length]).unwrap();
    push(&mut expected, "serialNumber", car.serial_number().to_le_bytes().to_vec());
    push(&mut expected, "modelYear", car.model_year().to_le_bytes().to_vec());
    push(&mut expected, "available", vec![car.available().encode()]);
    push(&mut expected, "code", vec![car.code().encode()]);
    let mut numbers = Vec::new();
    for value in car.some_numbers() {
        numbers.extend_from_slice(&value.to_le_bytes());
    }
    push(&mut expected, "someNumbers", numbers);
    push(&mut expected, "vehicleCode", car.vehicle_code().to_vec());
    push(&mut expected, "extras", vec![car.extras().bits()]);
    let engine = car.engine();
    push(&mut expected, "capacity", engine.capacity().to_le_bytes().to_vec());
    push(&mut expected, "numCylinders", vec![engine.num_cylinders()]);
    push(&mut expected, "maxRpm", Vec::new()); // constant, no wire bytes
    push(&mut expected, "manufacturerCode", engine.manufacturer_code().to_vec());
    push(&mut expected, "fuel", Vec::new()); // constant, no wire bytes
    push(&mut expected, "boostType", vec![engine.boost_type().encode()]);
    push(&mut expected, "horsePower", vec![engine.horse_power()]);

    let mut fuel = car.fuel_figures().unwrap();
    while fuel.has_next() {
        let figure = car.next_fuel_figure(&mut fuel).unwrap();
        push(&mut expected, "speed", figure.speed.to_le_bytes().to_vec());
        push(&mut expected, "mpg", figure.mpg.to_le_bytes().to_vec());
        push(&mut expected, "usageDescription", figure.usage_description.to_vec());
    }
    let mut performance = car.performance_figures().unwrap();
    while performance.has_next() {
        let octane = car.next_performance_figure(&mut performance).unwrap();
        push(&mut expected, "octane", vec![octane]);
        let mut acceleration = car.acceleration().unwrap();
        while acceleration.has_next() {
            let (mph, seconds) = car.next_acceleration(&mut acceleration).unwrap();
            push(&mut expected, "mph", mph.to_le_bytes().to_vec());
            push(&mut expected, "seconds", seconds.to_le_bytes().to_vec());
        }
    }
    push(&mut expected, "manufacturer", car.manufacturer().unwrap().to_vec());
    push(&mut expected, "model", car.model().unwrap().to_vec());
    push(&mut expected, "activationCode", car.activation_code().unwrap().to_vec());

    assert_eq!(capture.fields, expected);
}

/// Unknown template ids surface through the OTF error path.
#[test]
fn test_template_not_found() {
    init_tracing();
    let ir = car_ir();
    let otf = OtfDecoder::new(&ir).unwrap();

    let mut buffer = vec![0u8; 64];
    MessageHeader::new(47, 9, 6, 0).encode(&mut buffer, 0);
    let mut capture = Capture::default();
    assert!(matches!(
        otf.decode(&buffer, &mut capture),
        Err(OtfError::TemplateNotFound {
            template_id: 9,
            ..
        })
    ));
}
