use dptcraft::{DecodeError, DptId, EncodeError, FieldKind, FieldOp, FloatEncoding, Struct, Value};
use dptcraft_knx::{
    ACTIVE_POWER, COLOUR_RGB, COLOUR_RGBW, DATE, DATE_TIME, DIMMING_CONTROL, SCENE_CONTROL,
    STRING_ASCII, SWITCH, TEMPERATURE, TIME_OF_DAY, decode, encode, registry,
};
use proptest::prelude::*;

#[test]
fn test_temperature_worked_examples() {
    assert_eq!(decode(TEMPERATURE, &[0x00, 0x00]).unwrap(), Value::F16(0.0));
    assert_eq!(decode(TEMPERATURE, &[0x07, 0xD0]).unwrap(), Value::F16(20.0));
    assert_eq!(encode(TEMPERATURE, &Value::F16(20.0)).unwrap(), vec![0x07, 0xD0]);
    assert_eq!(encode(TEMPERATURE, &Value::F16(-5.0)).unwrap(), vec![0x86, 0x0C]);
}

#[test]
fn test_switch_ignores_reserved_bits() {
    assert_eq!(decode(SWITCH, &[0x01]).unwrap(), Value::Bool(true));
    assert_eq!(decode(SWITCH, &[0x00]).unwrap(), Value::Bool(false));
    assert_eq!(encode(SWITCH, &Value::Bool(true)).unwrap(), vec![0x01]);

    let noisy = decode(SWITCH, &[0xF1]).unwrap();
    assert_eq!(noisy, Value::Bool(true));
    assert_eq!(encode(SWITCH, &noisy).unwrap(), vec![0x01]);
}

#[test]
fn test_rgb_struct_order() {
    let value = decode(COLOUR_RGB, &[0xFF, 0x80, 0x00]).unwrap();
    let fields = value.as_struct().unwrap();
    assert_eq!(fields.names().collect::<Vec<_>>(), vec!["red", "green", "blue"]);
    assert_eq!(fields.get("green"), Some(&Value::U8(128)));
    assert_eq!(encode(COLOUR_RGB, &value).unwrap(), vec![0xFF, 0x80, 0x00]);
}

#[test]
fn test_rgbw_validity_mask() {
    let value = decode(COLOUR_RGBW, &[10, 20, 30, 40, 0xFF, 0xF5]).unwrap();
    assert_eq!(
        value,
        Value::Struct(
            Struct::new()
                .with("red", 10u8)
                .with("green", 20u8)
                .with("blue", 30u8)
                .with("white", 40u8)
                .with("red_valid", false)
                .with("green_valid", true)
                .with("blue_valid", false)
                .with("white_valid", true)
        )
    );
    assert_eq!(encode(COLOUR_RGBW, &value).unwrap(), vec![10, 20, 30, 40, 0x00, 0x05]);
}

#[test]
fn test_unknown_tag() {
    let tag = DptId::new(999, 999);
    assert_eq!(decode(tag, &[0x00]), Err(DecodeError::UnknownTag(tag)));
    assert_eq!(encode(tag, &Value::Bool(true)), Err(EncodeError::UnknownTag(tag)));
}

#[test]
fn test_short_buffer() {
    assert_eq!(
        decode(TEMPERATURE, &[0x07]),
        Err(DecodeError::BufferUnderrun {
            tag: TEMPERATURE,
            field: "value".to_string(),
            needed: 16,
            available: 8,
        })
    );
    assert!(matches!(
        decode(COLOUR_RGB, &[]),
        Err(DecodeError::BufferUnderrun { ref field, .. }) if field == "red"
    ));
}

#[test]
fn test_dimming_control() {
    assert_eq!(
        decode(DIMMING_CONTROL, &[0x0B]).unwrap(),
        Value::Struct(Struct::new().with("control", true).with("step_code", 3u8))
    );
}

#[test]
fn test_scene_control() {
    let value = Value::Struct(Struct::new().with("control", true).with("scene_number", 5u8));
    assert_eq!(encode(SCENE_CONTROL, &value).unwrap(), vec![0x85]);
    assert_eq!(decode(SCENE_CONTROL, &[0xC5]).unwrap(), value);
}

#[test]
fn test_scene_number_out_of_range() {
    let err = encode(DptId::new(17, 1), &Value::U8(64)).unwrap_err();
    assert!(matches!(err, EncodeError::ValueOutOfRange { ref field, .. } if field == "value"));
}

#[test]
fn test_time_of_day() {
    // Tuesday 13:37:05
    let bytes = [(2 << 5) | 13, 37, 5];
    let value = decode(TIME_OF_DAY, &bytes).unwrap();
    assert_eq!(
        value,
        Value::Struct(
            Struct::new()
                .with("day", 2u8)
                .with("time", 13u32 * 3600 + 37 * 60 + 5)
        )
    );
    assert_eq!(encode(TIME_OF_DAY, &value).unwrap(), bytes.to_vec());
}

#[test]
fn test_date() {
    assert_eq!(decode(DATE, &[29, 2, 24]).unwrap(), Value::I32(19_782));
    assert_eq!(decode(DATE, &[31, 12, 99]).unwrap(), Value::I32(10_956));
    assert_eq!(encode(DATE, &Value::I32(10_957)).unwrap(), vec![1, 1, 0]);
    assert!(matches!(
        encode(DATE, &Value::I32(0)),
        Err(EncodeError::ValueOutOfRange { .. })
    ));
    assert!(matches!(
        encode(DATE, &Value::I64(0)),
        Err(EncodeError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_date_time() {
    // 2024-03-15, Friday 08:30:00, working day, summer time, synchronised clock
    let bytes = [124, 3, 15, (5 << 5) | 8, 30, 0, 0b0100_0001, 0b1000_0000];
    let value = decode(DATE_TIME, &bytes).unwrap();
    let fields = value.as_struct().unwrap();
    assert_eq!(fields.get("year"), Some(&Value::U8(124)));
    assert_eq!(fields.get("day_of_week"), Some(&Value::U8(5)));
    assert_eq!(fields.get("hour"), Some(&Value::U8(8)));
    assert_eq!(fields.get("working_day"), Some(&Value::Bool(true)));
    assert_eq!(fields.get("summer_time"), Some(&Value::Bool(true)));
    assert_eq!(fields.get("fault"), Some(&Value::Bool(false)));
    assert_eq!(fields.get("clock_quality"), Some(&Value::Bool(true)));
    assert_eq!(encode(DATE_TIME, &value).unwrap(), bytes.to_vec());
}

#[test]
fn test_ieee_power() {
    let bytes = [0x40, 0x49, 0x0F, 0xDB];
    let value = decode(ACTIVE_POWER, &bytes).unwrap();
    assert_eq!(value, Value::F32(std::f32::consts::PI));
    assert_eq!(encode(ACTIVE_POWER, &value).unwrap(), bytes.to_vec());
}

#[test]
fn test_ieee_nan_payload_survives() {
    let bytes = [0x7F, 0xC0, 0x12, 0x34];
    let value = decode(ACTIVE_POWER, &bytes).unwrap();
    assert!(value.as_f64().is_some_and(f64::is_nan));
    assert_ne!(value, value.clone());

    let encoded = encode(ACTIVE_POWER, &value).unwrap();
    assert_eq!(encoded, bytes.to_vec());
    assert!(same_value(&decode(ACTIVE_POWER, &encoded).unwrap(), &value));
}

#[test]
fn test_signed_64() {
    let tag = DptId::new(29, 10);
    let bytes = (-1_234_567_890_123i64).to_be_bytes();
    assert_eq!(decode(tag, &bytes).unwrap(), Value::I64(-1_234_567_890_123));
    assert_eq!(
        encode(tag, &Value::I64(-1_234_567_890_123)).unwrap(),
        bytes.to_vec()
    );
}

#[test]
fn test_string() {
    let bytes = encode(STRING_ASCII, &Value::from("KNX is OK")).unwrap();
    assert_eq!(bytes, b"KNX is OK\0\0\0\0\0".to_vec());
    assert_eq!(decode(STRING_ASCII, &bytes).unwrap(), Value::from("KNX is OK"));

    assert!(matches!(
        encode(STRING_ASCII, &Value::from("10 €")),
        Err(EncodeError::ValueOutOfRange { .. })
    ));
    assert!(matches!(
        encode(STRING_ASCII, &Value::from("fifteen chars!!")),
        Err(EncodeError::ValueOutOfRange { .. })
    ));

    let latin1 = DptId::new(16, 1);
    let bytes = encode(latin1, &Value::from("Grüße")).unwrap();
    assert_eq!(&bytes[..5], &[b'G', b'r', 0xFC, 0xDF, b'e']);
    assert_eq!(decode(latin1, &bytes).unwrap(), Value::from("Grüße"));
}

#[test]
fn test_ascii_high_bytes_round_trip() {
    let mut bytes = b"A\xE9".to_vec();
    bytes.resize(14, 0);
    let value = decode(STRING_ASCII, &bytes).unwrap();
    assert_eq!(value, Value::from("Aé"));
    assert_eq!(encode(STRING_ASCII, &value).unwrap(), bytes);

    let char_ascii = DptId::new(4, 1);
    let value = decode(char_ascii, &[0x80]).unwrap();
    assert_eq!(value, Value::from("\u{80}"));
    assert_eq!(encode(char_ascii, &value).unwrap(), vec![0x80]);
}

#[test]
fn test_knx_float_all_patterns() {
    for raw in 0..=u16::MAX {
        let value = decode(TEMPERATURE, &raw.to_be_bytes()).unwrap();

        let exponent = (raw >> 11) & 0x0F;
        let mut mantissa = (((raw >> 4) & 0x800) | (raw & 0x7FF)) as i32;
        if mantissa & 0x800 != 0 {
            mantissa -= 0x1000;
        }
        let expected = (mantissa as f64 * f64::from(1u32 << exponent) / 100.0) as f32;
        assert_eq!(value, Value::F16(expected), "pattern {raw:#06x}");

        let bytes = encode(TEMPERATURE, &value).unwrap();
        let reencoded = u16::from_be_bytes([bytes[0], bytes[1]]);
        assert!(
            (reencoded >> 11) & 0x0F <= exponent,
            "pattern {raw:#06x} re-encoded as {reencoded:#06x}"
        );
        assert_eq!(decode(TEMPERATURE, &bytes).unwrap(), value, "pattern {raw:#06x}");
    }
}

#[test]
fn test_knx_float_limits() {
    assert_eq!(decode(TEMPERATURE, &[0x7F, 0xFF]).unwrap(), Value::F16(670_760.96));
    assert_eq!(decode(TEMPERATURE, &[0xF8, 0x00]).unwrap(), Value::F16(-671_088.64));
    for value in [700_000.0, -700_000.0, f32::NAN, f32::INFINITY] {
        assert!(matches!(
            encode(TEMPERATURE, &Value::F16(value)),
            Err(EncodeError::ValueOutOfRange { .. })
        ));
    }
}

/// Tags whose programs contain only value and reserved fields.
fn plain_tags() -> Vec<DptId> {
    registry()
        .datapoints()
        .filter(|dp| {
            dp.program
                .ops()
                .iter()
                .all(|op| !matches!(op, FieldOp::Computed(_)))
        })
        .map(|dp| dp.id)
        .collect()
}

fn payload() -> impl Strategy<Value = (DptId, Vec<u8>)> {
    prop::sample::select(plain_tags()).prop_flat_map(|tag| {
        let len = registry().program(tag).map_or(0, |p| p.byte_len());
        (Just(tag), prop::collection::vec(any::<u8>(), len))
    })
}

fn has_kind(tag: DptId, pred: impl Fn(&FieldKind) -> bool) -> bool {
    registry().program(tag).is_some_and(|program| {
        program
            .ops()
            .iter()
            .any(|op| matches!(op, FieldOp::Value(field) if pred(&field.kind)))
    })
}

/// Equality that compares floats by bit pattern, so NaN payloads match themselves.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F32(x), Value::F32(y)) => x.to_bits() == y.to_bits(),
        (Value::F64(x), Value::F64(y)) => x.to_bits() == y.to_bits(),
        (Value::Struct(x), Value::Struct(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|((n, v), (m, w))| n == m && same_value(v, w))
        }
        _ => a == b,
    }
}

/// `bytes` with every reserved bit of `tag`'s program cleared.
fn clear_reserved(tag: DptId, bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    let mut pos = 0;
    for op in registry().program(tag).unwrap().ops() {
        if let FieldOp::Reserved { bits } = op {
            for bit in pos..pos + bits {
                out[bit / 8] &= !(0x80 >> (bit % 8));
            }
        }
        pos += op.bits();
    }
    out
}

proptest! {
    #[test]
    fn catalog_round_trip((tag, bytes) in payload()) {
        let value = decode(tag, &bytes).unwrap();
        let encoded = encode(tag, &value).unwrap();

        // KNX floats normalise to the smallest exponent
        if !has_kind(tag, |kind| *kind == FieldKind::Float(FloatEncoding::Knx16)) {
            prop_assert_eq!(&encoded, &clear_reserved(tag, &bytes));
        }

        let redecoded = decode(tag, &encoded).unwrap();
        prop_assert!(same_value(&redecoded, &value), "{redecoded:?} != {value:?}");

        let again = encode(tag, &redecoded).unwrap();
        prop_assert_eq!(again, encoded);
    }
}
