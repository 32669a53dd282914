use dptcraft::{
    DptId, FieldKind, FieldOp, FloatEncoding, Fold, Program, SubField, Value, YearBase,
};
use proptest::prelude::*;

const TAG: DptId = DptId::new(999, 1);

fn mask(bits: usize) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

fn encode(program: &Program, value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    program.encode_into(TAG, value, &mut out).unwrap();
    out
}

fn packed_program(widths: &[usize], kind: FieldKind) -> Program {
    let ops: Vec<FieldOp> = widths
        .iter()
        .enumerate()
        .map(|(i, &bits)| FieldOp::value(format!("f{i}"), bits, kind))
        .collect();
    Program::compile(&ops, true).unwrap()
}

fn knx_float() -> Program {
    Program::compile(
        &[FieldOp::value("value", 16, FieldKind::Float(FloatEncoding::Knx16))],
        false,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn unsigned_fields_round_trip(
        fields in prop::collection::vec((1usize..=64, any::<u64>()), 1..8)
    ) {
        let widths: Vec<usize> = fields.iter().map(|(bits, _)| *bits).collect();
        let program = packed_program(&widths, FieldKind::Unsigned);

        let value: Value = Value::Struct(
            fields
                .iter()
                .enumerate()
                .map(|(i, (bits, raw))| {
                    let raw = raw & mask(*bits);
                    let value = match *bits {
                        1..=8 => Value::U8(raw as u8),
                        9..=16 => Value::U16(raw as u16),
                        17..=32 => Value::U32(raw as u32),
                        _ => Value::U64(raw),
                    };
                    (format!("f{i}"), value)
                })
                .collect(),
        );

        let bytes = encode(&program, &value);
        prop_assert_eq!(bytes.len(), program.byte_len());
        prop_assert_eq!(program.decode(TAG, &bytes).unwrap(), value);
    }

    #[test]
    fn signed_fields_round_trip(
        fields in prop::collection::vec((1usize..=64, any::<i64>()), 1..8)
    ) {
        let widths: Vec<usize> = fields.iter().map(|(bits, _)| *bits).collect();
        let program = packed_program(&widths, FieldKind::Signed);

        let value: Value = Value::Struct(
            fields
                .iter()
                .enumerate()
                .map(|(i, (bits, raw))| {
                    // shift into range of the field
                    let raw = if *bits >= 64 { *raw } else { (raw << (64 - bits)) >> (64 - bits) };
                    let value = match *bits {
                        1..=8 => Value::I8(raw as i8),
                        9..=16 => Value::I16(raw as i16),
                        17..=32 => Value::I32(raw as i32),
                        _ => Value::I64(raw),
                    };
                    (format!("f{i}"), value)
                })
                .collect(),
        );

        let bytes = encode(&program, &value);
        prop_assert_eq!(program.decode(TAG, &bytes).unwrap(), value);
    }

    #[test]
    fn byte_aligned_bytes_survive_decode_encode(bytes in prop::collection::vec(any::<u8>(), 7)) {
        // 3 + 13 + 1 + 7 + 32 = 56 bits, no reserved bits
        let program = packed_program(&[3, 13, 1, 7, 32], FieldKind::Unsigned);
        let value = program.decode(TAG, &bytes).unwrap();
        prop_assert_eq!(encode(&program, &value), bytes);
    }

    #[test]
    fn reserved_bits_are_zeroed(byte in any::<u8>()) {
        let program = Program::compile(
            &[FieldOp::reserved(2), FieldOp::value("v", 4, FieldKind::Unsigned), FieldOp::reserved(2)],
            false,
        )
        .unwrap();
        let value = program.decode(TAG, &[byte]).unwrap();
        prop_assert_eq!(encode(&program, &value), vec![byte & 0b0011_1100]);
    }

    #[test]
    fn knx_float_decode_is_a_fixpoint(raw in any::<u16>()) {
        let program = knx_float();
        let value = program.decode(TAG, &raw.to_be_bytes()).unwrap();
        let bytes = encode(&program, &value);
        prop_assert_eq!(program.decode(TAG, &bytes).unwrap(), value);
    }

    #[test]
    fn knx_float_encode_is_close(hundredths in -67_108_864i64..=67_076_096) {
        let program = knx_float();
        let x = hundredths as f64 / 100.0;
        let bytes = encode(&program, &Value::F16(x as f32));
        let back = program.decode(TAG, &bytes).unwrap().as_f64().unwrap();
        // half the step at exponent 15, plus f32 rounding
        prop_assert!((back - x).abs() <= 164.0, "{x} decoded as {back}");
    }

    #[test]
    fn epoch_days_round_trip(days in 7_305i32..=43_829) {
        // 1990-01-01 ..= 2089-12-31
        let program = Program::compile(
            &[FieldOp::computed(
                "date",
                Fold::EpochDays { year: YearBase::Century1990 },
                vec![
                    SubField::Reserved { bits: 3 },
                    SubField::Value { name: "day".into(), bits: 5 },
                    SubField::Reserved { bits: 4 },
                    SubField::Value { name: "month".into(), bits: 4 },
                    SubField::Reserved { bits: 1 },
                    SubField::Value { name: "year".into(), bits: 7 },
                ],
            )],
            false,
        )
        .unwrap();

        let value = Value::I32(days);
        let bytes = encode(&program, &value);
        prop_assert_eq!(program.decode(TAG, &bytes).unwrap(), value);
    }
}
