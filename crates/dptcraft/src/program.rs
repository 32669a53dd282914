//! Compiled field programs and their execution against a bit cursor.

use std::collections::HashSet;

use crate::{
    bits::{BitReader, BitWriter},
    dpt::DptId,
    errors::{CompileError, DecodeError, EncodeError, ReadError, WriteError},
    field::{ComputedField, FieldKind, FieldOp, SubField, ValueField},
    float::{FloatEncoding, Real},
    fold::MAX_INPUT_BITS,
    value::{Struct, Value},
};

/// A validated, immutable field program for one datapoint type.
///
/// Use [Program::compile] to build one from [FieldOp]s, then
/// [Program::decode] / [Program::encode_into] to run it.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    ops: Vec<FieldOp>,
    total_bits: usize,
    value_count: usize,
    scalar: bool,
}

/// Why a single field could not be encoded.
enum Fault {
    Mismatch(String),
    OutOfRange,
}

impl From<WriteError> for Fault {
    fn from(_: WriteError) -> Self {
        Fault::OutOfRange
    }
}

impl Program {
    /// Validates `ops`. The result is a bare scalar when exactly one op
    /// produces a value and `wrap_struct` is false; otherwise a [Struct].
    pub fn compile(ops: &[FieldOp], wrap_struct: bool) -> Result<Self, CompileError> {
        let mut names = HashSet::new();
        let mut total_bits = 0;
        let mut value_count = 0;

        for op in ops {
            match op {
                FieldOp::Value(field) => validate_value(field)?,
                FieldOp::Reserved { bits } => {
                    if *bits == 0 {
                        return Err(CompileError::InvalidFieldSize {
                            field: "reserved".to_string(),
                            bits: 0,
                        });
                    }
                }
                FieldOp::Computed(field) => validate_computed(field)?,
            }

            if let Some(name) = op.name() {
                if name.trim().is_empty() || !names.insert(name) {
                    return Err(CompileError::InvalidFieldName(name.to_string()));
                }
                value_count += 1;
            }

            total_bits += op.bits();
        }

        if value_count == 0 {
            return Err(CompileError::NoValueFields);
        }

        Ok(Program {
            ops: ops.to_vec(),
            total_bits,
            value_count,
            scalar: value_count == 1 && !wrap_struct,
        })
    }

    pub fn ops(&self) -> &[FieldOp] {
        &self.ops
    }

    /// Sum of all op widths.
    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    /// Bytes needed to hold [total_bits](Self::total_bits).
    pub fn byte_len(&self) -> usize {
        self.total_bits.div_ceil(8)
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    /// Names of the values this program produces, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(FieldOp::name)
    }

    /// Runs the program over `data`. Bits past the program's width are ignored.
    pub fn decode(&self, tag: DptId, data: &[u8]) -> Result<Value, DecodeError> {
        let mut reader = BitReader::new(data);
        let mut fields = Struct::with_capacity(self.value_count);
        let mut scalar = None;

        for op in &self.ops {
            let (name, value) = match op {
                FieldOp::Reserved { bits } => {
                    reader
                        .skip(*bits)
                        .map_err(|e| underrun(tag, "reserved", e))?;
                    continue;
                }
                FieldOp::Value(field) => (
                    &field.name,
                    read_value(&mut reader, field).map_err(|e| underrun(tag, &field.name, e))?,
                ),
                FieldOp::Computed(field) => (
                    &field.name,
                    read_computed(&mut reader, field)
                        .map_err(|e| underrun(tag, &field.name, e))?,
                ),
            };

            if self.scalar {
                scalar = Some(value);
            } else {
                fields.insert(name.as_str(), value);
            }
        }

        Ok(scalar.unwrap_or(Value::Struct(fields)))
    }

    /// Appends the encoding of `value` to `out`.
    ///
    /// On error `out` is restored to its original length.
    pub fn encode_into(
        &self,
        tag: DptId,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let start = out.len();
        let result = self.write(tag, value, out);
        if result.is_err() {
            out.truncate(start);
        }
        result
    }

    fn write(&self, tag: DptId, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let fields = if self.scalar {
            None
        } else {
            let Value::Struct(fields) = value else {
                return Err(mismatch(
                    tag,
                    "",
                    format!("expected struct, got {}", value.kind()),
                ));
            };
            if fields.len() != self.value_count {
                return Err(mismatch(
                    tag,
                    "",
                    format!(
                        "expected {} fields, got {}",
                        self.value_count,
                        fields.len()
                    ),
                ));
            }
            Some(fields)
        };

        let lookup = |name: &str| match fields {
            None => Ok(value),
            Some(fields) => fields
                .get(name)
                .ok_or_else(|| mismatch(tag, name, "missing field".to_string())),
        };

        let mut writer = BitWriter::new(out);

        for op in &self.ops {
            match op {
                FieldOp::Reserved { bits } => writer.write_reserved(*bits),
                FieldOp::Value(field) => write_value(&mut writer, field, lookup(&field.name)?)
                    .map_err(|fault| field_error(tag, &field.name, fault))?,
                FieldOp::Computed(field) => {
                    write_computed(&mut writer, field, lookup(&field.name)?)
                        .map_err(|fault| field_error(tag, &field.name, fault))?
                }
            }
        }

        Ok(())
    }
}

fn invalid_size(field: &str, bits: usize) -> CompileError {
    CompileError::InvalidFieldSize {
        field: field.to_string(),
        bits,
    }
}

fn validate_value(field: &ValueField) -> Result<(), CompileError> {
    let bits = field.bits;
    let valid = match field.kind {
        FieldKind::Bool => bits == 1,
        FieldKind::Unsigned | FieldKind::Signed => (1..=64).contains(&bits),
        FieldKind::Float(encoding) => {
            if let FloatEncoding::Ieee {
                exponent_bits,
                mantissa_bits,
                ..
            } = encoding
            {
                if !encoding.is_supported() {
                    return Err(CompileError::InvalidFloatLayout {
                        field: field.name.clone(),
                        exponent_bits,
                        mantissa_bits,
                    });
                }
            }
            bits == encoding.bits()
        }
        FieldKind::Text(_) => bits > 0 && bits % 8 == 0,
    };

    if !valid {
        return Err(invalid_size(&field.name, bits));
    }

    Ok(())
}

fn validate_computed(field: &ComputedField) -> Result<(), CompileError> {
    let invalid = |reason: String| CompileError::InvalidComputedField {
        field: field.name.clone(),
        reason,
    };

    let mut seen = HashSet::new();
    for sub in &field.fields {
        match sub {
            SubField::Reserved { bits } if *bits == 0 => {
                return Err(invalid_size(&field.name, 0));
            }
            SubField::Reserved { .. } => {}
            SubField::Value { name, bits } => {
                if *bits == 0 {
                    return Err(invalid_size(name, 0));
                }
                if *bits > MAX_INPUT_BITS {
                    return Err(invalid(format!(
                        "`{name}` is {bits} bits wide, folds take at most {MAX_INPUT_BITS}"
                    )));
                }
                if !field.fold.inputs().contains(&name.as_str()) {
                    return Err(invalid(format!("`{name}` is not an input of its fold")));
                }
                if !seen.insert(name.as_str()) {
                    return Err(invalid(format!("`{name}` appears twice")));
                }
            }
        }
    }

    if let Some(missing) = field.fold.inputs().iter().find(|n| !seen.contains(*n)) {
        return Err(invalid(format!("missing input `{missing}`")));
    }

    Ok(())
}

fn underrun(tag: DptId, field: &str, err: ReadError) -> DecodeError {
    let (needed, available) = match err {
        ReadError::BufferUnderrun { needed, available } => (needed, available),
        // widths are capped at 64 bits during compile
        ReadError::TooManyBits(needed) => (needed, 0),
    };

    DecodeError::BufferUnderrun {
        tag,
        field: field.to_string(),
        needed,
        available,
    }
}

fn mismatch(tag: DptId, field: &str, reason: String) -> EncodeError {
    EncodeError::SchemaMismatch {
        tag,
        field: field.to_string(),
        reason,
    }
}

fn field_error(tag: DptId, field: &str, fault: Fault) -> EncodeError {
    match fault {
        Fault::Mismatch(reason) => mismatch(tag, field, reason),
        Fault::OutOfRange => EncodeError::ValueOutOfRange {
            tag,
            field: field.to_string(),
        },
    }
}

fn read_value(reader: &mut BitReader<'_>, field: &ValueField) -> Result<Value, ReadError> {
    let bits = field.bits;
    Ok(match field.kind {
        FieldKind::Bool => Value::Bool(reader.read_bit()?),
        FieldKind::Unsigned => Value::from_unsigned(reader.read_uint(bits)?, bits),
        FieldKind::Signed => Value::from_signed(reader.read_int(bits)?, bits),
        FieldKind::Float(encoding) => match (encoding, reader.read_float(encoding)?) {
            (FloatEncoding::Knx16, real) => Value::F16(real.to_f32()),
            (_, Real::F32(v)) => Value::F32(v),
            (_, Real::F64(v)) => Value::F64(v),
        },
        FieldKind::Text(charset) => Value::Text(reader.read_text(bits, charset)?),
    })
}

fn read_computed(reader: &mut BitReader<'_>, field: &ComputedField) -> Result<Value, ReadError> {
    let mut parts: Vec<(&str, u64)> = Vec::with_capacity(field.fields.len());

    for sub in &field.fields {
        match sub {
            SubField::Reserved { bits } => reader.skip(*bits)?,
            SubField::Value { name, bits } => {
                parts.push((name.as_str(), reader.read_uint(*bits)?))
            }
        }
    }

    Ok(field.fold.fold(|name| {
        parts
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(0, |(_, v)| *v)
    }))
}

fn write_value(writer: &mut BitWriter<'_>, field: &ValueField, value: &Value) -> Result<(), Fault> {
    let expected = field.value_kind();
    if value.kind() != expected {
        return Err(Fault::Mismatch(format!(
            "expected {expected}, got {}",
            value.kind()
        )));
    }

    let bits = field.bits;
    match (field.kind, value) {
        (FieldKind::Bool, Value::Bool(b)) => writer.write_bit(*b)?,
        (FieldKind::Unsigned, v) => {
            writer.write_uint(v.as_u64().ok_or(Fault::OutOfRange)?, bits)?
        }
        (FieldKind::Signed, v) => writer.write_int(v.as_i64().ok_or(Fault::OutOfRange)?, bits)?,
        (FieldKind::Float(encoding), Value::F16(v) | Value::F32(v)) => {
            writer.write_float(encoding, Real::F32(*v))?
        }
        (FieldKind::Float(encoding), Value::F64(v)) => {
            writer.write_float(encoding, Real::F64(*v))?
        }
        (FieldKind::Text(charset), Value::Text(text)) => writer.write_text(text, bits, charset)?,
        _ => return Err(Fault::Mismatch(format!("expected {expected}"))),
    }

    Ok(())
}

fn write_computed(
    writer: &mut BitWriter<'_>,
    field: &ComputedField,
    value: &Value,
) -> Result<(), Fault> {
    let expected = field.fold.output();
    if value.kind() != expected {
        return Err(Fault::Mismatch(format!(
            "expected {expected}, got {}",
            value.kind()
        )));
    }

    let parts = field.fold.unfold(value).ok_or(Fault::OutOfRange)?;

    for sub in &field.fields {
        match sub {
            SubField::Reserved { bits } => writer.write_reserved(*bits),
            SubField::Value { name, bits } => {
                let raw = parts
                    .iter()
                    .find(|(n, _)| *n == name.as_str())
                    .map(|(_, v)| *v)
                    .ok_or(Fault::OutOfRange)?;
                writer.write_uint(raw, *bits)?;
            }
        }
    }

    Ok(())
}
