//! Floating-point wire encodings.
//!
//! Two reconstruction rules exist and are never inferred from the width:
//! IEEE-754 single/double precision, and the KNX 2-byte linear float
//! (`0.01 · M · 2^E`, 12-bit two's-complement mantissa, 4-bit exponent,
//! no implicit bit, no bias).

use crate::errors::WriteError;

/// Encoding rule of a float field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatEncoding {
    /// KNX 2-byte float, bit layout `MEEEEMMM MMMMMMMM`.
    Knx16,
    /// IEEE-754 shaped float. Only `(8, 23)` and `(11, 52)` layouts are supported.
    Ieee {
        signed: bool,
        exponent_bits: u8,
        mantissa_bits: u8,
    },
}

/// A decoded float, kept at the precision of its wire format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Real {
    F32(f32),
    F64(f64),
}

impl Real {
    pub fn to_f32(self) -> f32 {
        match self {
            Real::F32(v) => v,
            Real::F64(v) => v as f32,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Real::F32(v) => v as f64,
            Real::F64(v) => v,
        }
    }
}

const KNX_MANTISSA_MIN: f64 = -2048.0;
const KNX_MANTISSA_MAX: f64 = 2047.0;
const KNX_EXPONENT_MAX: u32 = 15;

impl FloatEncoding {
    pub const SINGLE: FloatEncoding = FloatEncoding::Ieee {
        signed: true,
        exponent_bits: 8,
        mantissa_bits: 23,
    };

    pub const DOUBLE: FloatEncoding = FloatEncoding::Ieee {
        signed: true,
        exponent_bits: 11,
        mantissa_bits: 52,
    };

    /// Total width on the wire.
    pub fn bits(&self) -> usize {
        match *self {
            FloatEncoding::Knx16 => 16,
            FloatEncoding::Ieee {
                signed,
                exponent_bits,
                mantissa_bits,
            } => signed as usize + exponent_bits as usize + mantissa_bits as usize,
        }
    }

    pub fn is_supported(&self) -> bool {
        match *self {
            FloatEncoding::Knx16 => true,
            FloatEncoding::Ieee {
                exponent_bits,
                mantissa_bits,
                ..
            } => matches!((exponent_bits, mantissa_bits), (8, 23) | (11, 52)),
        }
    }

    fn is_double(&self) -> bool {
        matches!(
            self,
            FloatEncoding::Ieee {
                exponent_bits: 11,
                ..
            }
        )
    }

    /// Reconstructs a float from the low [`bits`](Self::bits) of `raw`.
    ///
    /// Every bit pattern yields a value; nothing is rejected.
    pub fn decode(&self, raw: u64) -> Real {
        match self {
            FloatEncoding::Knx16 => {
                let exponent = ((raw >> 11) & 0x0F) as u32;
                let mantissa = crate::bits::sign_extend(((raw >> 4) & 0x800) | (raw & 0x7FF), 12);
                let value = (mantissa as f64 * (1u64 << exponent) as f64) / 100.0;
                Real::F32(value as f32)
            }
            // An unsigned layout is the signed one with the sign bit held at zero.
            FloatEncoding::Ieee { .. } if self.is_double() => Real::F64(f64::from_bits(raw)),
            FloatEncoding::Ieee { .. } => Real::F32(f32::from_bits(raw as u32)),
        }
    }

    /// Produces the raw wire bits for `value`.
    ///
    /// KNX floats pick the smallest exponent whose rounded mantissa fits;
    /// values beyond the representable range are rejected, never clamped.
    pub fn encode(&self, value: Real) -> Result<u64, WriteError> {
        match *self {
            FloatEncoding::Knx16 => encode_knx16(value.to_f64()),
            FloatEncoding::Ieee { signed, .. } => {
                let (raw, sign_bit) = if self.is_double() {
                    let raw = value.to_f64().to_bits();
                    (raw, raw >> 63)
                } else {
                    let raw = value.to_f32().to_bits() as u64;
                    (raw, raw >> 31)
                };

                if !signed && sign_bit != 0 {
                    return Err(WriteError::ValueOutOfRange);
                }

                Ok(raw)
            }
        }
    }
}

fn encode_knx16(value: f64) -> Result<u64, WriteError> {
    if !value.is_finite() {
        return Err(WriteError::ValueOutOfRange);
    }

    let scaled = value * 100.0;

    for exponent in 0..=KNX_EXPONENT_MAX {
        let mantissa = (scaled / (1u64 << exponent) as f64).round();
        if (KNX_MANTISSA_MIN..=KNX_MANTISSA_MAX).contains(&mantissa) {
            let mantissa = (mantissa as i64 as u64) & 0xFFF;
            let sign = mantissa >> 11;
            return Ok((sign << 15) | ((exponent as u64) << 11) | (mantissa & 0x7FF));
        }
    }

    Err(WriteError::ValueOutOfRange)
}
