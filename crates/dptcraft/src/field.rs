//! Field operations that make up a datapoint's field program.

use crate::{fold::Fold, float::FloatEncoding, text::Charset, value::ValueKind};

/// How the bits of a value field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single bit.
    Bool,
    Unsigned,
    /// Two's complement, sign-extended from the field's top bit.
    Signed,
    Float(FloatEncoding),
    /// Fixed-length text; the width must be a multiple of 8.
    Text(Charset),
}

/// A named field whose bits become one scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueField {
    pub name: String,
    pub bits: usize,
    pub kind: FieldKind,
}

impl ValueField {
    /// Kind of the [crate::value::Value] this field decodes to.
    pub fn value_kind(&self) -> ValueKind {
        match self.kind {
            FieldKind::Bool => ValueKind::Bool,
            FieldKind::Unsigned => ValueKind::unsigned(self.bits),
            FieldKind::Signed => ValueKind::signed(self.bits),
            FieldKind::Float(FloatEncoding::Knx16) => ValueKind::F16,
            FieldKind::Float(FloatEncoding::Ieee { exponent_bits: 11, .. }) => ValueKind::F64,
            FieldKind::Float(FloatEncoding::Ieee { .. }) => ValueKind::F32,
            FieldKind::Text(_) => ValueKind::Text,
        }
    }
}

/// One step inside a computed field: an unsigned input of the fold, or padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubField {
    Value { name: String, bits: usize },
    Reserved { bits: usize },
}

impl SubField {
    pub fn bits(&self) -> usize {
        match self {
            SubField::Value { bits, .. } | SubField::Reserved { bits } => *bits,
        }
    }
}

/// Several consecutive sub-fields folded into one externally visible scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedField {
    pub name: String,
    pub fold: Fold,
    pub fields: Vec<SubField>,
}

/// A single operation of a field program, executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    Value(ValueField),
    /// Bits with no carried value: discarded on decode, written as zero on encode.
    Reserved { bits: usize },
    Computed(ComputedField),
}

impl FieldOp {
    pub fn value(name: impl Into<String>, bits: usize, kind: FieldKind) -> Self {
        FieldOp::Value(ValueField {
            name: name.into(),
            bits,
            kind,
        })
    }

    pub fn reserved(bits: usize) -> Self {
        FieldOp::Reserved { bits }
    }

    pub fn computed(name: impl Into<String>, fold: Fold, fields: Vec<SubField>) -> Self {
        FieldOp::Computed(ComputedField {
            name: name.into(),
            fold,
            fields,
        })
    }

    /// Width of this operation on the wire.
    pub fn bits(&self) -> usize {
        match self {
            FieldOp::Value(field) => field.bits,
            FieldOp::Reserved { bits } => *bits,
            FieldOp::Computed(field) => field.fields.iter().map(SubField::bits).sum(),
        }
    }

    /// Name of the value this operation produces, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            FieldOp::Value(field) => Some(&field.name),
            FieldOp::Reserved { .. } => None,
            FieldOp::Computed(field) => Some(&field.name),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldOpDef> for FieldOp {
    fn from(value: crate::serde::FieldOpDef) -> Self {
        match value {
            crate::serde::FieldOpDef::Value { name, bits, kind } => {
                FieldOp::value(name, bits, kind.into())
            }
            crate::serde::FieldOpDef::Reserved { bits } => FieldOp::reserved(bits),
            crate::serde::FieldOpDef::Computed { name, fold, fields } => {
                FieldOp::computed(name, fold.into(), fields.into_iter().map(Into::into).collect())
            }
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::SubFieldDef> for SubField {
    fn from(value: crate::serde::SubFieldDef) -> Self {
        match value {
            crate::serde::SubFieldDef::Value { name, bits } => SubField::Value { name, bits },
            crate::serde::SubFieldDef::Reserved { bits } => SubField::Reserved { bits },
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldKindDef> for FieldKind {
    fn from(value: crate::serde::FieldKindDef) -> Self {
        match value {
            crate::serde::FieldKindDef::Bool => FieldKind::Bool,
            crate::serde::FieldKindDef::Unsigned => FieldKind::Unsigned,
            crate::serde::FieldKindDef::Signed => FieldKind::Signed,
            crate::serde::FieldKindDef::KnxFloat => FieldKind::Float(FloatEncoding::Knx16),
            crate::serde::FieldKindDef::IeeeFloat {
                signed,
                exponent_bits,
                mantissa_bits,
            } => FieldKind::Float(FloatEncoding::Ieee {
                signed,
                exponent_bits,
                mantissa_bits,
            }),
            crate::serde::FieldKindDef::Text { charset } => FieldKind::Text(match charset {
                crate::serde::CharsetDef::Ascii => Charset::Ascii,
                crate::serde::CharsetDef::Latin1 => Charset::Latin1,
            }),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FoldDef> for Fold {
    fn from(value: crate::serde::FoldDef) -> Self {
        let year = |def: crate::serde::YearBaseDef| match def {
            crate::serde::YearBaseDef::Offset(base) => crate::fold::YearBase::Offset(base),
            crate::serde::YearBaseDef::Century1990 => crate::fold::YearBase::Century1990,
        };

        match value {
            crate::serde::FoldDef::SecondsOfDay => Fold::SecondsOfDay,
            crate::serde::FoldDef::EpochDays { year: def } => Fold::EpochDays { year: year(def) },
            crate::serde::FoldDef::EpochSeconds { year: def } => {
                Fold::EpochSeconds { year: year(def) }
            }
        }
    }
}
