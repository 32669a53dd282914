//! Error types for program compilation, bit reading/writing and the codec entry points.

use thiserror::Error;

use crate::dpt::DptId;

/// Errors produced when compiling field definitions into a [crate::program::Program].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Width is zero, too wide for its kind, or does not match the kind's fixed width.
    #[error("field `{field}` has an invalid width of {bits} bits")]
    InvalidFieldSize { field: String, bits: usize },
    /// IEEE layout other than single or double precision.
    #[error("field `{field}` uses an unsupported float layout ({exponent_bits}, {mantissa_bits})")]
    InvalidFloatLayout {
        field: String,
        exponent_bits: u8,
        mantissa_bits: u8,
    },
    /// Field name is empty or used twice within one program.
    #[error("invalid field name `{0}` (empty or duplicate)")]
    InvalidFieldName(String),
    /// Program has no value-producing field.
    #[error("program declares no value fields")]
    NoValueFields,
    /// Computed field is nested or does not provide what its fold needs.
    #[error("computed field `{field}`: {reason}")]
    InvalidComputedField { field: String, reason: String },
    /// Two programs were registered for the same datapoint type.
    #[error("datapoint type {0} is registered twice")]
    DuplicateTag(DptId),
}

/// Errors produced by [crate::bits::BitReader].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Fewer bits remain than the read requires.
    #[error("buffer underrun: needed {needed} bits, {available} available")]
    BufferUnderrun { needed: usize, available: usize },
    /// More than 64 bits were requested in a single integer read.
    #[error("cannot read {0} bits into one integer")]
    TooManyBits(usize),
}

/// Errors produced by [crate::bits::BitWriter].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// Value does not fit the declared width or encoding.
    #[error("value does not fit the field")]
    ValueOutOfRange,
    /// More than 64 bits were requested in a single integer write.
    #[error("cannot write {0} bits from one integer")]
    TooManyBits(usize),
    /// Text is too long or contains characters outside the field's charset.
    #[error("text cannot be represented in the field")]
    InvalidText,
}

/// Errors returned by [crate::registry::Registry::decode].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown datapoint type {0}")]
    UnknownTag(DptId),
    #[error("{tag}: buffer underrun in field `{field}` (needed {needed} bits, {available} available)")]
    BufferUnderrun {
        tag: DptId,
        field: String,
        needed: usize,
        available: usize,
    },
}

/// Errors returned by [crate::registry::Registry::encode].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("unknown datapoint type {0}")]
    UnknownTag(DptId),
    /// The value's shape or kind does not match the datapoint's program.
    #[error("{tag}: value does not match field `{field}`: {reason}")]
    SchemaMismatch {
        tag: DptId,
        field: String,
        reason: String,
    },
    /// The value has the right kind but cannot be represented on the wire.
    #[error("{tag}: value of field `{field}` is out of range")]
    ValueOutOfRange { tag: DptId, field: String },
}

/// A datapoint identifier could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid datapoint type identifier `{0}`")]
pub struct ParseDptError(pub String);

/// Errors produced when loading a catalog definition.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("datapoint {id}: {source}")]
    Compile {
        id: DptId,
        #[source]
        source: CompileError,
    },
    #[error(transparent)]
    Registry(CompileError),
}
