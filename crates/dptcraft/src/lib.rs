//! # dptcraft
//!
//! A bit-precise codec engine for building-automation datapoints.
//!
//! Each datapoint type is described by a small declarative field program:
//! an ordered list of value, reserved and computed fields laid out MSB-first.
//! Programs are compiled once into an immutable [Registry], which then decodes
//! raw payloads into [Value]s and encodes them back, keyed by [DptId].
//!
//! ## Example
//!
//! ```
//! use dptcraft::{DptId, FieldKind, FieldOp, Registry, Struct, Value};
//!
//! let rgb = DptId::new(232, 600);
//! let mut builder = Registry::builder();
//! builder
//!     .program(
//!         rgb,
//!         &[
//!             FieldOp::value("red", 8, FieldKind::Unsigned),
//!             FieldOp::value("green", 8, FieldKind::Unsigned),
//!             FieldOp::value("blue", 8, FieldKind::Unsigned),
//!         ],
//!         false,
//!     )
//!     .unwrap();
//! let registry = builder.build();
//!
//! let value = registry.decode(rgb, &[0xFF, 0x80, 0x00]).unwrap();
//! assert_eq!(
//!     value,
//!     Value::Struct(Struct::new().with("red", 255u8).with("green", 128u8).with("blue", 0u8))
//! );
//! assert_eq!(registry.encode(rgb, &value).unwrap(), vec![0xFF, 0x80, 0x00]);
//! ```
//!
//! With the `serde` feature (on by default) a registry can also be loaded
//! from a JSON catalog via [Registry::from_json].

pub mod bits;
pub mod dpt;
pub mod errors;
pub mod field;
pub mod float;
pub mod fold;
pub mod program;
pub mod registry;
#[cfg(feature = "serde")]
pub mod serde;
pub mod text;
pub mod value;

pub use dpt::DptId;
#[cfg(feature = "serde")]
pub use errors::CatalogError;
pub use errors::{CompileError, DecodeError, EncodeError, ParseDptError};
pub use field::{ComputedField, FieldKind, FieldOp, SubField, ValueField};
pub use float::FloatEncoding;
pub use fold::{Fold, YearBase};
pub use program::Program;
pub use registry::{Datapoint, Registry, RegistryBuilder};
pub use text::Charset;
pub use value::{Struct, Value, ValueKind};
