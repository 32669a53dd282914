//! # dptcraft-knx
//!
//! The built-in KNX datapoint catalog for [dptcraft].
//!
//! The catalog ships as JSON (`catalog/knx.json`) and is compiled into a
//! shared [Registry] the first time it is used.
//!
//! ```
//! use dptcraft::Value;
//!
//! let value = dptcraft_knx::decode(dptcraft_knx::TEMPERATURE, &[0x07, 0xD0]).unwrap();
//! assert_eq!(value, Value::F16(20.0));
//! ```

use std::sync::LazyLock;

use dptcraft::{DecodeError, DptId, EncodeError, Registry, Value};

/// Source of the built-in catalog.
pub const CATALOG_JSON: &str = include_str!("../catalog/knx.json");

pub const SWITCH: DptId = DptId::new(1, 1);
pub const DIMMING_CONTROL: DptId = DptId::new(3, 7);
pub const SCALING: DptId = DptId::new(5, 1);
pub const TEMPERATURE: DptId = DptId::new(9, 1);
pub const TIME_OF_DAY: DptId = DptId::new(10, 1);
pub const DATE: DptId = DptId::new(11, 1);
pub const ACTIVE_POWER: DptId = DptId::new(14, 56);
pub const STRING_ASCII: DptId = DptId::new(16, 0);
pub const SCENE_CONTROL: DptId = DptId::new(18, 1);
pub const DATE_TIME: DptId = DptId::new(19, 1);
pub const HVAC_MODE: DptId = DptId::new(20, 102);
pub const COLOUR_RGB: DptId = DptId::new(232, 600);
pub const COLOUR_RGBW: DptId = DptId::new(251, 600);

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::from_json(CATALOG_JSON).expect("built-in KNX catalog is valid");
    tracing::debug!(
        datapoints = registry.len(),
        version = registry.version().unwrap_or("-"),
        "loaded built-in KNX catalog"
    );
    registry
});

/// The shared registry compiled from [CATALOG_JSON].
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Decodes `data` as datapoint type `tag` using the built-in catalog.
pub fn decode(tag: DptId, data: &[u8]) -> Result<Value, DecodeError> {
    registry().decode(tag, data)
}

/// Encodes `value` as datapoint type `tag` using the built-in catalog.
pub fn encode(tag: DptId, value: &Value) -> Result<Vec<u8>, EncodeError> {
    registry().encode(tag, value)
}
