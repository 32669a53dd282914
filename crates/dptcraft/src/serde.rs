//! JSON-deserializable catalog description.
//!
//! These types describe datapoint layouts as data, so a catalog can ship as a
//! JSON file and be compiled into a [Registry] at startup:
//!
//! ```json
//! {
//!   "version": "2.1",
//!   "datapoints": [
//!     {
//!       "id": "9.001",
//!       "name": "temperature",
//!       "unit": "°C",
//!       "fields": [
//!         { "op": "value", "name": "value", "bits": 16, "kind": { "type": "knx_float" } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{
    dpt::DptId,
    errors::CatalogError,
    field::FieldOp,
    program::Program,
    registry::{Datapoint, Registry},
};

/// Top-level catalog: an optional version and a list of datapoints.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub datapoints: Vec<DatapointDef>,
}

/// One datapoint type and its field program.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatapointDef {
    /// Identifier such as `"9.001"` or `"DPST-9-1"`.
    pub id: DptId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Decode to a struct even when the program has a single value field.
    #[serde(default, rename = "struct")]
    pub wrap_struct: bool,
    pub fields: Vec<FieldOpDef>,
}

/// A single field operation.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldOpDef {
    Value {
        name: String,
        bits: usize,
        kind: FieldKindDef,
    },
    Reserved {
        bits: usize,
    },
    Computed {
        name: String,
        fold: FoldDef,
        fields: Vec<SubFieldDef>,
    },
}

/// Operation inside a computed field. Values are always unsigned.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SubFieldDef {
    Value { name: String, bits: usize },
    Reserved { bits: usize },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKindDef {
    Bool,
    Unsigned,
    Signed,
    /// KNX 2-byte linear float.
    KnxFloat,
    IeeeFloat {
        #[serde(default = "default_signed")]
        signed: bool,
        exponent_bits: u8,
        mantissa_bits: u8,
    },
    Text {
        charset: CharsetDef,
    },
}

fn default_signed() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CharsetDef {
    Ascii,
    Latin1,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FoldDef {
    SecondsOfDay,
    EpochDays { year: YearBaseDef },
    EpochSeconds { year: YearBaseDef },
}

/// Either `{"offset": 1900}` or `"century1990"`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum YearBaseDef {
    Offset(u16),
    Century1990,
}

impl TryFrom<DatapointDef> for Datapoint {
    type Error = CatalogError;

    fn try_from(def: DatapointDef) -> Result<Self, Self::Error> {
        let ops: Vec<FieldOp> = def.fields.into_iter().map(Into::into).collect();
        let program = Program::compile(&ops, def.wrap_struct)
            .map_err(|source| CatalogError::Compile { id: def.id, source })?;

        Ok(Datapoint {
            id: def.id,
            name: def.name,
            unit: def.unit,
            program,
        })
    }
}

impl TryFrom<CatalogDef> for Registry {
    type Error = CatalogError;

    fn try_from(def: CatalogDef) -> Result<Self, Self::Error> {
        let mut builder = Registry::builder();
        if let Some(version) = def.version {
            builder = builder.version(version);
        }

        for datapoint in def.datapoints {
            builder
                .insert(datapoint.try_into()?)
                .map_err(CatalogError::Registry)?;
        }

        Ok(builder.build())
    }
}

impl Registry {
    /// Compiles a registry from a JSON catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let def: CatalogDef = serde_json::from_str(json)?;
        def.try_into()
    }

    /// Like [Registry::from_json], reading the catalog from `reader`.
    pub fn from_reader(reader: impl Read) -> Result<Self, CatalogError> {
        let def: CatalogDef = serde_json::from_reader(reader)?;
        def.try_into()
    }
}
