//! Tag-keyed registry of compiled programs and the public codec entry points.

use std::collections::BTreeMap;

use crate::{
    dpt::DptId,
    errors::{CompileError, DecodeError, EncodeError},
    field::FieldOp,
    program::Program,
    value::Value,
};

/// A compiled program together with its catalog metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub id: DptId,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub program: Program,
}

impl Datapoint {
    pub fn new(id: DptId, program: Program) -> Self {
        Self {
            id,
            name: None,
            unit: None,
            program,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Collects datapoints before freezing them into a [Registry].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    version: Option<String>,
    datapoints: BTreeMap<DptId, Datapoint>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog version reported by [Registry::version].
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Adds a datapoint. Each tag may be registered once.
    pub fn insert(&mut self, datapoint: Datapoint) -> Result<&mut Self, CompileError> {
        if self.datapoints.contains_key(&datapoint.id) {
            return Err(CompileError::DuplicateTag(datapoint.id));
        }
        self.datapoints.insert(datapoint.id, datapoint);
        Ok(self)
    }

    /// Compiles `ops` and adds the resulting program under `id`.
    pub fn program(
        &mut self,
        id: DptId,
        ops: &[FieldOp],
        wrap_struct: bool,
    ) -> Result<&mut Self, CompileError> {
        let program = Program::compile(ops, wrap_struct)?;
        self.insert(Datapoint::new(id, program))
    }

    pub fn build(self) -> Registry {
        tracing::debug!(
            datapoints = self.datapoints.len(),
            version = self.version.as_deref().unwrap_or("-"),
            "datapoint registry built"
        );

        Registry {
            version: self.version,
            datapoints: self.datapoints,
        }
    }
}

/// Immutable mapping from [DptId] to compiled programs.
///
/// A registry is read-only once built and may be shared across threads
/// without synchronization.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    version: Option<String>,
    datapoints: BTreeMap<DptId, Datapoint>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Decodes `data` with the program registered for `tag`.
    ///
    /// Bytes beyond the program's width are ignored.
    pub fn decode(&self, tag: DptId, data: &[u8]) -> Result<Value, DecodeError> {
        let datapoint = self
            .datapoints
            .get(&tag)
            .ok_or(DecodeError::UnknownTag(tag))?;
        let program = &datapoint.program;

        tracing::trace!(
            %tag,
            bits = program.total_bits(),
            len = data.len(),
            "decoding datapoint"
        );

        let value = program.decode(tag, data)?;
        if data.len() > program.byte_len() {
            tracing::debug!(
                %tag,
                expected = program.byte_len(),
                actual = data.len(),
                "ignoring trailing bytes"
            );
        }

        Ok(value)
    }

    /// Encodes `value` into a new buffer of the program's byte length.
    pub fn encode(&self, tag: DptId, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let program = self.program(tag).ok_or(EncodeError::UnknownTag(tag))?;
        tracing::trace!(%tag, bits = program.total_bits(), "encoding datapoint");
        let mut out = Vec::with_capacity(program.byte_len());
        program.encode_into(tag, value, &mut out)?;
        Ok(out)
    }

    /// Appends the encoding of `value` to `out`. On error `out` is left unchanged.
    pub fn encode_into(
        &self,
        tag: DptId,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let program = self.program(tag).ok_or(EncodeError::UnknownTag(tag))?;
        tracing::trace!(%tag, bits = program.total_bits(), "encoding datapoint");
        program.encode_into(tag, value, out)
    }

    pub fn get(&self, tag: DptId) -> Option<&Datapoint> {
        self.datapoints.get(&tag)
    }

    pub fn program(&self, tag: DptId) -> Option<&Program> {
        self.get(tag).map(|dp| &dp.program)
    }

    pub fn contains(&self, tag: DptId) -> bool {
        self.datapoints.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.datapoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datapoints.is_empty()
    }

    /// Registered tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = DptId> + '_ {
        self.datapoints.keys().copied()
    }

    pub fn datapoints(&self) -> impl Iterator<Item = &Datapoint> {
        self.datapoints.values()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
