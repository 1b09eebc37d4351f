//! Single-row typed access.

use crate::getter::{self, Field, FromField};
use crate::{CursorDescriptor, RecordDescriptor, RowkitResult, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value extension point attached to every record. Nothing in rowkit
/// populates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    entries: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Read-only view of the current row.
///
/// Kept object safe so predicates can take `&dyn Record`; the typed
/// accessors live on [`RecordExt`].
pub trait Record {
    /// Live schema of the current result set.
    fn descriptor(&self) -> CursorDescriptor<'_>;

    fn metadata(&self) -> &Metadata;

    /// Range- and state-checked handle onto the field at `ordinal`.
    fn field(&self, ordinal: usize) -> RowkitResult<Field<'_>>;
}

/// Typed accessors available on every [`Record`], including `dyn Record`.
pub trait RecordExt: Record {
    fn field_count(&self) -> usize {
        self.descriptor().field_count()
    }

    fn ordinal(&self, name: &str) -> RowkitResult<usize> {
        self.descriptor().field_ordinal(name)
    }

    /// Read the field at `ordinal` as `T`.
    fn get<T: FromField>(&self, ordinal: usize) -> RowkitResult<T> {
        getter::extract(&self.field(ordinal)?)
    }

    fn get_by_name<T: FromField>(&self, name: &str) -> RowkitResult<T> {
        let ordinal = self.ordinal(name)?;
        self.get(ordinal)
    }

    fn is_null(&self, ordinal: usize) -> RowkitResult<bool> {
        self.field(ordinal)?.is_null()
    }

    /// Raw boxed value; `Value::Null` for nulls.
    fn value(&self, ordinal: usize) -> RowkitResult<Value> {
        self.get(ordinal)
    }

    /// Canonical text for any column type; `None` for nulls.
    fn text(&self, ordinal: usize) -> RowkitResult<Option<String>> {
        self.field(ordinal)?.text()
    }

    /// Copy the current row into `buffer`, returning how many fields were
    /// written (the smaller of the buffer length and the field count).
    fn values(&self, buffer: &mut [Value]) -> RowkitResult<usize> {
        let count = buffer.len().min(self.field_count());
        for (ordinal, slot) in buffer.iter_mut().take(count).enumerate() {
            *slot = self.value(ordinal)?;
        }
        Ok(count)
    }
}

impl<R: Record + ?Sized> RecordExt for R {}
