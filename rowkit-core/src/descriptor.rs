//! Schema descriptors.
//!
//! [`CursorDescriptor`] is the live flavour: a borrowed view onto the cursor,
//! usable only while the reader that owns the cursor is alive (the borrow
//! checker enforces this). [`SchemaDescriptor`] is the detached flavour
//! produced by [`RecordDescriptor::copy`]; it owns its fields and holds no
//! reference to any cursor, so it can travel with materialized output.

use crate::{Cursor, RowkitResult, SchemaError, TypeTag};
use serde::{Deserialize, Serialize};

/// One field of a result set schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: TypeTag,
    pub ordinal: usize,
}

/// Read access to a result set schema.
pub trait RecordDescriptor {
    fn field_count(&self) -> usize;

    /// Fails with `SchemaError::OrdinalOutOfRange` outside `[0, field_count)`.
    fn field_name(&self, ordinal: usize) -> RowkitResult<&str>;

    /// Fails with `SchemaError::OrdinalOutOfRange` outside `[0, field_count)`.
    fn field_type(&self, ordinal: usize) -> RowkitResult<TypeTag>;

    /// Fails with `SchemaError::FieldNotFound` for an unknown name.
    fn field_ordinal(&self, name: &str) -> RowkitResult<usize>;

    /// Detached snapshot of this schema.
    fn copy(&self) -> RowkitResult<SchemaDescriptor> {
        let mut fields = Vec::with_capacity(self.field_count());
        for ordinal in 0..self.field_count() {
            fields.push(FieldDescriptor {
                name: self.field_name(ordinal)?.to_string(),
                field_type: self.field_type(ordinal)?,
                ordinal,
            });
        }
        Ok(SchemaDescriptor { fields })
    }
}

pub(crate) fn check_ordinal(ordinal: usize, field_count: usize) -> RowkitResult<()> {
    if ordinal >= field_count {
        return Err(SchemaError::OrdinalOutOfRange {
            ordinal,
            field_count,
        }
        .into());
    }
    Ok(())
}

/// Live descriptor borrowed from an active cursor.
#[derive(Clone, Copy)]
pub struct CursorDescriptor<'a> {
    cursor: &'a dyn Cursor,
}

impl<'a> CursorDescriptor<'a> {
    pub fn new(cursor: &'a dyn Cursor) -> Self {
        Self { cursor }
    }
}

impl std::fmt::Debug for CursorDescriptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorDescriptor")
            .field("field_count", &self.cursor.field_count())
            .finish()
    }
}

impl RecordDescriptor for CursorDescriptor<'_> {
    fn field_count(&self) -> usize {
        self.cursor.field_count()
    }

    fn field_name(&self, ordinal: usize) -> RowkitResult<&str> {
        check_ordinal(ordinal, self.field_count())?;
        self.cursor.name(ordinal)
    }

    fn field_type(&self, ordinal: usize) -> RowkitResult<TypeTag> {
        check_ordinal(ordinal, self.field_count())?;
        self.cursor.field_type(ordinal)
    }

    fn field_ordinal(&self, name: &str) -> RowkitResult<usize> {
        self.cursor.ordinal(name)
    }
}

/// Detached, owned schema snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    /// Build from `(name, type)` pairs; ordinals follow iteration order.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeTag)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(ordinal, (name, field_type))| FieldDescriptor {
                name: name.into(),
                field_type,
                ordinal,
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn get(&self, ordinal: usize) -> RowkitResult<&FieldDescriptor> {
        check_ordinal(ordinal, self.fields.len())?;
        Ok(&self.fields[ordinal])
    }
}

impl RecordDescriptor for SchemaDescriptor {
    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field_name(&self, ordinal: usize) -> RowkitResult<&str> {
        Ok(&self.get(ordinal)?.name)
    }

    fn field_type(&self, ordinal: usize) -> RowkitResult<TypeTag> {
        Ok(self.get(ordinal)?.field_type.clone())
    }

    fn field_ordinal(&self, name: &str) -> RowkitResult<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| {
                SchemaError::FieldNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    fn copy(&self) -> RowkitResult<SchemaDescriptor> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryCursor, ResultSetData, RowkitError};

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new([("id", TypeTag::Int32), ("name", TypeTag::Text)])
    }

    #[test]
    fn test_schema_descriptor_lookups() {
        let desc = schema();
        assert_eq!(desc.field_count(), 2);
        assert_eq!(desc.field_name(1).unwrap(), "name");
        assert_eq!(desc.field_type(0).unwrap(), TypeTag::Int32);
        assert_eq!(desc.field_ordinal("name").unwrap(), 1);
        assert_eq!(desc.fields()[1].ordinal, 1);
    }

    #[test]
    fn test_schema_descriptor_range_and_not_found() {
        let desc = schema();
        assert!(matches!(
            desc.field_name(2),
            Err(RowkitError::Schema(SchemaError::OrdinalOutOfRange {
                ordinal: 2,
                field_count: 2
            }))
        ));
        assert!(matches!(
            desc.field_ordinal("nope"),
            Err(RowkitError::Schema(SchemaError::FieldNotFound { .. }))
        ));
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let desc = SchemaDescriptor::new([("a", TypeTag::Int32), ("a", TypeTag::Text)]);
        assert_eq!(desc.field_ordinal("a").unwrap(), 0);
    }

    #[test]
    fn test_cursor_descriptor_copy_is_detached() {
        let set = ResultSetData::new()
            .field("id", TypeTag::Int32)
            .field("name", TypeTag::Text);
        let mut cursor = MemoryCursor::single(set).unwrap();

        let copy = CursorDescriptor::new(&cursor).copy().unwrap();
        cursor.close().unwrap();
        drop(cursor);

        assert_eq!(copy, schema());
    }

    #[test]
    fn test_cursor_descriptor_range_check() {
        let cursor =
            MemoryCursor::single(ResultSetData::new().field("id", TypeTag::Int32)).unwrap();
        let desc = CursorDescriptor::new(&cursor);
        assert!(desc.field_type(0).is_ok());
        assert!(matches!(
            desc.field_type(1),
            Err(RowkitError::Schema(SchemaError::OrdinalOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_schema_descriptor_serde() {
        let json = serde_json::to_string(&schema()).unwrap();
        let back: SchemaDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema());
    }
}
