//! In-memory cursor source.
//!
//! `MemoryCursor` holds one or more result sets entirely in memory and follows
//! the same forward-only rules as any other [`Cursor`]. It backs the tests and
//! benchmarks and is handy for adapting already-materialized data.
//!
//! Values are not checked against the declared field types, so a result set
//! can deliberately carry data its schema does not promise.

use crate::{
    Cursor, CursorError, RowkitResult, SchemaError, StateError, TypeTag, ValidationError, Value,
};
use tracing::debug;

/// Schema entry of an in-memory result set.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryField {
    pub name: String,
    pub field_type: TypeTag,
}

/// One result set: a schema plus its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSetData {
    pub fields: Vec<MemoryField>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSetData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field to the schema.
    pub fn field(mut self, name: impl Into<String>, field_type: TypeTag) -> Self {
        self.fields.push(MemoryField {
            name: name.into(),
            field_type,
        });
        self
    }

    /// Append a row.
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    fn validate(&self, set_index: usize) -> RowkitResult<()> {
        for (ordinal, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("result_sets[{}].fields[{}].name", set_index, ordinal),
                    reason: "field name must not be empty".to_string(),
                }
                .into());
            }
        }

        for (row_index, row) in self.rows.iter().enumerate() {
            if row.len() != self.fields.len() {
                return Err(ValidationError::InvalidValue {
                    field: format!("result_sets[{}].rows[{}]", set_index, row_index),
                    reason: format!(
                        "row has {} values but the schema has {} fields",
                        row.len(),
                        self.fields.len()
                    ),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    At(usize),
    AfterLast,
}

/// Forward-only cursor over in-memory result sets.
#[derive(Debug)]
pub struct MemoryCursor {
    sets: Vec<ResultSetData>,
    current: usize,
    position: Position,
    closed: bool,
}

impl MemoryCursor {
    /// Build a cursor positioned on the first of `sets`.
    ///
    /// Fails when `sets` is empty, a field name is empty, or a row's width
    /// differs from its schema.
    pub fn new(sets: Vec<ResultSetData>) -> RowkitResult<Self> {
        if sets.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "result_sets".to_string(),
            }
            .into());
        }
        for (index, set) in sets.iter().enumerate() {
            set.validate(index)?;
        }
        Ok(Self {
            sets,
            current: 0,
            position: Position::BeforeFirst,
            closed: false,
        })
    }

    /// Cursor over a single result set.
    pub fn single(set: ResultSetData) -> RowkitResult<Self> {
        Self::new(vec![set])
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn set(&self) -> &ResultSetData {
        &self.sets[self.current]
    }

    fn check_open(&self, operation: &'static str) -> RowkitResult<()> {
        if self.closed {
            return Err(StateError::Closed { operation }.into());
        }
        Ok(())
    }

    fn field(&self, ordinal: usize) -> RowkitResult<&MemoryField> {
        self.set().fields.get(ordinal).ok_or_else(|| {
            SchemaError::OrdinalOutOfRange {
                ordinal,
                field_count: self.set().fields.len(),
            }
            .into()
        })
    }

    fn cell(&self, ordinal: usize) -> RowkitResult<&Value> {
        self.check_open("value")?;
        let row = match self.position {
            Position::At(row) => row,
            _ => {
                return Err(CursorError::ReadFailed {
                    reason: "no current row".to_string(),
                }
                .into())
            }
        };
        self.field(ordinal)?;
        Ok(&self.set().rows[row][ordinal])
    }
}

impl Cursor for MemoryCursor {
    fn field_count(&self) -> usize {
        self.set().fields.len()
    }

    fn name(&self, ordinal: usize) -> RowkitResult<&str> {
        Ok(&self.field(ordinal)?.name)
    }

    fn field_type(&self, ordinal: usize) -> RowkitResult<TypeTag> {
        Ok(self.field(ordinal)?.field_type.clone())
    }

    fn ordinal(&self, name: &str) -> RowkitResult<usize> {
        self.set()
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| {
                SchemaError::FieldNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    fn read(&mut self) -> RowkitResult<bool> {
        self.check_open("read")?;
        let row_count = self.set().rows.len();
        self.position = match self.position {
            Position::BeforeFirst if row_count > 0 => Position::At(0),
            Position::At(row) if row + 1 < row_count => Position::At(row + 1),
            _ => Position::AfterLast,
        };
        Ok(matches!(self.position, Position::At(_)))
    }

    fn is_null(&self, ordinal: usize) -> RowkitResult<bool> {
        Ok(self.cell(ordinal)?.is_null())
    }

    fn value(&self, ordinal: usize) -> RowkitResult<Value> {
        self.cell(ordinal).cloned()
    }

    fn get_text(&self, ordinal: usize) -> RowkitResult<String> {
        match self.cell(ordinal)? {
            Value::Text(v) => Ok(v.clone()),
            other => Err(crate::ConversionError::mismatch("String", ordinal, other).into()),
        }
    }

    fn next_result(&mut self) -> RowkitResult<bool> {
        self.check_open("next_result")?;
        if self.current + 1 < self.sets.len() {
            self.current += 1;
            self.position = Position::BeforeFirst;
            debug!(result_set = self.current, "memory cursor advanced to next result set");
            Ok(true)
        } else {
            self.position = Position::AfterLast;
            Ok(false)
        }
    }

    fn close(&mut self) -> RowkitResult<()> {
        if !self.closed {
            self.closed = true;
            debug!(result_sets = self.sets.len(), "memory cursor closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sets() -> Vec<ResultSetData> {
        vec![
            ResultSetData::new()
                .field("id", TypeTag::Int32)
                .row(vec![Value::Int32(1)])
                .row(vec![Value::Int32(2)]),
            ResultSetData::new()
                .field("name", TypeTag::Text)
                .row(vec![Value::from("x")]),
        ]
    }

    #[test]
    fn test_new_rejects_empty() {
        let result = MemoryCursor::new(vec![]);
        assert!(matches!(
            result,
            Err(crate::RowkitError::Validation(
                ValidationError::RequiredFieldMissing { .. }
            ))
        ));
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let set = ResultSetData::new()
            .field("a", TypeTag::Int32)
            .row(vec![Value::Int32(1), Value::Int32(2)]);
        assert!(MemoryCursor::single(set).is_err());
    }

    #[test]
    fn test_new_rejects_empty_field_name() {
        let set = ResultSetData::new().field("", TypeTag::Int32);
        assert!(MemoryCursor::single(set).is_err());
    }

    #[test]
    fn test_read_walks_rows_then_stops() {
        let mut cursor = MemoryCursor::new(two_sets()).unwrap();
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.value(0).unwrap(), Value::Int32(1));
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.get_i32(0).unwrap(), 2);
        assert!(!cursor.read().unwrap());
        assert!(!cursor.read().unwrap());
        assert!(cursor.value(0).is_err());
    }

    #[test]
    fn test_next_result_switches_schema() {
        let mut cursor = MemoryCursor::new(two_sets()).unwrap();
        assert_eq!(cursor.name(0).unwrap(), "id");
        assert!(cursor.next_result().unwrap());
        assert_eq!(cursor.name(0).unwrap(), "name");
        assert_eq!(cursor.field_type(0).unwrap(), TypeTag::Text);
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.get_text(0).unwrap(), "x");
        assert!(!cursor.next_result().unwrap());
    }

    #[test]
    fn test_ordinal_lookup() {
        let cursor = MemoryCursor::new(two_sets()).unwrap();
        assert_eq!(cursor.ordinal("id").unwrap(), 0);
        assert!(matches!(
            cursor.ordinal("missing"),
            Err(crate::RowkitError::Schema(SchemaError::FieldNotFound { .. }))
        ));
    }

    #[test]
    fn test_operations_after_close_fail() {
        let mut cursor = MemoryCursor::new(two_sets()).unwrap();
        cursor.close().unwrap();
        cursor.close().unwrap();
        assert!(cursor.is_closed());
        assert!(matches!(
            cursor.read(),
            Err(crate::RowkitError::State(StateError::Closed { .. }))
        ));
    }
}
