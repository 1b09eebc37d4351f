//! In-memory table materialization.

use crate::{
    canonical, RecordDescriptor, RecordExt, RecordReader, RowkitConfig, RowkitResult,
    SchemaDescriptor, TypeTag, ValidationError, Value,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Column of a materialized table, mirrored from a field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub field_type: TypeTag,
}

/// Rows read from a reader, plus a detached copy of the schema they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    schema: SchemaDescriptor,
}

impl Table {
    /// Empty table with one column per field of `descriptor`.
    pub fn create(descriptor: &dyn RecordDescriptor) -> RowkitResult<Self> {
        let schema = descriptor.copy()?;
        let columns = schema
            .fields()
            .iter()
            .map(|f| Column {
                name: f.name.clone(),
                field_type: f.field_type.clone(),
            })
            .collect();
        Ok(Self {
            columns,
            rows: Vec::new(),
            schema,
        })
    }

    /// Read `reader` to the end into a new table, closing it either way.
    pub fn from_reader<R: RecordReader>(reader: R) -> RowkitResult<Self> {
        Self::from_reader_with_config(reader, &RowkitConfig::default())
    }

    /// Like [`Table::from_reader`], reserving `row_capacity_hint` rows up
    /// front. An invalid config is rejected before any row is read.
    pub fn from_reader_with_config<R: RecordReader>(
        mut reader: R,
        config: &RowkitConfig,
    ) -> RowkitResult<Self> {
        let created = config
            .validate()
            .and_then(|()| Self::create(&reader.descriptor()));
        let mut table = match created {
            Ok(table) => table,
            Err(e) => {
                if let Err(close_err) = reader.close() {
                    warn!(error = %close_err, "closing reader after table setup failure failed");
                }
                return Err(e);
            }
        };
        table.rows.reserve(config.row_capacity_hint);
        table.load(reader)?;
        Ok(table)
    }

    /// Append every remaining row of `reader`, then close it.
    ///
    /// The reader is closed on success and on failure. Rows appended before a
    /// failure stay in the table; a read error takes precedence over a close
    /// error. Returns the number of rows appended.
    pub fn load<R: RecordReader>(&mut self, mut reader: R) -> RowkitResult<usize> {
        let appended = self.append_rows(&mut reader);
        let closed = reader.close();
        let appended = appended?;
        closed?;
        debug!(rows = appended, columns = self.columns.len(), "table loaded");
        Ok(appended)
    }

    fn append_rows<R: RecordReader>(&mut self, reader: &mut R) -> RowkitResult<usize> {
        let field_count = reader.field_count();
        if field_count != self.columns.len() {
            return Err(ValidationError::InvalidValue {
                field: "reader".to_string(),
                reason: format!(
                    "reader has {} fields but the table has {} columns",
                    field_count,
                    self.columns.len()
                ),
            }
            .into());
        }

        let mut buffer = vec![Value::Null; field_count];
        let mut appended = 0;
        while reader.read()? {
            reader.values(&mut buffer)?;
            self.rows.push(buffer.clone());
            appended += 1;
        }
        Ok(appended)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Detached schema of the reader this table was created from.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Every cell in canonical text form, `None` for nulls.
    pub fn to_text_rows(&self, config: &RowkitConfig) -> Vec<Vec<Option<String>>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| canonical::format(v, config.binary_encoding))
                    .collect()
            })
            .collect()
    }

    /// `{"columns": [{"name", "type"}], "rows": [[...]]}`.
    pub fn to_json(&self, config: &RowkitConfig) -> serde_json::Value {
        let columns: Vec<serde_json::Value> = self
            .columns
            .iter()
            .map(|c| serde_json::json!({ "name": c.name, "type": c.field_type.name() }))
            .collect();
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                serde_json::Value::Array(
                    row.iter()
                        .map(|v| canonical::to_json(v, config.binary_encoding))
                        .collect(),
                )
            })
            .collect();
        serde_json::json!({ "columns": columns, "rows": rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CursorReader, MemoryCursor, Record, RecordReaderExt, ResultSetData, RowkitError};

    fn id_name() -> ResultSetData {
        ResultSetData::new()
            .field("id", TypeTag::Int32)
            .field("name", TypeTag::Text)
            .row(vec![Value::Int32(1), Value::from("a")])
            .row(vec![Value::Int32(2), Value::Null])
            .row(vec![Value::Int32(3), Value::from("c")])
    }

    fn reader() -> CursorReader<MemoryCursor> {
        CursorReader::new(MemoryCursor::single(id_name()).unwrap()).unwrap()
    }

    #[test]
    fn test_create_mirrors_descriptor() {
        let reader = reader();
        let table = Table::create(&reader.descriptor()).unwrap();
        assert_eq!(
            table.columns(),
            &[
                Column {
                    name: "id".to_string(),
                    field_type: TypeTag::Int32
                },
                Column {
                    name: "name".to_string(),
                    field_type: TypeTag::Text
                },
            ]
        );
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.schema().field_ordinal("name").unwrap(), 1);
    }

    #[test]
    fn test_from_reader_keeps_source_order() {
        let table = Table::from_reader(reader()).unwrap();
        assert_eq!(
            table.rows(),
            &[
                vec![Value::Int32(1), Value::from("a")],
                vec![Value::Int32(2), Value::Null],
                vec![Value::Int32(3), Value::from("c")],
            ]
        );
    }

    #[test]
    fn test_from_filtered_reader() {
        let filtered = reader().filtered(|r| Ok(r.get::<i32>(0)? != 2));
        let table = Table::from_reader(filtered).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_from_reader_rejects_oversized_capacity_hint() {
        let mut cursor = MemoryCursor::single(id_name()).unwrap();
        let config = RowkitConfig {
            row_capacity_hint: usize::MAX,
            ..RowkitConfig::default()
        };
        let reader = CursorReader::new(&mut cursor).unwrap();
        let result = Table::from_reader_with_config(reader, &config);
        assert!(matches!(result, Err(RowkitError::Config(_))));
        assert!(cursor.is_closed());
    }

    #[test]
    fn test_load_keeps_partial_rows_on_error() {
        let set = ResultSetData::new()
            .field("id", TypeTag::Int32)
            .row(vec![Value::Int32(1)])
            .row(vec![Value::Int32(2)]);
        let mut table = Table::create(&crate::SchemaDescriptor::new([("id", TypeTag::Int32)]))
            .unwrap();
        let failing = CursorReader::new(MemoryCursor::single(set).unwrap())
            .unwrap()
            .filtered(|r| {
                if r.get::<i32>(0)? == 2 {
                    Err(RowkitError::from(ValidationError::InvalidValue {
                        field: "id".to_string(),
                        reason: "boom".to_string(),
                    }))
                } else {
                    Ok(true)
                }
            });
        assert!(table.load(failing).is_err());
        assert_eq!(table.rows(), &[vec![Value::Int32(1)]]);
    }

    #[test]
    fn test_load_rejects_schema_mismatch() {
        let mut table =
            Table::create(&crate::SchemaDescriptor::new([("only", TypeTag::Int64)])).unwrap();
        assert!(matches!(
            table.load(reader()),
            Err(RowkitError::Validation(_))
        ));
    }

    #[test]
    fn test_text_and_json_exports() {
        let table = Table::from_reader(reader()).unwrap();
        let config = RowkitConfig::default();
        let text = table.to_text_rows(&config);
        assert_eq!(text[1], vec![Some("2".to_string()), None]);

        let json = table.to_json(&config);
        assert_eq!(json["columns"][0]["type"], "int32");
        assert_eq!(json["rows"][0], serde_json::json!([1, "a"]));
    }
}
