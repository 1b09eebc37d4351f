//! rowkit Test Utilities
//!
//! Shared test infrastructure for the rowkit workspace:
//! - Proptest generators for type tags, values, and result sets
//! - A call-counting cursor for observing what readers ask of their source
//! - Test fixtures for common scenarios
//! - Custom assertions for rowkit error variants

// Re-export core types for convenience
pub use rowkit_core::{
    canonical, BinaryEncoding, Column, ConfigError, ConversionError, Cursor, CursorDescriptor,
    CursorError, CursorReader, FieldDescriptor, FilteredRecordReader, FromField, Getter,
    MemoryCursor, MemoryField, Metadata, ReadState, Record, RecordDescriptor, RecordExt,
    RecordReader, RecordReaderExt, ResultSetData, ResultSets, RowkitConfig, RowkitError,
    RowkitResult, SchemaDescriptor, SchemaError, StateError, Table, TypeTag, ValidationError,
    Value, WrappedRecordReader,
};

use std::cell::Cell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`, defaulting to `warn`.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// COUNTING CURSOR
// ============================================================================

/// Per-operation call counts recorded by a [`CountingCursor`].
#[derive(Debug, Default)]
pub struct CallCounts {
    pub reads: Cell<usize>,
    pub is_null: Cell<usize>,
    /// Every value fetch: `value` and the typed `get_*` accessors.
    pub values: Cell<usize>,
    pub next_results: Cell<usize>,
    pub closes: Cell<usize>,
}

impl CallCounts {
    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}

/// Cursor decorator that counts the calls made to its inner cursor.
///
/// The counts are shared, so they stay observable after the cursor has been
/// moved into a reader.
#[derive(Debug)]
pub struct CountingCursor<C: Cursor> {
    inner: C,
    counts: Rc<CallCounts>,
}

impl<C: Cursor> CountingCursor<C> {
    pub fn new(inner: C) -> (Self, Rc<CallCounts>) {
        let counts = Rc::new(CallCounts::default());
        (
            Self {
                inner,
                counts: Rc::clone(&counts),
            },
            counts,
        )
    }
}

impl<C: Cursor> Cursor for CountingCursor<C> {
    fn field_count(&self) -> usize {
        self.inner.field_count()
    }

    fn name(&self, ordinal: usize) -> RowkitResult<&str> {
        self.inner.name(ordinal)
    }

    fn field_type(&self, ordinal: usize) -> RowkitResult<TypeTag> {
        self.inner.field_type(ordinal)
    }

    fn ordinal(&self, name: &str) -> RowkitResult<usize> {
        self.inner.ordinal(name)
    }

    fn read(&mut self) -> RowkitResult<bool> {
        CallCounts::bump(&self.counts.reads);
        self.inner.read()
    }

    fn is_null(&self, ordinal: usize) -> RowkitResult<bool> {
        CallCounts::bump(&self.counts.is_null);
        self.inner.is_null(ordinal)
    }

    fn value(&self, ordinal: usize) -> RowkitResult<Value> {
        CallCounts::bump(&self.counts.values);
        self.inner.value(ordinal)
    }

    fn get_bool(&self, ordinal: usize) -> RowkitResult<bool> {
        CallCounts::bump(&self.counts.values);
        self.inner.get_bool(ordinal)
    }

    fn get_i32(&self, ordinal: usize) -> RowkitResult<i32> {
        CallCounts::bump(&self.counts.values);
        self.inner.get_i32(ordinal)
    }

    fn get_i64(&self, ordinal: usize) -> RowkitResult<i64> {
        CallCounts::bump(&self.counts.values);
        self.inner.get_i64(ordinal)
    }

    fn get_f64(&self, ordinal: usize) -> RowkitResult<f64> {
        CallCounts::bump(&self.counts.values);
        self.inner.get_f64(ordinal)
    }

    fn get_text(&self, ordinal: usize) -> RowkitResult<String> {
        CallCounts::bump(&self.counts.values);
        self.inner.get_text(ordinal)
    }

    fn next_result(&mut self) -> RowkitResult<bool> {
        CallCounts::bump(&self.counts.next_results);
        self.inner.next_result()
    }

    fn close(&mut self) -> RowkitResult<()> {
        CallCounts::bump(&self.counts.closes);
        self.inner.close()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating rowkit values and result sets.

    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use std::str::FromStr;
    use uuid::Uuid;

    /// Any of the well-known tags.
    pub fn arb_well_known_tag() -> impl Strategy<Value = TypeTag> {
        prop::sample::select(TypeTag::WELL_KNOWN.to_vec())
    }

    /// Well-known tags plus the occasional source-specific one.
    pub fn arb_type_tag() -> impl Strategy<Value = TypeTag> {
        prop_oneof![
            8 => arb_well_known_tag(),
            1 => prop::sample::select(vec!["jsonb", "interval", "geometry"])
                .prop_map(|name| TypeTag::Other(name.to_string())),
        ]
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (1577836800i64..1893456000i64, 0u32..1_000_000u32).prop_map(|(secs, micros)| {
            DateTime::from_timestamp(secs, micros * 1_000).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a two-place decimal.
    pub fn arb_decimal() -> impl Strategy<Value = BigDecimal> {
        (any::<i32>(), 0u32..100).prop_map(|(whole, cents)| {
            BigDecimal::from_str(&format!("{}.{:02}", whole, cents)).unwrap_or_default()
        })
    }

    /// Non-null value of the variant `tag` declares.
    pub fn arb_value_for(tag: &TypeTag) -> BoxedStrategy<Value> {
        match tag {
            TypeTag::Boolean => any::<bool>().prop_map(Value::Boolean).boxed(),
            TypeTag::Int8 => any::<i8>().prop_map(Value::Int8).boxed(),
            TypeTag::Int16 => any::<i16>().prop_map(Value::Int16).boxed(),
            TypeTag::Int32 => any::<i32>().prop_map(Value::Int32).boxed(),
            TypeTag::Int64 => any::<i64>().prop_map(Value::Int64).boxed(),
            TypeTag::Char => any::<char>().prop_map(Value::Char).boxed(),
            TypeTag::Float32 => (-1.0e6f32..1.0e6f32).prop_map(Value::Float32).boxed(),
            TypeTag::Float64 => (-1.0e12f64..1.0e12f64).prop_map(Value::Float64).boxed(),
            TypeTag::Decimal => arb_decimal().prop_map(Value::Decimal).boxed(),
            TypeTag::Timestamp => arb_timestamp().prop_map(Value::Timestamp).boxed(),
            TypeTag::Uuid => any::<[u8; 16]>()
                .prop_map(|b| Value::Uuid(Uuid::from_bytes(b)))
                .boxed(),
            TypeTag::Bytes => prop::collection::vec(any::<u8>(), 0..64)
                .prop_map(Value::Bytes)
                .boxed(),
            TypeTag::Text => "[a-zA-Z0-9 _-]{0,24}".prop_map(Value::Text).boxed(),
            TypeTag::Other(_) => any::<i64>()
                .prop_map(|n| Value::Object(serde_json::json!({ "n": n })))
                .boxed(),
        }
    }

    /// Value for `tag`, null about one time in five.
    pub fn arb_nullable_value_for(tag: &TypeTag) -> BoxedStrategy<Value> {
        prop_oneof![
            1 => Just(Value::Null),
            4 => arb_value_for(tag),
        ]
        .boxed()
    }

    /// Row whose values fit `tags`, in order.
    pub fn arb_row(tags: &[TypeTag]) -> BoxedStrategy<Vec<Value>> {
        let columns: Vec<BoxedStrategy<Value>> = tags.iter().map(arb_nullable_value_for).collect();
        columns.boxed()
    }

    /// Result set with `1..=max_fields` fields named `f0`, `f1`, ... and up to
    /// `max_rows` rows that fit the schema.
    pub fn arb_result_set(
        max_fields: usize,
        max_rows: usize,
    ) -> impl Strategy<Value = ResultSetData> {
        prop::collection::vec(arb_type_tag(), 1..=max_fields.max(1)).prop_flat_map(move |tags| {
            let rows = prop::collection::vec(arb_row(&tags), 0..=max_rows);
            (Just(tags), rows).prop_map(|(tags, rows)| {
                let mut set = ResultSetData::new();
                for (ordinal, tag) in tags.into_iter().enumerate() {
                    set = set.field(format!("f{}", ordinal), tag);
                }
                set.rows = rows;
                set
            })
        })
    }

    /// Sequence of `1..=max_sets` result sets.
    pub fn arb_result_sets(
        max_sets: usize,
        max_fields: usize,
        max_rows: usize,
    ) -> impl Strategy<Value = Vec<ResultSetData>> {
        prop::collection::vec(arb_result_set(max_fields, max_rows), 1..=max_sets.max(1))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built result sets and readers for common test scenarios.

    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Utc};
    use std::str::FromStr;
    use uuid::Uuid;

    /// `id: int32, name: text` with rows (1, "a"), (2, "b"), (3, "c").
    pub fn id_name_set() -> ResultSetData {
        ResultSetData::new()
            .field("id", TypeTag::Int32)
            .field("name", TypeTag::Text)
            .row(vec![Value::Int32(1), Value::from("a")])
            .row(vec![Value::Int32(2), Value::from("b")])
            .row(vec![Value::Int32(3), Value::from("c")])
    }

    pub fn id_name_cursor() -> MemoryCursor {
        MemoryCursor::single(id_name_set()).expect("id/name fixture is well formed")
    }

    pub fn id_name_reader() -> CursorReader<MemoryCursor> {
        CursorReader::new(id_name_cursor()).expect("build id/name reader")
    }

    /// `count` result sets; set `i` has a single `set_i: int64` column and
    /// `i + 1` rows holding `0..=i`.
    pub fn multi_result_sets(count: usize) -> Vec<ResultSetData> {
        (0..count)
            .map(|i| {
                let mut set = ResultSetData::new().field(format!("set_{}", i), TypeTag::Int64);
                for row in 0..=i as i64 {
                    set = set.row(vec![Value::Int64(row)]);
                }
                set
            })
            .collect()
    }

    pub fn multi_result_cursor(count: usize) -> MemoryCursor {
        MemoryCursor::new(multi_result_sets(count))
            .expect("multi result set fixture is well formed")
    }

    /// Fixed timestamp used by the all-types fixture.
    pub fn fixed_timestamp() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 123_000_000).unwrap_or_else(Utc::now)
    }

    /// Fixed UUID used by the all-types fixture.
    pub fn fixed_uuid() -> Uuid {
        Uuid::from_u128(0x0190_1234_5678_7abc_8def_0123_4567_89ab)
    }

    /// One column per well-known tag plus a `jsonb` column, in
    /// [`TypeTag::WELL_KNOWN`] order.
    pub fn all_types_tags() -> Vec<TypeTag> {
        let mut tags = TypeTag::WELL_KNOWN.to_vec();
        tags.push(TypeTag::Other("jsonb".to_string()));
        tags
    }

    /// A non-null row matching [`all_types_tags`].
    pub fn all_types_row() -> Vec<Value> {
        vec![
            Value::Boolean(true),
            Value::Int8(-8),
            Value::Int16(1600),
            Value::Int32(320_000),
            Value::Int64(6_400_000_000),
            Value::Char('r'),
            Value::Float32(1.5),
            Value::Float64(-2.25),
            Value::Decimal(BigDecimal::from_str("1234.56").unwrap_or_default()),
            Value::Timestamp(fixed_timestamp()),
            Value::Uuid(fixed_uuid()),
            Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            Value::from("hello"),
            Value::Object(serde_json::json!({ "k": [1, 2] })),
        ]
    }

    /// Result set over [`all_types_tags`] with one full row and one all-null row.
    pub fn all_types_set() -> ResultSetData {
        let tags = all_types_tags();
        let nulls = vec![Value::Null; tags.len()];
        let mut set = ResultSetData::new();
        for tag in tags {
            set = set.field(format!("c_{}", tag.name()), tag);
        }
        set.row(all_types_row()).row(nulls)
    }

    pub fn all_types_reader() -> CursorReader<MemoryCursor> {
        let cursor =
            MemoryCursor::single(all_types_set()).expect("all-types fixture is well formed");
        CursorReader::new(cursor).expect("build all-types reader")
    }

    pub fn lenient_config() -> RowkitConfig {
        RowkitConfig {
            strict_state: false,
            ..RowkitConfig::default()
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for rowkit error variants and tables.

    use super::*;

    /// Assert that a RowkitResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a RowkitResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that a RowkitResult is a Schema error.
    #[track_caller]
    pub fn assert_schema_error<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::Schema(_)) => {}
            other => panic!("Expected Schema error, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is an OrdinalOutOfRange error for `ordinal`.
    #[track_caller]
    pub fn assert_ordinal_out_of_range<T: std::fmt::Debug>(
        result: &RowkitResult<T>,
        ordinal: usize,
    ) {
        match result {
            Err(RowkitError::Schema(SchemaError::OrdinalOutOfRange { ordinal: o, .. })) => {
                assert_eq!(*o, ordinal, "Wrong ordinal in OrdinalOutOfRange error");
            }
            other => panic!("Expected OrdinalOutOfRange({}), got: {:?}", ordinal, other),
        }
    }

    /// Assert that a RowkitResult is a FieldNotFound error for `name`.
    #[track_caller]
    pub fn assert_field_not_found<T: std::fmt::Debug>(result: &RowkitResult<T>, name: &str) {
        match result {
            Err(RowkitError::Schema(SchemaError::FieldNotFound { name: n })) => {
                assert_eq!(n, name, "Wrong name in FieldNotFound error");
            }
            other => panic!("Expected FieldNotFound({}), got: {:?}", name, other),
        }
    }

    /// Assert that a RowkitResult is a Conversion error.
    #[track_caller]
    pub fn assert_conversion_error<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::Conversion(_)) => {}
            other => panic!("Expected Conversion error, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is an Unsupported conversion error.
    #[track_caller]
    pub fn assert_unsupported<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::Conversion(ConversionError::Unsupported { .. })) => {}
            other => panic!("Expected Unsupported conversion, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is a NullValue conversion error.
    #[track_caller]
    pub fn assert_null_value<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::Conversion(ConversionError::NullValue { .. })) => {}
            other => panic!("Expected NullValue conversion error, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is a State error.
    #[track_caller]
    pub fn assert_state_error<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::State(_)) => {}
            other => panic!("Expected State error, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is a NotPositioned error raised in `state`.
    #[track_caller]
    pub fn assert_not_positioned<T: std::fmt::Debug>(result: &RowkitResult<T>, state: ReadState) {
        match result {
            Err(RowkitError::State(StateError::NotPositioned { state: s, .. })) => {
                assert_eq!(*s, state.name(), "Wrong state in NotPositioned error");
            }
            other => panic!("Expected NotPositioned({:?}), got: {:?}", state, other),
        }
    }

    /// Assert that a RowkitResult is a Closed state error.
    #[track_caller]
    pub fn assert_closed<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::State(StateError::Closed { .. })) => {}
            other => panic!("Expected Closed error, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is a Cursor error.
    #[track_caller]
    pub fn assert_cursor_error<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::Cursor(_)) => {}
            other => panic!("Expected Cursor error, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is a Validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a RowkitResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &RowkitResult<T>) {
        match result {
            Err(RowkitError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert that a table has one column per descriptor field, same name,
    /// type, and order.
    #[track_caller]
    pub fn assert_table_matches_descriptor(table: &Table, descriptor: &dyn RecordDescriptor) {
        assert_eq!(
            table.columns().len(),
            descriptor.field_count(),
            "Column count does not match field count"
        );
        for (ordinal, column) in table.columns().iter().enumerate() {
            let name = descriptor.field_name(ordinal).expect("descriptor field name");
            let field_type = descriptor.field_type(ordinal).expect("descriptor field type");
            assert_eq!(column.name, name, "Column {} name mismatch", ordinal);
            assert_eq!(column.field_type, field_type, "Column {} type mismatch", ordinal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertions::assert_ok;
    use proptest::prelude::*;

    #[test]
    fn test_counting_cursor_shares_counts() {
        let (cursor, counts) = CountingCursor::new(fixtures::id_name_cursor());
        let mut reader = CursorReader::new(cursor).unwrap();
        reader.read().unwrap();
        let _: i32 = reader.get(0).unwrap();
        reader.close().unwrap();
        assert_eq!(counts.reads.get(), 1);
        assert_eq!(counts.values.get(), 1);
        assert_eq!(counts.closes.get(), 1);
    }

    #[test]
    fn test_all_types_fixture_matches_tags() {
        let tags = fixtures::all_types_tags();
        let row = fixtures::all_types_row();
        assert_eq!(tags.len(), row.len());
        for (value, tag) in row.iter().zip(tags.iter()) {
            assert!(value.fits(tag), "{} does not fit {}", value.kind(), tag);
        }
        assert_ok(&MemoryCursor::single(fixtures::all_types_set()).map(|_| ()));
    }

    proptest! {
        #[test]
        fn prop_generated_values_fit_their_tag(
            (tag, value) in generators::arb_type_tag()
                .prop_flat_map(|tag| (Just(tag.clone()), generators::arb_nullable_value_for(&tag)))
        ) {
            prop_assert!(value.fits(&tag));
        }

        #[test]
        fn prop_generated_result_sets_are_valid(sets in generators::arb_result_sets(3, 4, 6)) {
            prop_assert!(MemoryCursor::new(sets).is_ok());
        }
    }
}
