//! rowkit Core - Typed Record Access
//!
//! Strongly-typed, forward-only record readers over dynamically-typed row
//! cursors. A [`Cursor`] yields boxed [`Value`]s; a [`CursorReader`] resolves
//! one getter per column when it is built and then serves typed reads through
//! [`RecordExt::get`]. Readers compose ([`WrappedRecordReader`],
//! [`FilteredRecordReader`]), a multi-result-set cursor becomes a lazy
//! [`ResultSets`] sequence, and any reader can be materialized into a
//! [`Table`].
//!
//! ```
//! use rowkit_core::{
//!     CursorReader, MemoryCursor, RecordExt, RecordReader, RecordReaderExt, ResultSetData,
//!     TypeTag, Value,
//! };
//!
//! let cursor = MemoryCursor::single(
//!     ResultSetData::new()
//!         .field("id", TypeTag::Int32)
//!         .field("name", TypeTag::Text)
//!         .row(vec![Value::Int32(1), Value::from("a")])
//!         .row(vec![Value::Int32(2), Value::from("b")]),
//! )?;
//! let mut reader = CursorReader::new(cursor)?.filtered(|r| Ok(r.get::<i32>(0)? > 1));
//! assert!(reader.read()?);
//! assert_eq!(reader.get_by_name::<String>("name")?, "b");
//! assert!(!reader.read()?);
//! # Ok::<(), rowkit_core::RowkitError>(())
//! ```

pub mod canonical;
mod config;
mod cursor;
mod decorator;
mod descriptor;
mod error;
mod getter;
mod memory;
mod reader;
mod record;
mod result_sets;
mod table;
mod value;

// ============================================================================
// ERRORS
// ============================================================================

pub use error::{
    ConfigError, ConversionError, CursorError, RowkitError, RowkitResult, SchemaError,
    StateError, ValidationError,
};

// ============================================================================
// VALUES AND SOURCES
// ============================================================================

pub use cursor::Cursor;
pub use memory::{MemoryCursor, MemoryField, ResultSetData};
pub use value::{TypeTag, Value};

// ============================================================================
// SCHEMA AND GETTERS
// ============================================================================

pub use descriptor::{CursorDescriptor, FieldDescriptor, RecordDescriptor, SchemaDescriptor};
pub use getter::{extract, resolve_all, Field, FromField, Getter, ResolvedGetter};

// ============================================================================
// CONFIGURATION
// ============================================================================

pub use config::{BinaryEncoding, RowkitConfig, MAX_ROW_CAPACITY_HINT};

// ============================================================================
// RECORDS AND READERS
// ============================================================================

pub use decorator::{FilteredRecordReader, RecordReaderExt, WrappedRecordReader};
pub use reader::{CursorReader, ReadState, RecordReader};
pub use record::{Metadata, Record, RecordExt};
pub use result_sets::ResultSets;
pub use table::{Column, Table};
