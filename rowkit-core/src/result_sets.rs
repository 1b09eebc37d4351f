//! Lazy, single-pass sequence of readers over a multi-result-set cursor.
//!
//! [`ResultSets`] owns the cursor. Each call to [`ResultSets::next_reader`]
//! hands out a reader that borrows the cursor mutably, so a reader for an
//! earlier result set cannot be used once a later one has been requested.
//! Readers produced here never close the cursor; the sequence closes it once,
//! when it is drained or closed, and otherwise when it is dropped.
//!
//! A reader must be dropped before the next one is requested:
//!
//! ```
//! use rowkit_core::{MemoryCursor, RecordReader, ResultSetData, ResultSets, TypeTag, Value};
//!
//! let cursor = MemoryCursor::new(vec![
//!     ResultSetData::new().field("a", TypeTag::Int32).row(vec![Value::Int32(1)]),
//!     ResultSetData::new().field("b", TypeTag::Text),
//! ])?;
//! let mut sets = ResultSets::new(cursor);
//! let mut rows = 0;
//! while let Some(mut reader) = sets.next_reader()? {
//!     while reader.read()? {
//!         rows += 1;
//!     }
//! }
//! assert_eq!(rows, 1);
//! assert_eq!(sets.produced(), 2);
//! # Ok::<(), rowkit_core::RowkitError>(())
//! ```

use crate::{Cursor, CursorReader, RowkitConfig, RowkitResult, Table};
use tracing::{debug, warn};

/// Pull-based producer of one reader per result set.
pub struct ResultSets<C: Cursor> {
    cursor: C,
    config: RowkitConfig,
    started: bool,
    drained: bool,
    closed: bool,
    produced: usize,
}

impl<C: Cursor> ResultSets<C> {
    /// Sequence over `cursor`, which must be positioned on its first result set.
    pub fn new(cursor: C) -> Self {
        Self::with_config(cursor, RowkitConfig::default())
    }

    pub fn with_config(cursor: C, config: RowkitConfig) -> Self {
        Self {
            cursor,
            config,
            started: false,
            drained: false,
            closed: false,
            produced: 0,
        }
    }

    /// Reader over the next result set, or `None` once the cursor has no more.
    ///
    /// The first call yields the result set the cursor is already on; later
    /// calls advance the cursor first. Rows the previous reader left unread
    /// are skipped by the cursor. Reaching the end closes the cursor.
    pub fn next_reader(&mut self) -> RowkitResult<Option<CursorReader<&mut C>>> {
        if self.drained {
            return Ok(None);
        }

        if self.started && !self.cursor.next_result()? {
            debug!(result_sets = self.produced, "result sets drained");
            self.close()?;
            return Ok(None);
        }
        self.started = true;

        let index = self.produced;
        self.produced += 1;
        debug!(result_set = index, "producing reader for result set");
        CursorReader::shared(&mut self.cursor, self.config.clone()).map(Some)
    }

    /// Hand each remaining reader to `f`, in order.
    pub fn for_each_reader<F>(&mut self, mut f: F) -> RowkitResult<()>
    where
        F: FnMut(usize, CursorReader<&mut C>) -> RowkitResult<()>,
    {
        let mut index = self.produced;
        while let Some(reader) = self.next_reader()? {
            f(index, reader)?;
            index += 1;
        }
        Ok(())
    }

    /// Materialize every remaining result set into its own table.
    pub fn drain_to_tables(mut self) -> RowkitResult<Vec<Table>> {
        let config = self.config.clone();
        let mut tables = Vec::new();
        self.for_each_reader(|_, reader| {
            tables.push(Table::from_reader_with_config(reader, &config)?);
            Ok(())
        })?;
        Ok(tables)
    }

    /// Number of readers handed out so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Close the shared cursor. Idempotent; ends the sequence.
    pub fn close(&mut self) -> RowkitResult<()> {
        self.drained = true;
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("closing result set cursor");
        self.cursor.close()
    }
}

impl<C: Cursor> std::fmt::Debug for ResultSets<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSets")
            .field("produced", &self.produced)
            .field("drained", &self.drained)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<C: Cursor> Drop for ResultSets<C> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.cursor.close() {
                warn!(error = %e, "closing result set cursor on drop failed");
            }
        }
    }
}
