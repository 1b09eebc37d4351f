//! Forward-only record readers.
//!
//! [`CursorReader`] is the base reader: it binds a cursor to the getters
//! resolved from the cursor's schema at construction and walks rows through
//! the state machine
//!
//! ```text
//! Unstarted --read()=true--> Positioned --read()=true--> Positioned ...
//!     |                          |
//!     +------read()=false--------+----read()=false--> Exhausted
//! any state --close()--> Closed
//! ```
//!
//! Field access is valid only while `Positioned` (unless
//! [`RowkitConfig::strict_state`] is off).
//!
//! # Release
//!
//! An owning reader closes its cursor on [`RecordReader::close`]. Dropping an
//! unclosed reader also closes it, but a failure there can only be logged, so
//! callers that care about close errors must call `close` themselves.

use crate::descriptor::check_ordinal;
use crate::getter::{resolve_all, Field, ResolvedGetter};
use crate::{
    Cursor, CursorDescriptor, Metadata, Record, RowkitConfig, RowkitResult, StateError,
};
use tracing::{debug, trace, warn};

/// Position of a reader in its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Unstarted,
    Positioned,
    Exhausted,
    Closed,
}

impl ReadState {
    pub fn name(self) -> &'static str {
        match self {
            ReadState::Unstarted => "unstarted",
            ReadState::Positioned => "positioned",
            ReadState::Exhausted => "exhausted",
            ReadState::Closed => "closed",
        }
    }
}

/// A [`Record`] that can advance.
pub trait RecordReader: Record {
    /// Advance to the next row. `false` once the result set is exhausted.
    fn read(&mut self) -> RowkitResult<bool>;

    /// Release resources. Idempotent.
    fn close(&mut self) -> RowkitResult<()>;

    fn state(&self) -> ReadState;
}

/// Base reader over a cursor positioned on one result set.
pub struct CursorReader<C: Cursor> {
    cursor: C,
    getters: Box<[ResolvedGetter]>,
    metadata: Metadata,
    config: RowkitConfig,
    state: ReadState,
    owns_cursor: bool,
}

impl<C: Cursor> CursorReader<C> {
    /// Reader that owns `cursor` and closes it.
    pub fn new(cursor: C) -> RowkitResult<Self> {
        Self::with_config(cursor, RowkitConfig::default())
    }

    pub fn with_config(cursor: C, config: RowkitConfig) -> RowkitResult<Self> {
        Self::build(cursor, config, true)
    }

    /// Reader over a cursor someone else releases.
    pub(crate) fn shared(cursor: C, config: RowkitConfig) -> RowkitResult<Self> {
        Self::build(cursor, config, false)
    }

    fn build(cursor: C, config: RowkitConfig, owns_cursor: bool) -> RowkitResult<Self> {
        config.validate()?;
        let getters = resolve_all(&cursor)?;
        debug!(
            field_count = getters.len(),
            fallback_fields = getters.iter().filter(|g| g.getter.is_fallback()).count(),
            owns_cursor,
            "resolved record getters"
        );
        Ok(Self {
            cursor,
            getters,
            metadata: Metadata::new(),
            config,
            state: ReadState::Unstarted,
            owns_cursor,
        })
    }

    /// Getters resolved at construction, indexed by ordinal.
    pub fn getters(&self) -> &[ResolvedGetter] {
        &self.getters
    }

    pub fn config(&self) -> &RowkitConfig {
        &self.config
    }
}

impl<C: Cursor> std::fmt::Debug for CursorReader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorReader")
            .field("getters", &self.getters)
            .field("state", &self.state)
            .field("owns_cursor", &self.owns_cursor)
            .finish()
    }
}

impl<C: Cursor> Record for CursorReader<C> {
    fn descriptor(&self) -> CursorDescriptor<'_> {
        CursorDescriptor::new(&self.cursor)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn field(&self, ordinal: usize) -> RowkitResult<Field<'_>> {
        if self.state == ReadState::Closed {
            return Err(StateError::Closed {
                operation: "field access",
            }
            .into());
        }
        check_ordinal(ordinal, self.getters.len())?;
        if self.config.strict_state && self.state != ReadState::Positioned {
            return Err(StateError::NotPositioned {
                operation: "field access",
                state: self.state.name(),
            }
            .into());
        }
        Ok(Field::new(
            &self.cursor,
            ordinal,
            &self.getters[ordinal],
            self.config.binary_encoding,
        ))
    }
}

impl<C: Cursor> RecordReader for CursorReader<C> {
    fn read(&mut self) -> RowkitResult<bool> {
        if self.state == ReadState::Closed {
            return Err(StateError::Closed { operation: "read" }.into());
        }
        let has_row = self.cursor.read()?;
        self.state = if has_row {
            ReadState::Positioned
        } else {
            ReadState::Exhausted
        };
        trace!(state = self.state.name(), "reader advanced");
        Ok(has_row)
    }

    fn close(&mut self) -> RowkitResult<()> {
        if self.state == ReadState::Closed {
            return Ok(());
        }
        self.state = ReadState::Closed;
        if self.owns_cursor {
            debug!("closing reader cursor");
            self.cursor.close()?;
        }
        Ok(())
    }

    fn state(&self) -> ReadState {
        self.state
    }
}

impl<C: Cursor> Drop for CursorReader<C> {
    fn drop(&mut self) {
        if self.state != ReadState::Closed && self.owns_cursor {
            if let Err(e) = self.cursor.close() {
                warn!(error = %e, "closing cursor on drop failed");
            }
        }
    }
}
