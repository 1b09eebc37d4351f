//! Reader decorators.
//!
//! [`WrappedRecordReader`] forwards everything to an inner reader and is the
//! building block for layering behaviour. [`FilteredRecordReader`] is built on
//! it and changes only `read`.

use crate::getter::Field;
use crate::{CursorDescriptor, Metadata, ReadState, Record, RecordReader, RowkitResult, StateError};

/// Transparent forwarding layer over an inner reader.
///
/// Closing the wrapper closes the inner reader exactly once, however many
/// times the wrapper itself is closed.
#[derive(Debug)]
pub struct WrappedRecordReader<R: RecordReader> {
    inner: R,
    closed: bool,
}

impl<R: RecordReader> WrappedRecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: RecordReader> Record for WrappedRecordReader<R> {
    fn descriptor(&self) -> CursorDescriptor<'_> {
        self.inner.descriptor()
    }

    fn metadata(&self) -> &Metadata {
        self.inner.metadata()
    }

    fn field(&self, ordinal: usize) -> RowkitResult<Field<'_>> {
        if self.closed {
            return Err(StateError::Closed {
                operation: "field access",
            }
            .into());
        }
        self.inner.field(ordinal)
    }
}

impl<R: RecordReader> RecordReader for WrappedRecordReader<R> {
    fn read(&mut self) -> RowkitResult<bool> {
        if self.closed {
            return Err(StateError::Closed { operation: "read" }.into());
        }
        self.inner.read()
    }

    fn close(&mut self) -> RowkitResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }

    fn state(&self) -> ReadState {
        if self.closed {
            ReadState::Closed
        } else {
            self.inner.state()
        }
    }
}

/// Reader that only stops on rows accepted by a predicate.
///
/// The predicate sees a read-only `&dyn Record` of the candidate row. Rows are
/// visited once, in inner order; once the inner reader runs dry, every later
/// `read` returns `false` without touching it again.
pub struct FilteredRecordReader<R, P>
where
    R: RecordReader,
    P: FnMut(&dyn Record) -> RowkitResult<bool>,
{
    inner: WrappedRecordReader<R>,
    predicate: P,
    exhausted: bool,
}

impl<R, P> FilteredRecordReader<R, P>
where
    R: RecordReader,
    P: FnMut(&dyn Record) -> RowkitResult<bool>,
{
    pub fn new(inner: R, predicate: P) -> Self {
        Self {
            inner: WrappedRecordReader::new(inner),
            predicate,
            exhausted: false,
        }
    }
}

impl<R, P> std::fmt::Debug for FilteredRecordReader<R, P>
where
    R: RecordReader + std::fmt::Debug,
    P: FnMut(&dyn Record) -> RowkitResult<bool>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredRecordReader")
            .field("inner", &self.inner)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl<R, P> Record for FilteredRecordReader<R, P>
where
    R: RecordReader,
    P: FnMut(&dyn Record) -> RowkitResult<bool>,
{
    fn descriptor(&self) -> CursorDescriptor<'_> {
        self.inner.descriptor()
    }

    fn metadata(&self) -> &Metadata {
        self.inner.metadata()
    }

    fn field(&self, ordinal: usize) -> RowkitResult<Field<'_>> {
        self.inner.field(ordinal)
    }
}

impl<R, P> RecordReader for FilteredRecordReader<R, P>
where
    R: RecordReader,
    P: FnMut(&dyn Record) -> RowkitResult<bool>,
{
    fn read(&mut self) -> RowkitResult<bool> {
        if self.inner.state() == ReadState::Closed {
            return Err(StateError::Closed { operation: "read" }.into());
        }
        if self.exhausted {
            return Ok(false);
        }
        while self.inner.read()? {
            if (self.predicate)(&self.inner)? {
                return Ok(true);
            }
        }
        self.exhausted = true;
        Ok(false)
    }

    fn close(&mut self) -> RowkitResult<()> {
        self.inner.close()
    }

    fn state(&self) -> ReadState {
        self.inner.state()
    }
}

/// Decorator constructors for any reader.
pub trait RecordReaderExt: RecordReader + Sized {
    fn wrapped(self) -> WrappedRecordReader<Self> {
        WrappedRecordReader::new(self)
    }

    fn filtered<P>(self, predicate: P) -> FilteredRecordReader<Self, P>
    where
        P: FnMut(&dyn Record) -> RowkitResult<bool>,
    {
        FilteredRecordReader::new(self, predicate)
    }
}

impl<R: RecordReader> RecordReaderExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CursorReader, MemoryCursor, RecordDescriptor, RecordExt, ResultSetData, RowkitError,
        TypeTag, Value,
    };
    use proptest::prelude::*;

    /// Inner reader that counts how often it is closed.
    struct CloseCounter {
        inner: CursorReader<MemoryCursor>,
        closes: usize,
    }

    impl Record for CloseCounter {
        fn descriptor(&self) -> CursorDescriptor<'_> {
            self.inner.descriptor()
        }
        fn metadata(&self) -> &Metadata {
            self.inner.metadata()
        }
        fn field(&self, ordinal: usize) -> RowkitResult<Field<'_>> {
            self.inner.field(ordinal)
        }
    }

    impl RecordReader for CloseCounter {
        fn read(&mut self) -> RowkitResult<bool> {
            self.inner.read()
        }
        fn close(&mut self) -> RowkitResult<()> {
            self.closes += 1;
            self.inner.close()
        }
        fn state(&self) -> ReadState {
            self.inner.state()
        }
    }

    fn ids(values: &[i32]) -> CursorReader<MemoryCursor> {
        let mut set = ResultSetData::new().field("id", TypeTag::Int32);
        for v in values {
            set = set.row(vec![Value::Int32(*v)]);
        }
        CursorReader::new(MemoryCursor::single(set).unwrap()).unwrap()
    }

    #[test]
    fn test_wrapped_forwards_everything() {
        let mut reader = ids(&[7, 8]).wrapped();
        assert_eq!(reader.descriptor().field_count(), 1);
        assert!(reader.read().unwrap());
        assert_eq!(reader.get::<i32>(0).unwrap(), 7);
        assert_eq!(reader.state(), ReadState::Positioned);
        assert!(reader.read().unwrap());
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn test_wrapped_close_reaches_inner_once() {
        let mut wrapper = WrappedRecordReader::new(CloseCounter {
            inner: ids(&[1]),
            closes: 0,
        });
        wrapper.close().unwrap();
        wrapper.close().unwrap();
        wrapper.close().unwrap();
        assert_eq!(wrapper.inner().closes, 1);
        assert_eq!(wrapper.state(), ReadState::Closed);
        assert!(wrapper.read().is_err());
    }

    #[test]
    fn test_filtered_scenario_id_greater_than_one() {
        let mut reader = ids(&[1, 2, 3]).filtered(|r| Ok(r.get::<i32>(0)? > 1));
        assert!(reader.read().unwrap());
        assert_eq!(reader.get::<i32>(0).unwrap(), 2);
        assert!(reader.read().unwrap());
        assert_eq!(reader.get::<i32>(0).unwrap(), 3);
        assert!(!reader.read().unwrap());
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn test_filtered_propagates_predicate_error() {
        let mut reader = ids(&[1]).filtered(|r| r.get::<String>(0).map(|s| s.is_empty()));
        assert!(reader.read().is_err());
    }

    #[test]
    fn test_filtered_close_closes_inner() {
        let mut reader = FilteredRecordReader::new(
            CloseCounter {
                inner: ids(&[1]),
                closes: 0,
            },
            |_| Ok(true),
        );
        reader.close().unwrap();
        reader.close().unwrap();
        assert_eq!(reader.state(), ReadState::Closed);
        assert_eq!(reader.inner.inner().closes, 1);
    }

    #[test]
    fn test_filtered_read_after_close_is_rejected() {
        let mut reader = ids(&[1, 2]).filtered(|r| Ok(r.get::<i32>(0)? > 5));
        assert!(!reader.read().unwrap());
        reader.close().unwrap();
        assert!(matches!(
            reader.read(),
            Err(RowkitError::State(StateError::Closed { operation: "read" }))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Filtered output is exactly the accepted inner rows, in order.
        #[test]
        fn prop_filter_matches_iterator_filter(
            values in prop::collection::vec(any::<i32>(), 0..40),
            threshold in any::<i32>(),
        ) {
            let mut reader = ids(&values).filtered(move |r| Ok(r.get::<i32>(0)? >= threshold));
            let mut seen = Vec::new();
            while reader.read().unwrap() {
                let v = reader.get::<i32>(0).unwrap();
                prop_assert!(v >= threshold);
                seen.push(v);
            }
            prop_assert!(!reader.read().unwrap());

            let expected: Vec<i32> = values.into_iter().filter(|v| *v >= threshold).collect();
            prop_assert_eq!(seen, expected);
        }
    }
}
