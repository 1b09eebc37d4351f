//! The cursor contract rowkit reads from.
//!
//! A cursor is a forward-only, dynamically-typed row provider. Fields are
//! addressed by ordinal and values come back boxed as [`Value`]. A cursor may
//! expose several result sets in sequence; it is positioned on the first one
//! when handed to rowkit.
//!
//! Implementations may assume ordinals have already been range-checked by the
//! record layer, but must still fail rather than panic on a bad ordinal.

use crate::{ConversionError, RowkitResult, TypeTag, Value};

/// Sequential tabular row source.
pub trait Cursor {
    /// Number of fields in the current result set.
    fn field_count(&self) -> usize;

    /// Name of the field at `ordinal`.
    fn name(&self, ordinal: usize) -> RowkitResult<&str>;

    /// Declared type of the field at `ordinal`.
    fn field_type(&self, ordinal: usize) -> RowkitResult<TypeTag>;

    /// Ordinal of the first field called `name`.
    fn ordinal(&self, name: &str) -> RowkitResult<usize>;

    /// Advance to the next row. `false` once the result set is exhausted.
    fn read(&mut self) -> RowkitResult<bool>;

    /// Whether the field at `ordinal` of the current row is null.
    fn is_null(&self, ordinal: usize) -> RowkitResult<bool>;

    /// Raw value of the field at `ordinal` of the current row.
    fn value(&self, ordinal: usize) -> RowkitResult<Value>;

    fn get_bool(&self, ordinal: usize) -> RowkitResult<bool> {
        match self.value(ordinal)? {
            Value::Boolean(v) => Ok(v),
            other => Err(ConversionError::mismatch("bool", ordinal, &other).into()),
        }
    }

    fn get_i32(&self, ordinal: usize) -> RowkitResult<i32> {
        match self.value(ordinal)? {
            Value::Int32(v) => Ok(v),
            other => Err(ConversionError::mismatch("i32", ordinal, &other).into()),
        }
    }

    fn get_i64(&self, ordinal: usize) -> RowkitResult<i64> {
        match self.value(ordinal)? {
            Value::Int64(v) => Ok(v),
            other => Err(ConversionError::mismatch("i64", ordinal, &other).into()),
        }
    }

    fn get_f64(&self, ordinal: usize) -> RowkitResult<f64> {
        match self.value(ordinal)? {
            Value::Float64(v) => Ok(v),
            other => Err(ConversionError::mismatch("f64", ordinal, &other).into()),
        }
    }

    fn get_text(&self, ordinal: usize) -> RowkitResult<String> {
        match self.value(ordinal)? {
            Value::Text(v) => Ok(v),
            other => Err(ConversionError::mismatch("String", ordinal, &other).into()),
        }
    }

    /// Move to the next result set. `false` when there is none.
    fn next_result(&mut self) -> RowkitResult<bool>;

    /// Release the underlying resource. Must tolerate repeated calls.
    fn close(&mut self) -> RowkitResult<()>;
}

macro_rules! forward_cursor {
    ($($ptr:ty),*) => {
        $(
            impl<C: Cursor + ?Sized> Cursor for $ptr {
                fn field_count(&self) -> usize {
                    (**self).field_count()
                }
                fn name(&self, ordinal: usize) -> RowkitResult<&str> {
                    (**self).name(ordinal)
                }
                fn field_type(&self, ordinal: usize) -> RowkitResult<TypeTag> {
                    (**self).field_type(ordinal)
                }
                fn ordinal(&self, name: &str) -> RowkitResult<usize> {
                    (**self).ordinal(name)
                }
                fn read(&mut self) -> RowkitResult<bool> {
                    (**self).read()
                }
                fn is_null(&self, ordinal: usize) -> RowkitResult<bool> {
                    (**self).is_null(ordinal)
                }
                fn value(&self, ordinal: usize) -> RowkitResult<Value> {
                    (**self).value(ordinal)
                }
                fn get_bool(&self, ordinal: usize) -> RowkitResult<bool> {
                    (**self).get_bool(ordinal)
                }
                fn get_i32(&self, ordinal: usize) -> RowkitResult<i32> {
                    (**self).get_i32(ordinal)
                }
                fn get_i64(&self, ordinal: usize) -> RowkitResult<i64> {
                    (**self).get_i64(ordinal)
                }
                fn get_f64(&self, ordinal: usize) -> RowkitResult<f64> {
                    (**self).get_f64(ordinal)
                }
                fn get_text(&self, ordinal: usize) -> RowkitResult<String> {
                    (**self).get_text(ordinal)
                }
                fn next_result(&mut self) -> RowkitResult<bool> {
                    (**self).next_result()
                }
                fn close(&mut self) -> RowkitResult<()> {
                    (**self).close()
                }
            }
        )*
    };
}

forward_cursor!(&mut C, Box<C>);
