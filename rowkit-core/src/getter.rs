//! Getter registry and typed value extraction.
//!
//! Each column's declared [`TypeTag`] is resolved once, when a reader is
//! built, into a [`Getter`]: a stateless conversion strategy. The registry is
//! a closed, immutable map from the well-known tags to their getters; any tag
//! not in it (every `TypeTag::Other`) resolves to [`Getter::Fallback`], which
//! treats values as opaque and offers best-effort text.
//!
//! Output types implement [`FromField`]. A conversion first asks the output
//! type whether the column's getter supports it and fails with
//! `ConversionError::Unsupported` otherwise, so the per-row path never
//! re-inspects the declared type.
//!
//! | Output type            | Supported by                   |
//! |------------------------|--------------------------------|
//! | `bool`                 | `Boolean`                      |
//! | `i8` `i16` `i32` `i64` | `Int8` `Int16` `Int32` `Int64` |
//! | `char`                 | `Char`                         |
//! | `f32` `f64`            | `Float32` `Float64`            |
//! | `BigDecimal`           | `Decimal`                      |
//! | `DateTime<Utc>`        | `Timestamp`                    |
//! | `Uuid`                 | `Uuid`                         |
//! | `Vec<u8>`              | `Bytes`                        |
//! | `String`               | `Text`, `Fallback`             |
//! | `Value`                | every getter                   |
//! | `Option<T>`            | whatever supports `T`          |

use crate::{canonical, BinaryEncoding, ConversionError, Cursor, RowkitResult, TypeTag, Value};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use uuid::Uuid;

/// Conversion strategy for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Getter {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Char,
    Float32,
    Float64,
    Decimal,
    Timestamp,
    Uuid,
    Bytes,
    Text,
    /// Opaque values of any type the registry does not know.
    Fallback,
}

static REGISTRY: Lazy<HashMap<TypeTag, Getter>> = Lazy::new(|| {
    HashMap::from([
        (TypeTag::Boolean, Getter::Boolean),
        (TypeTag::Int8, Getter::Int8),
        (TypeTag::Int16, Getter::Int16),
        (TypeTag::Int32, Getter::Int32),
        (TypeTag::Int64, Getter::Int64),
        (TypeTag::Char, Getter::Char),
        (TypeTag::Float32, Getter::Float32),
        (TypeTag::Float64, Getter::Float64),
        (TypeTag::Decimal, Getter::Decimal),
        (TypeTag::Timestamp, Getter::Timestamp),
        (TypeTag::Uuid, Getter::Uuid),
        (TypeTag::Bytes, Getter::Bytes),
        (TypeTag::Text, Getter::Text),
    ])
});

impl Getter {
    /// Registry lookup; unknown tags get the fallback.
    pub fn resolve(field_type: &TypeTag) -> Getter {
        REGISTRY
            .get(field_type)
            .copied()
            .unwrap_or(Getter::Fallback)
    }

    pub fn is_fallback(self) -> bool {
        self == Getter::Fallback
    }
}

/// A column's declared type paired with its resolved getter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGetter {
    pub field_type: TypeTag,
    pub getter: Getter,
}

impl ResolvedGetter {
    pub fn for_type(field_type: TypeTag) -> Self {
        let getter = Getter::resolve(&field_type);
        Self { field_type, getter }
    }
}

/// Resolve the getter of every field of the cursor's current result set.
pub fn resolve_all(cursor: &dyn Cursor) -> RowkitResult<Box<[ResolvedGetter]>> {
    (0..cursor.field_count())
        .map(|ordinal| Ok(ResolvedGetter::for_type(cursor.field_type(ordinal)?)))
        .collect()
}

/// Checked handle onto one field of the current row.
///
/// Obtained from [`Record::field`](crate::Record::field), which has already
/// validated the ordinal and the reader state.
#[derive(Clone, Copy)]
pub struct Field<'a> {
    cursor: &'a dyn Cursor,
    ordinal: usize,
    resolved: &'a ResolvedGetter,
    encoding: BinaryEncoding,
}

impl<'a> Field<'a> {
    pub(crate) fn new(
        cursor: &'a dyn Cursor,
        ordinal: usize,
        resolved: &'a ResolvedGetter,
        encoding: BinaryEncoding,
    ) -> Self {
        Self {
            cursor,
            ordinal,
            resolved,
            encoding,
        }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn getter(&self) -> Getter {
        self.resolved.getter
    }

    pub fn field_type(&self) -> &TypeTag {
        &self.resolved.field_type
    }

    pub fn encoding(&self) -> BinaryEncoding {
        self.encoding
    }

    pub fn is_null(&self) -> RowkitResult<bool> {
        self.cursor.is_null(self.ordinal)
    }

    /// Raw boxed value, bypassing the getter.
    pub fn raw(&self) -> RowkitResult<Value> {
        self.cursor.value(self.ordinal)
    }

    /// Canonical text of the raw value, `None` for null.
    pub fn text(&self) -> RowkitResult<Option<String>> {
        Ok(canonical::format(&self.raw()?, self.encoding))
    }

    fn reject_null<T: FromField>(&self) -> RowkitResult<()> {
        if self.is_null()? {
            return Err(ConversionError::NullValue {
                requested: T::type_name().to_string(),
                ordinal: self.ordinal,
            }
            .into());
        }
        Ok(())
    }

    fn extract<T: FromField>(
        &self,
        pick: impl FnOnce(Value) -> Result<T, Value>,
    ) -> RowkitResult<T> {
        pick(self.raw()?)
            .map_err(|other| ConversionError::mismatch(T::type_name(), self.ordinal, &other).into())
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("ordinal", &self.ordinal)
            .field("resolved", self.resolved)
            .finish()
    }
}

/// An output type a getter can produce.
pub trait FromField: Sized {
    /// Whether a column resolved to `getter` can produce `Self`.
    fn supported_by(getter: Getter) -> bool;

    /// Primary conversion. Only called once `supported_by` has agreed.
    fn convert(field: &Field<'_>) -> RowkitResult<Self>;

    /// Name used for `Self` in conversion errors.
    fn type_name() -> &'static str;
}

/// Typed read of `field` as `T`.
pub fn extract<T: FromField>(field: &Field<'_>) -> RowkitResult<T> {
    if !T::supported_by(field.getter()) {
        return Err(ConversionError::Unsupported {
            requested: T::type_name().to_string(),
            ordinal: field.ordinal(),
            field_type: field.field_type().to_string(),
        }
        .into());
    }
    T::convert(field)
}

macro_rules! typed_getter {
    ($ty:ty, $name:literal, $getter:ident, |$field:ident| $fetch:expr) => {
        impl FromField for $ty {
            fn supported_by(getter: Getter) -> bool {
                getter == Getter::$getter
            }

            fn type_name() -> &'static str {
                $name
            }

            fn convert($field: &Field<'_>) -> RowkitResult<Self> {
                $field.reject_null::<Self>()?;
                $fetch
            }
        }
    };
    ($ty:ty, $name:literal, $getter:ident, $variant:ident) => {
        typed_getter!($ty, $name, $getter, |field| field.extract(|value| match value {
            Value::$variant(v) => Ok(v),
            other => Err(other),
        }));
    };
}

// Fast paths go through the cursor's typed accessors.
typed_getter!(bool, "bool", Boolean, |field| field.cursor.get_bool(field.ordinal));
typed_getter!(i32, "i32", Int32, |field| field.cursor.get_i32(field.ordinal));
typed_getter!(i64, "i64", Int64, |field| field.cursor.get_i64(field.ordinal));
typed_getter!(f64, "f64", Float64, |field| field.cursor.get_f64(field.ordinal));

typed_getter!(i8, "i8", Int8, Int8);
typed_getter!(i16, "i16", Int16, Int16);
typed_getter!(char, "char", Char, Char);
typed_getter!(f32, "f32", Float32, Float32);
typed_getter!(BigDecimal, "BigDecimal", Decimal, Decimal);
typed_getter!(DateTime<Utc>, "DateTime<Utc>", Timestamp, Timestamp);
typed_getter!(Uuid, "Uuid", Uuid, Uuid);
typed_getter!(Vec<u8>, "Vec<u8>", Bytes, Bytes);

impl FromField for String {
    fn supported_by(getter: Getter) -> bool {
        matches!(getter, Getter::Text | Getter::Fallback)
    }

    fn type_name() -> &'static str {
        "String"
    }

    fn convert(field: &Field<'_>) -> RowkitResult<Self> {
        field.reject_null::<Self>()?;
        match field.getter() {
            Getter::Text => field.cursor.get_text(field.ordinal),
            _ => field.text()?.ok_or_else(|| {
                ConversionError::NullValue {
                    requested: Self::type_name().to_string(),
                    ordinal: field.ordinal,
                }
                .into()
            }),
        }
    }
}

impl FromField for Value {
    fn supported_by(_getter: Getter) -> bool {
        true
    }

    fn type_name() -> &'static str {
        "Value"
    }

    fn convert(field: &Field<'_>) -> RowkitResult<Self> {
        field.raw()
    }
}

impl<T: FromField> FromField for Option<T> {
    fn supported_by(getter: Getter) -> bool {
        T::supported_by(getter)
    }

    fn type_name() -> &'static str {
        T::type_name()
    }

    fn convert(field: &Field<'_>) -> RowkitResult<Self> {
        if field.is_null()? {
            return Ok(None);
        }
        T::convert(field).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryCursor, ResultSetData, RowkitError};

    #[test]
    fn test_registry_covers_every_well_known_tag() {
        for tag in TypeTag::WELL_KNOWN.iter() {
            assert!(!Getter::resolve(tag).is_fallback(), "{} fell back", tag);
        }
    }

    #[test]
    fn test_unknown_tag_resolves_to_fallback() {
        let getter = Getter::resolve(&TypeTag::Other("interval".to_string()));
        assert_eq!(getter, Getter::Fallback);
    }

    #[test]
    fn test_supported_by_table() {
        assert!(i32::supported_by(Getter::Int32));
        assert!(!i32::supported_by(Getter::Int64));
        assert!(!i32::supported_by(Getter::Text));
        assert!(String::supported_by(Getter::Text));
        assert!(String::supported_by(Getter::Fallback));
        assert!(!String::supported_by(Getter::Int32));
        assert!(Option::<Uuid>::supported_by(Getter::Uuid));
        assert!(Value::supported_by(Getter::Bytes));
    }

    fn cursor_with(tag: TypeTag, value: Value) -> MemoryCursor {
        let mut cursor = MemoryCursor::single(
            ResultSetData::new().field("f", tag).row(vec![value]),
        )
        .unwrap();
        cursor.read().unwrap();
        cursor
    }

    fn field_of<'a>(cursor: &'a MemoryCursor, resolved: &'a ResolvedGetter) -> Field<'a> {
        Field::new(cursor, 0, resolved, BinaryEncoding::Standard)
    }

    #[test]
    fn test_extract_unsupported_names_requested_type() {
        let cursor = cursor_with(TypeTag::Text, Value::from("a"));
        let resolved = ResolvedGetter::for_type(TypeTag::Text);
        let result = extract::<i32>(&field_of(&cursor, &resolved));
        match result {
            Err(RowkitError::Conversion(ConversionError::Unsupported {
                requested,
                field_type,
                ..
            })) => {
                assert_eq!(requested, "i32");
                assert_eq!(field_type, "text");
            }
            other => panic!("expected unsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_error_type_names_are_short() {
        let cursor = cursor_with(TypeTag::Int32, Value::Int32(4));
        let resolved = ResolvedGetter::for_type(TypeTag::Int32);
        match extract::<String>(&field_of(&cursor, &resolved)) {
            Err(RowkitError::Conversion(ConversionError::Unsupported { requested, .. })) => {
                assert_eq!(requested, "String");
            }
            other => panic!("expected unsupported, got {:?}", other),
        }
        assert_eq!(<DateTime<Utc>>::type_name(), "DateTime<Utc>");
        assert_eq!(Option::<BigDecimal>::type_name(), "BigDecimal");
        assert_eq!(Vec::<u8>::type_name(), "Vec<u8>");
    }

    #[test]
    fn test_extract_value_mismatch_is_conversion_error() {
        // Declared int32 but the source hands back text.
        let cursor = cursor_with(TypeTag::Int32, Value::from("not a number"));
        let resolved = ResolvedGetter::for_type(TypeTag::Int32);
        let result = extract::<i32>(&field_of(&cursor, &resolved));
        assert!(matches!(
            result,
            Err(RowkitError::Conversion(ConversionError::Mismatch { .. }))
        ));
    }

    #[test]
    fn test_null_handling() {
        let cursor = cursor_with(TypeTag::Int64, Value::Null);
        let resolved = ResolvedGetter::for_type(TypeTag::Int64);
        let field = field_of(&cursor, &resolved);

        assert_eq!(extract::<Option<i64>>(&field).unwrap(), None);
        assert!(matches!(
            extract::<i64>(&field),
            Err(RowkitError::Conversion(ConversionError::NullValue { .. }))
        ));
        assert_eq!(extract::<Value>(&field).unwrap(), Value::Null);
    }

    #[test]
    fn test_optional_still_checks_support_on_null() {
        let cursor = cursor_with(TypeTag::Text, Value::Null);
        let resolved = ResolvedGetter::for_type(TypeTag::Text);
        assert!(extract::<Option<i32>>(&field_of(&cursor, &resolved)).is_err());
        assert_eq!(
            extract::<Option<String>>(&field_of(&cursor, &resolved)).unwrap(),
            None
        );
    }

    #[test]
    fn test_fallback_text_is_best_effort() {
        let tag = TypeTag::Other("jsonb".to_string());
        let cursor = cursor_with(tag.clone(), Value::Object(serde_json::json!({"k": [1]})));
        let resolved = ResolvedGetter::for_type(tag);
        let field = field_of(&cursor, &resolved);
        assert_eq!(extract::<String>(&field).unwrap(), r#"{"k":[1]}"#);
        assert!(extract::<i64>(&field).is_err());
    }

    #[test]
    fn test_typed_values() {
        let id = Uuid::now_v7();
        let cursor = cursor_with(TypeTag::Uuid, Value::Uuid(id));
        let resolved = ResolvedGetter::for_type(TypeTag::Uuid);
        assert_eq!(extract::<Uuid>(&field_of(&cursor, &resolved)).unwrap(), id);

        let cursor = cursor_with(TypeTag::Bytes, Value::Bytes(vec![1, 2]));
        let resolved = ResolvedGetter::for_type(TypeTag::Bytes);
        let field = field_of(&cursor, &resolved);
        assert_eq!(extract::<Vec<u8>>(&field).unwrap(), vec![1, 2]);
        assert_eq!(field.text().unwrap().unwrap(), "AQI=");
    }
}
