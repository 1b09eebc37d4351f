//! Declared column types and the boxed raw value carried by cursors.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declared type of a field as reported by the cursor source.
///
/// The well-known variants each map to a dedicated getter. `Other` carries the
/// source's own type name and always resolves to the fallback getter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
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
    Other(String),
}

impl TypeTag {
    /// Every well-known tag, in registry order.
    pub const WELL_KNOWN: [TypeTag; 13] = [
        TypeTag::Boolean,
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::Char,
        TypeTag::Float32,
        TypeTag::Float64,
        TypeTag::Decimal,
        TypeTag::Timestamp,
        TypeTag::Uuid,
        TypeTag::Bytes,
        TypeTag::Text,
    ];

    /// Short lowercase name used in error messages and column headers.
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Boolean => "boolean",
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::Char => "char",
            TypeTag::Float32 => "float32",
            TypeTag::Float64 => "float64",
            TypeTag::Decimal => "decimal",
            TypeTag::Timestamp => "timestamp",
            TypeTag::Uuid => "uuid",
            TypeTag::Bytes => "bytes",
            TypeTag::Text => "text",
            TypeTag::Other(name) => name,
        }
    }

    /// Value types have a non-nullable primary form; reference-like types
    /// (text, bytes, opaque) do not.
    pub fn is_value_type(&self) -> bool {
        !matches!(self, TypeTag::Bytes | TypeTag::Text | TypeTag::Other(_))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw, dynamically-typed field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Char(char),
    Float32(f32),
    Float64(f64),
    Decimal(BigDecimal),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Text(String),
    /// Opaque value of a source-specific type.
    Object(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Tag matching the variant, `None` for `Null`.
    pub fn type_tag(&self) -> Option<TypeTag> {
        let tag = match self {
            Value::Null => return None,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Int8(_) => TypeTag::Int8,
            Value::Int16(_) => TypeTag::Int16,
            Value::Int32(_) => TypeTag::Int32,
            Value::Int64(_) => TypeTag::Int64,
            Value::Char(_) => TypeTag::Char,
            Value::Float32(_) => TypeTag::Float32,
            Value::Float64(_) => TypeTag::Float64,
            Value::Decimal(_) => TypeTag::Decimal,
            Value::Timestamp(_) => TypeTag::Timestamp,
            Value::Uuid(_) => TypeTag::Uuid,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::Text(_) => TypeTag::Text,
            Value::Object(_) => TypeTag::Other("object".to_string()),
        };
        Some(tag)
    }

    /// Variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Char(_) => "char",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Decimal(_) => "decimal",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Object(_) => "object",
        }
    }

    /// Whether this value may be stored in a field declared as `tag`.
    /// Nulls fit every tag, anything fits `Other`.
    pub fn fits(&self, tag: &TypeTag) -> bool {
        match (self, tag) {
            (Value::Null, _) | (_, TypeTag::Other(_)) => true,
            (value, tag) => value.type_tag().as_ref() == Some(tag),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Boolean,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    char => Char,
    f32 => Float32,
    f64 => Float64,
    BigDecimal => Decimal,
    DateTime<Utc> => Timestamp,
    Uuid => Uuid,
    Vec<u8> => Bytes,
    String => Text,
    serde_json::Value => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
