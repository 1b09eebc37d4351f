//! Canonical text form of field values.
//!
//! Every value has one culture-invariant, round-trippable text rendering:
//!
//! | Type       | Form                                   |
//! |------------|----------------------------------------|
//! | boolean    | `true` / `false`                       |
//! | integers   | decimal digits                         |
//! | floats     | shortest string that parses back exact |
//! | decimal    | plain decimal string                   |
//! | timestamp  | RFC 3339, UTC, `Z` suffix              |
//! | uuid       | lowercase hyphenated                   |
//! | bytes      | base64 (alphabet from config)          |
//! | object     | JSON text                              |
//!
//! Nulls have no text form and render as `None`.

use crate::{BinaryEncoding, ConversionError, RowkitResult, TypeTag, Value};
use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use std::str::FromStr;
use uuid::Uuid;

/// Render `value` in canonical text form.
pub fn format(value: &Value, encoding: BinaryEncoding) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::Boolean(v) => v.to_string(),
        Value::Int8(v) => v.to_string(),
        Value::Int16(v) => v.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Char(v) => v.to_string(),
        Value::Float32(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),
        Value::Timestamp(v) => v.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Value::Uuid(v) => v.hyphenated().to_string(),
        Value::Bytes(v) => encoding.encode(v),
        Value::Text(v) => v.clone(),
        Value::Object(v) => v.to_string(),
    };
    Some(text)
}

fn parse_error(tag: &TypeTag, input: &str, reason: impl ToString) -> crate::RowkitError {
    ConversionError::Parse {
        requested: tag.name().to_string(),
        input: input.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Parse canonical text back into a value of the declared type.
///
/// `Other` types accept any JSON text; anything that is not valid JSON is
/// kept as a JSON string.
pub fn parse(tag: &TypeTag, text: &str, encoding: BinaryEncoding) -> RowkitResult<Value> {
    let err = |reason: &dyn std::fmt::Display| parse_error(tag, text, reason);
    let value = match tag {
        TypeTag::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                Value::Boolean(true)
            } else if text.eq_ignore_ascii_case("false") {
                Value::Boolean(false)
            } else {
                return Err(err(&"expected true or false"));
            }
        }
        TypeTag::Int8 => Value::Int8(text.parse().map_err(|e| err(&e))?),
        TypeTag::Int16 => Value::Int16(text.parse().map_err(|e| err(&e))?),
        TypeTag::Int32 => Value::Int32(text.parse().map_err(|e| err(&e))?),
        TypeTag::Int64 => Value::Int64(text.parse().map_err(|e| err(&e))?),
        TypeTag::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(err(&"expected exactly one character")),
            }
        }
        TypeTag::Float32 => Value::Float32(text.parse().map_err(|e| err(&e))?),
        TypeTag::Float64 => Value::Float64(text.parse().map_err(|e| err(&e))?),
        TypeTag::Decimal => Value::Decimal(BigDecimal::from_str(text).map_err(|e| err(&e))?),
        TypeTag::Timestamp => Value::Timestamp(
            DateTime::parse_from_rfc3339(text)
                .map_err(|e| err(&e))?
                .with_timezone(&Utc),
        ),
        TypeTag::Uuid => Value::Uuid(Uuid::parse_str(text).map_err(|e| err(&e))?),
        TypeTag::Bytes => Value::Bytes(encoding.decode(text).map_err(|e| err(&e))?),
        TypeTag::Text => Value::Text(text.to_string()),
        TypeTag::Other(_) => Value::Object(
            serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
        ),
    };
    Ok(value)
}

/// JSON rendering used by table export: numbers and booleans stay native,
/// everything else goes through the canonical text form.
pub fn to_json(value: &Value, encoding: BinaryEncoding) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Boolean(v) => Json::Bool(*v),
        Value::Int8(v) => Json::from(*v),
        Value::Int16(v) => Json::from(*v),
        Value::Int32(v) => Json::from(*v),
        Value::Int64(v) => Json::from(*v),
        Value::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
            .map_or_else(|| Json::String(v.to_string()), Json::Number),
        Value::Float64(v) => serde_json::Number::from_f64(*v)
            .map_or_else(|| Json::String(v.to_string()), Json::Number),
        Value::Object(v) => v.clone(),
        other => format(other, encoding).map_or(Json::Null, Json::String),
    }
}
