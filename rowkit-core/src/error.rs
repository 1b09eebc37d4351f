//! Error types for rowkit operations

use thiserror::Error;

/// Schema lookup errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Field not found: {name}")]
    FieldNotFound { name: String },

    #[error("Ordinal {ordinal} out of range: field count is {field_count}")]
    OrdinalOutOfRange { ordinal: usize, field_count: usize },
}

/// Typed value extraction errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("No getter for {requested} on field {ordinal} declared as {field_type}")]
    Unsupported {
        requested: String,
        ordinal: usize,
        field_type: String,
    },

    #[error("Field {ordinal} is null and cannot be read as {requested}")]
    NullValue { requested: String, ordinal: usize },

    #[error("Field {ordinal} holds a {found} value, expected {requested}")]
    Mismatch {
        requested: String,
        ordinal: usize,
        found: String,
    },

    #[error("Cannot parse {input:?} as {requested}: {reason}")]
    Parse {
        requested: String,
        input: String,
        reason: String,
    },
}

impl ConversionError {
    /// Raw value at `ordinal` is not of the variant `requested` needs.
    pub fn mismatch(requested: &str, ordinal: usize, found: &crate::Value) -> Self {
        ConversionError::Mismatch {
            requested: requested.to_string(),
            ordinal,
            found: found.kind().to_string(),
        }
    }
}

/// Reader lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("{operation} requires a positioned reader, current state is {state}")]
    NotPositioned {
        operation: &'static str,
        state: &'static str,
    },

    #[error("{operation} called after close")]
    Closed { operation: &'static str },
}

/// Failures reported by the underlying cursor source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("Cursor read failed: {reason}")]
    ReadFailed { reason: String },

    #[error("Advancing to the next result set failed: {reason}")]
    AdvanceFailed { reason: String },

    #[error("Closing cursor failed: {reason}")]
    CloseFailed { reason: String },
}

/// Argument validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all rowkit errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowkitError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for rowkit operations.
pub type RowkitResult<T> = Result<T, RowkitError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display_out_of_range() {
        let err = SchemaError::OrdinalOutOfRange {
            ordinal: 7,
            field_count: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Ordinal 7"));
        assert!(msg.contains("field count is 2"));
    }

    #[test]
    fn test_conversion_error_display_unsupported() {
        let err = ConversionError::Unsupported {
            requested: "i32".to_string(),
            ordinal: 1,
            field_type: "text".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("i32"));
        assert!(msg.contains("field 1"));
        assert!(msg.contains("text"));
    }

    #[test]
    fn test_state_error_display_not_positioned() {
        let err = StateError::NotPositioned {
            operation: "get",
            state: "unstarted",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("get requires a positioned reader"));
        assert!(msg.contains("unstarted"));
    }

    #[test]
    fn test_rowkit_error_from_variants() {
        let schema = RowkitError::from(SchemaError::FieldNotFound {
            name: "id".to_string(),
        });
        assert!(matches!(schema, RowkitError::Schema(_)));

        let state = RowkitError::from(StateError::Closed { operation: "read" });
        assert!(matches!(state, RowkitError::State(_)));

        let cursor = RowkitError::from(CursorError::CloseFailed {
            reason: "socket".to_string(),
        });
        assert!(matches!(cursor, RowkitError::Cursor(_)));

        let validation = RowkitError::from(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
        assert!(matches!(validation, RowkitError::Validation(_)));

        let config = RowkitError::from(ConfigError::InvalidValue {
            field: "binary_encoding".to_string(),
            value: "hex".to_string(),
            reason: "unknown encoding".to_string(),
        });
        assert!(matches!(config, RowkitError::Config(_)));
    }
}
