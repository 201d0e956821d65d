//! Error types for sqlrecord

use thiserror::Error;

/// Result type alias for sqlrecord operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building a schema or compiling statements from it.
///
/// Every variant is a deterministic function of the input: retrying without
/// changing the schema or the values cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A schema invariant does not hold (empty table, nullable primary key, ...)
    #[error("Schema validation error: {0}")]
    Validation(String),

    /// No SQL type mapping exists for a column's semantic type
    #[error("Unsupported type '{ty}' on column '{column}'")]
    UnsupportedType { column: String, ty: String },

    /// A constraint or option refers to something that does not exist
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value cannot cross the driver boundary as the requested type
    #[error("Conversion error for {ty}: {message}")]
    Conversion { ty: String, message: String },

    /// A row read back from the database does not fit the table
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Registry lookup miss
    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

impl SchemaError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an unsupported type error for a specific column
    pub fn unsupported_type(column: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::UnsupportedType {
            column: column.into(),
            ty: ty.into(),
        }
    }

    /// Create a conversion error
    pub fn conversion(ty: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            ty: ty.into(),
            message: message.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an unsupported type error
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a conversion error
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Check if this is a decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}
