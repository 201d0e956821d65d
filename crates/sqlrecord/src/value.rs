//! Values that cross the driver boundary.
//!
//! [`Value`] is used on both sides of the boundary: record types hand their
//! fields to statements as application values, and statements hand storage
//! values to the driver. [`Value::into_storage`] performs the
//! representation change based on the value alone (unsigned integers become
//! signed, chars become text, enums become their discriminant), while
//! [`crate::types::BoundaryConversion`] additionally checks the value against
//! a column's declared type.
//!
//! `Value` implements [`ToSql`], so a list of storage values can be passed to
//! `tokio_postgres` directly (see [`crate::BoundStatement::params_ref`]).

use std::error::Error;
use std::fmt;

use bytes::BytesMut;
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::error::SchemaError;
use crate::types::SemanticType;

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Char(char),
    /// An enum discriminant, wrapping the integer value of its base width.
    Enum(Box<Value>),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    /// Value of a custom column type; bound as JSON.
    Json(serde_json::Value),
}

impl Value {
    /// Wrap an integer discriminant as an enum value.
    pub fn enumeration(discriminant: impl Into<Value>) -> Self {
        Self::Enum(Box::new(discriminant.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short variant name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "text",
            Self::Char(_) => "char",
            Self::Enum(_) => "enum",
            Self::Bytes(_) => "bytes",
            Self::DateTime(_) => "datetime",
            Self::Json(_) => "json",
        }
    }

    /// Whether this (application) value is acceptable for a column of `ty`.
    ///
    /// `Null` matches every type. Custom types accept any value.
    pub fn matches(&self, ty: &SemanticType) -> bool {
        match (self, ty) {
            (Self::Null, _) | (_, SemanticType::Custom(_)) => true,
            (Self::Bool(_), SemanticType::Bool)
            | (Self::I8(_), SemanticType::Int8)
            | (Self::I16(_), SemanticType::Int16)
            | (Self::I32(_), SemanticType::Int32)
            | (Self::I64(_), SemanticType::Int64)
            | (Self::U8(_), SemanticType::UInt8)
            | (Self::U16(_), SemanticType::UInt16)
            | (Self::U32(_), SemanticType::UInt32)
            | (Self::U64(_), SemanticType::UInt64)
            | (Self::F32(_), SemanticType::Float32)
            | (Self::F64(_), SemanticType::Float64)
            | (Self::Text(_), SemanticType::Text)
            | (Self::Char(_), SemanticType::Char)
            | (Self::Bytes(_), SemanticType::Bytes)
            | (Self::DateTime(_), SemanticType::DateTime) => true,
            (Self::Enum(inner), SemanticType::Enum(width)) => {
                !inner.is_null() && inner.matches(&width.semantic())
            }
            _ => false,
        }
    }

    /// Convert to the representation handed to the driver.
    ///
    /// Unsigned integers are reinterpreted as the signed type of the same
    /// width (`u8` widens to `i16`), so values above the signed maximum are
    /// stored as negative numbers. `i8` widens to `i16`. Chars become
    /// one-character text and enums become their discriminant. Everything
    /// else, including `Null`, is returned unchanged.
    pub fn into_storage(self) -> Value {
        match self {
            Self::I8(v) => Self::I16(v as i16),
            Self::U8(v) => Self::I16(v as i16),
            Self::U16(v) => Self::I16(v as i16),
            Self::U32(v) => Self::I32(v as i32),
            Self::U64(v) => Self::I64(v as i64),
            Self::Char(c) => Self::Text(c.to_string()),
            Self::Enum(inner) => inner.into_storage(),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Char(v) => write!(f, "{v:?}"),
            Self::Enum(inner) => write!(f, "enum({inner})"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => v.to_sql_checked(ty, out),
            Self::I16(v) => v.to_sql_checked(ty, out),
            Self::I32(v) => v.to_sql_checked(ty, out),
            Self::I64(v) => v.to_sql_checked(ty, out),
            Self::F32(v) => v.to_sql_checked(ty, out),
            Self::F64(v) => v.to_sql_checked(ty, out),
            Self::Text(v) => v.to_sql_checked(ty, out),
            Self::Bytes(v) => v.to_sql_checked(ty, out),
            Self::DateTime(v) => v.to_sql_checked(ty, out),
            Self::Json(v) => v.to_sql_checked(ty, out),
            // Application-side representations are converted on the fly.
            Self::I8(_) | Self::U8(_) | Self::U16(_) | Self::U32(_) | Self::U64(_) | Self::Char(_)
            | Self::Enum(_) => self.clone().into_storage().to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Each variant checks the concrete type in `to_sql`.
        true
    }

    to_sql_checked!();
}

macro_rules! impl_from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Text,
    char => Char,
    Vec<u8> => Bytes,
    NaiveDateTime => DateTime,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Value {
    /// Unwrap an optional column: `Null` becomes `None`.
    pub fn into_optional<T>(self) -> Result<Option<T>, SchemaError>
    where
        T: TryFrom<Value, Error = SchemaError>,
    {
        match self {
            Self::Null => Ok(None),
            other => T::try_from(other).map(Some),
        }
    }

    /// The integer inside an enum value.
    pub fn into_discriminant(self) -> Result<Value, SchemaError> {
        match self {
            Self::Enum(inner) => Ok(*inner),
            other => Err(SchemaError::conversion(
                "enum",
                format!("expected enum value, got {}", other.kind()),
            )),
        }
    }
}

macro_rules! impl_try_from_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl TryFrom<Value> for $t {
                type Error = SchemaError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(SchemaError::conversion(
                            stringify!($t),
                            format!("cannot read {} value", other.kind()),
                        )),
                    }
                }
            }
        )*
    };
}

impl_try_from_value! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Text,
    char => Char,
    Vec<u8> => Bytes,
    NaiveDateTime => DateTime,
    serde_json::Value => Json,
}
