//! Semantic column types and their PostgreSQL mapping.
//!
//! A [`SemanticType`] describes what a column holds on the application side.
//! [`TypeMapper`] resolves it to the SQL type used in DDL, and
//! [`BoundaryConversion`] describes how a value changes shape when it is
//! handed to (or read back from) the driver.
//!
//! # Unsigned integers
//!
//! PostgreSQL has no unsigned integer types. An unsigned value is stored in
//! the signed type of the same bit width by reinterpreting its bits, so
//! `u64::MAX` is stored as `-1_i64`. Reading it back through
//! [`BoundaryConversion::from_storage`] recovers the original value exactly,
//! but anything else looking at the column (SQL comparisons, ordering,
//! `CHECK` predicates, other clients) sees the negative number. Values up to
//! the signed maximum are unaffected. `u8` and `i8` are widened to `i16`
//! because there is no 8-bit integer column type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::schema::Column;
use crate::value::Value;

/// Integer width backing an enum column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    /// The plain integer type with this width.
    pub fn semantic(self) -> SemanticType {
        match self {
            Self::I8 => SemanticType::Int8,
            Self::I16 => SemanticType::Int16,
            Self::I32 => SemanticType::Int32,
            Self::I64 => SemanticType::Int64,
            Self::U8 => SemanticType::UInt8,
            Self::U16 => SemanticType::UInt16,
            Self::U32 => SemanticType::UInt32,
            Self::U64 => SemanticType::UInt64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
        }
    }
}

impl FromStr for IntWidth {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i8" => Ok(Self::I8),
            "i16" => Ok(Self::I16),
            "i32" => Ok(Self::I32),
            "i64" => Ok(Self::I64),
            "u8" => Ok(Self::U8),
            "u16" => Ok(Self::U16),
            "u32" => Ok(Self::U32),
            "u64" => Ok(Self::U64),
            other => Err(SchemaError::configuration(format!(
                "invalid enum base width '{other}' (expected i8..i64 or u8..u64)"
            ))),
        }
    }
}

/// What a column holds on the application side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Text,
    /// A single character, stored as one-character text.
    Char,
    /// A fieldless enum stored as its integer discriminant.
    Enum(IntWidth),
    Bytes,
    DateTime,
    /// A type only known to the [`TypeMapper`] overrides (e.g. `uuid`, `jsonb`).
    Custom(String),
}

impl SemanticType {
    /// Canonical name, also the key used for [`TypeMapper`] overrides.
    pub fn name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int8 => "i8".to_string(),
            Self::Int16 => "i16".to_string(),
            Self::Int32 => "i32".to_string(),
            Self::Int64 => "i64".to_string(),
            Self::UInt8 => "u8".to_string(),
            Self::UInt16 => "u16".to_string(),
            Self::UInt32 => "u32".to_string(),
            Self::UInt64 => "u64".to_string(),
            Self::Float32 => "f32".to_string(),
            Self::Float64 => "f64".to_string(),
            Self::Text => "text".to_string(),
            Self::Char => "char".to_string(),
            Self::Enum(width) => format!("enum:{}", width.as_str()),
            Self::Bytes => "bytes".to_string(),
            Self::DateTime => "datetime".to_string(),
            Self::Custom(name) => normalize_type_name(name),
        }
    }

    /// Whether values of this type change representation at the driver boundary.
    pub fn needs_conversion(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::Char
                | Self::Enum(_)
        )
    }

    /// Whether a storage value for this type may not round-trip through SQL
    /// comparisons unchanged (see the module docs).
    pub fn has_precision_caveat(&self) -> bool {
        match self {
            Self::UInt16 | Self::UInt32 | Self::UInt64 => true,
            Self::Enum(width) => width.semantic().has_precision_caveat(),
            _ => false,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for SemanticType {
    type Err = SchemaError;

    /// Parse a type name as written in table definitions.
    ///
    /// Unknown names become [`SemanticType::Custom`]; whether they resolve is
    /// decided later by the [`TypeMapper`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_type_name(s);
        if normalized.is_empty() {
            return Err(SchemaError::configuration("type name cannot be empty"));
        }
        if let Some(width) = normalized.strip_prefix("enum:") {
            return Ok(Self::Enum(width.parse()?));
        }
        let ty = match normalized.as_str() {
            "bool" | "boolean" => Self::Bool,
            "i8" | "sbyte" => Self::Int8,
            "i16" | "short" => Self::Int16,
            "i32" | "int" => Self::Int32,
            "i64" | "long" => Self::Int64,
            "u8" | "byte" => Self::UInt8,
            "u16" | "ushort" => Self::UInt16,
            "u32" | "uint" => Self::UInt32,
            "u64" | "ulong" => Self::UInt64,
            "f32" | "float" => Self::Float32,
            "f64" | "double" => Self::Float64,
            "text" | "string" => Self::Text,
            "char" => Self::Char,
            "enum" => Self::Enum(IntWidth::I32),
            "bytes" | "byte[]" => Self::Bytes,
            "datetime" | "timestamp" => Self::DateTime,
            _ => Self::Custom(normalized),
        };
        Ok(ty)
    }
}

/// Lowercase, trim, and collapse inner whitespace.
pub fn normalize_type_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolves semantic types to PostgreSQL type names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeMapper {
    /// Normalized type name -> SQL type text.
    overrides: BTreeMap<String, String>,
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapper with user overrides.
    ///
    /// Keys are type names as produced by [`SemanticType::name`]; they may
    /// name custom types (`"uuid"`) or replace a built-in (`"datetime"`).
    pub fn with_overrides(custom: BTreeMap<String, String>) -> Self {
        let overrides = custom
            .into_iter()
            .map(|(k, v)| (normalize_type_name(&k), v.trim().to_string()))
            .collect();
        Self { overrides }
    }

    /// Add a single override.
    pub fn with_override(mut self, name: &str, sql_type: &str) -> Self {
        self.overrides
            .insert(normalize_type_name(name), sql_type.trim().to_string());
        self
    }

    /// SQL type name for a semantic type, or `None` when unmapped.
    pub fn sql_type_name(&self, ty: &SemanticType) -> Option<String> {
        if let Some(sql) = self.overrides.get(&ty.name()) {
            return Some(sql.clone());
        }
        let builtin = match ty {
            SemanticType::Bool => "BOOLEAN",
            SemanticType::Int8
            | SemanticType::UInt8
            | SemanticType::Int16
            | SemanticType::UInt16 => "SMALLINT",
            SemanticType::Int32 | SemanticType::UInt32 => "INTEGER",
            SemanticType::Int64 | SemanticType::UInt64 => "BIGINT",
            SemanticType::Float32 => "REAL",
            SemanticType::Float64 => "DOUBLE PRECISION",
            SemanticType::Text => "TEXT",
            SemanticType::Char => "CHAR(1)",
            SemanticType::Enum(width) => return self.sql_type_name(&width.semantic()),
            SemanticType::Bytes => "BYTEA",
            SemanticType::DateTime => "TIMESTAMP",
            SemanticType::Custom(_) => return None,
        };
        Some(builtin.to_string())
    }

    /// SQL type name for a column, naming the column when unmapped.
    pub fn column_sql_type(&self, column: &Column) -> SchemaResult<String> {
        self.sql_type_name(&column.ty)
            .ok_or_else(|| SchemaError::unsupported_type(&column.name, column.ty.name()))
    }

    /// The conversion pair for values of `ty`.
    pub fn boundary_conversion(&self, ty: &SemanticType) -> BoundaryConversion {
        BoundaryConversion { ty: ty.clone() }
    }
}

/// Value transforms applied when a value crosses the driver boundary.
///
/// `to_storage` turns an application value into what gets bound as a
/// parameter; `from_storage` turns what the driver returns back into the
/// application value. `Value::Null` passes through both directions for every
/// type; nullability is a DDL concern only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryConversion {
    ty: SemanticType,
}

impl BoundaryConversion {
    pub fn new(ty: SemanticType) -> Self {
        Self { ty }
    }

    pub fn semantic_type(&self) -> &SemanticType {
        &self.ty
    }

    /// Convert an application value into its storage representation.
    pub fn to_storage(&self, value: Value) -> SchemaResult<Value> {
        if value.is_null() {
            return Ok(value);
        }
        if !value.matches(&self.ty) {
            return Err(SchemaError::conversion(
                self.ty.name(),
                format!("cannot store {} value", value.kind()),
            ));
        }
        Ok(value.into_storage())
    }

    /// Convert a storage value back into the application representation.
    pub fn from_storage(&self, value: Value) -> SchemaResult<Value> {
        if value.is_null() {
            return Ok(value);
        }
        let mismatch = |value: &Value| {
            SchemaError::conversion(
                self.ty.name(),
                format!("unexpected storage value {}", value.kind()),
            )
        };
        let out_of_range = |v: i16| {
            SchemaError::conversion(self.ty.name(), format!("storage value {v} out of range"))
        };

        match (&self.ty, value) {
            (SemanticType::Int8, Value::I16(v)) => {
                i8::try_from(v).map(Value::I8).map_err(|_| out_of_range(v))
            }
            (SemanticType::UInt8, Value::I16(v)) => {
                u8::try_from(v).map(Value::U8).map_err(|_| out_of_range(v))
            }
            (SemanticType::UInt16, Value::I16(v)) => Ok(Value::U16(v as u16)),
            (SemanticType::UInt32, Value::I32(v)) => Ok(Value::U32(v as u32)),
            (SemanticType::UInt64, Value::I64(v)) => Ok(Value::U64(v as u64)),
            (SemanticType::Char, Value::Text(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(SchemaError::conversion(
                        "char",
                        format!("expected exactly one character, got {:?}", s),
                    )),
                }
            }
            (SemanticType::Enum(width), value) => {
                let inner = BoundaryConversion::new(width.semantic()).from_storage(value)?;
                Ok(Value::Enum(Box::new(inner)))
            }
            (ty, value) if !ty.needs_conversion() && value.matches(ty) => Ok(value),
            (_, value) => Err(mismatch(&value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(ty: SemanticType) -> BoundaryConversion {
        TypeMapper::new().boundary_conversion(&ty)
    }

    #[test]
    fn map_builtin_types() {
        let m = TypeMapper::new();
        assert_eq!(m.sql_type_name(&SemanticType::Bool).as_deref(), Some("BOOLEAN"));
        assert_eq!(m.sql_type_name(&SemanticType::UInt16).as_deref(), Some("SMALLINT"));
        assert_eq!(m.sql_type_name(&SemanticType::UInt64).as_deref(), Some("BIGINT"));
        assert_eq!(
            m.sql_type_name(&SemanticType::Float64).as_deref(),
            Some("DOUBLE PRECISION")
        );
        assert_eq!(m.sql_type_name(&SemanticType::Char).as_deref(), Some("CHAR(1)"));
        assert_eq!(m.sql_type_name(&SemanticType::Bytes).as_deref(), Some("BYTEA"));
    }

    #[test]
    fn enum_maps_to_its_base_width() {
        let m = TypeMapper::new();
        assert_eq!(
            m.sql_type_name(&SemanticType::Enum(IntWidth::U64)).as_deref(),
            Some("BIGINT")
        );
        assert_eq!(
            m.sql_type_name(&SemanticType::Enum(IntWidth::I16)).as_deref(),
            Some("SMALLINT")
        );
    }

    #[test]
    fn custom_type_requires_override() {
        let ty = SemanticType::Custom("uuid".to_string());
        assert_eq!(TypeMapper::new().sql_type_name(&ty), None);

        let mut custom = BTreeMap::new();
        custom.insert("UUID".to_string(), "UUID".to_string());
        let m = TypeMapper::with_overrides(custom);
        assert_eq!(m.sql_type_name(&ty).as_deref(), Some("UUID"));
    }

    #[test]
    fn override_replaces_builtin() {
        let m = TypeMapper::new().with_override("datetime", "TIMESTAMPTZ");
        assert_eq!(
            m.sql_type_name(&SemanticType::DateTime).as_deref(),
            Some("TIMESTAMPTZ")
        );
    }

    #[test]
    fn unmapped_column_names_the_column() {
        let column = Column::new("owner", SemanticType::Custom("geometry".to_string()));
        let err = TypeMapper::new().column_sql_type(&column).unwrap_err();
        assert_eq!(
            err,
            SchemaError::unsupported_type("owner", "geometry")
        );
    }

    #[test]
    fn parse_type_names() {
        assert_eq!("i32".parse::<SemanticType>().unwrap(), SemanticType::Int32);
        assert_eq!("Boolean".parse::<SemanticType>().unwrap(), SemanticType::Bool);
        assert_eq!(
            "enum:u64".parse::<SemanticType>().unwrap(),
            SemanticType::Enum(IntWidth::U64)
        );
        assert_eq!(
            "Double  Precision".parse::<SemanticType>().unwrap(),
            SemanticType::Custom("double precision".to_string())
        );
        assert!("enum:u128".parse::<SemanticType>().is_err());
        assert!("  ".parse::<SemanticType>().is_err());
    }

    #[test]
    fn unsigned_uses_equal_width_signed_storage() {
        assert_eq!(
            conv(SemanticType::UInt16).to_storage(Value::U16(40_000)).unwrap(),
            Value::I16(40_000_u16 as i16)
        );
        assert_eq!(
            conv(SemanticType::UInt32).to_storage(Value::U32(7)).unwrap(),
            Value::I32(7)
        );
        assert_eq!(
            conv(SemanticType::UInt64).to_storage(Value::U64(u64::MAX)).unwrap(),
            Value::I64(-1)
        );
    }

    #[test]
    fn unsigned_round_trip_is_bit_exact() {
        let c = conv(SemanticType::UInt64);
        let stored = c.to_storage(Value::U64(u64::MAX - 3)).unwrap();
        assert_eq!(c.from_storage(stored).unwrap(), Value::U64(u64::MAX - 3));
        assert!(SemanticType::UInt64.has_precision_caveat());
        assert!(!SemanticType::Int64.has_precision_caveat());
    }

    #[test]
    fn eight_bit_integers_widen() {
        assert_eq!(
            conv(SemanticType::UInt8).to_storage(Value::U8(200)).unwrap(),
            Value::I16(200)
        );
        assert_eq!(
            conv(SemanticType::UInt8).from_storage(Value::I16(200)).unwrap(),
            Value::U8(200)
        );
        assert!(conv(SemanticType::Int8).from_storage(Value::I16(300)).is_err());
    }

    #[test]
    fn char_crosses_as_single_character_text() {
        let c = conv(SemanticType::Char);
        assert_eq!(c.to_storage(Value::Char('x')).unwrap(), Value::Text("x".into()));
        assert_eq!(c.from_storage(Value::Text("é".into())).unwrap(), Value::Char('é'));
        assert!(c.from_storage(Value::Text("xy".into())).unwrap_err().is_conversion());
        assert!(c.from_storage(Value::Text(String::new())).is_err());
    }

    #[test]
    fn enum_crosses_as_base_integer() {
        let c = conv(SemanticType::Enum(IntWidth::U32));
        let value = Value::Enum(Box::new(Value::U32(u32::MAX)));
        let stored = c.to_storage(value.clone()).unwrap();
        assert_eq!(stored, Value::I32(-1));
        assert_eq!(c.from_storage(stored).unwrap(), value);
    }

    #[test]
    fn enum_with_wrong_base_is_rejected() {
        let c = conv(SemanticType::Enum(IntWidth::U32));
        let err = c.to_storage(Value::Enum(Box::new(Value::I64(1)))).unwrap_err();
        assert!(err.is_conversion());
    }

    #[test]
    fn null_passes_through_every_type() {
        for ty in [
            SemanticType::UInt64,
            SemanticType::Char,
            SemanticType::Enum(IntWidth::U8),
            SemanticType::Custom("uuid".to_string()),
        ] {
            let c = conv(ty);
            assert_eq!(c.to_storage(Value::Null).unwrap(), Value::Null);
            assert_eq!(c.from_storage(Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn mismatched_value_is_a_conversion_error() {
        let err = conv(SemanticType::Int32)
            .to_storage(Value::Text("1".into()))
            .unwrap_err();
        assert!(err.is_conversion());
        assert!(conv(SemanticType::Bool).from_storage(Value::I32(1)).is_err());
    }

    #[test]
    fn plain_types_pass_through() {
        let c = conv(SemanticType::Text);
        assert_eq!(c.to_storage(Value::Text("a".into())).unwrap(), Value::Text("a".into()));
        assert_eq!(c.from_storage(Value::Text("a".into())).unwrap(), Value::Text("a".into()));
    }
}
