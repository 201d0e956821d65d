//! # sqlrecord
//!
//! Compile table schemas into parameterized SQL.
//!
//! ## Features
//!
//! - **Schema first**: declare columns with semantic types, the first `n` form the primary key
//! - **Safe quoting**: identifiers are always quoted; values are always bound, never spliced
//! - **Full DDL**: `CREATE TABLE` with unique groups, checks, foreign keys, and raw clauses
//! - **CRUD templates**: insert, update, upsert, and delete keyed on the primary key
//! - **Keyed accessors**: a select/delete pair for every subset of the primary key
//! - **Boundary conversion**: unsigned integers, chars, and enums map onto storage types and back
//!
//! ## Example
//!
//! ```ignore
//! use sqlrecord::{CompileOptions, CompiledTable, SemanticType, TableSchema};
//!
//! let schema = TableSchema::builder("orders")
//!     .column("shop", SemanticType::UInt32)
//!     .column("number", SemanticType::Int64)
//!     .nullable_column("note", SemanticType::Text)
//!     .primary_keys(2)
//!     .build()?;
//!
//! let table = CompiledTable::compile(schema, CompileOptions::default())?;
//! client.batch_execute(table.create.sql()).await?;
//!
//! let by_shop = table.accessors.get("shop").unwrap().select.bind([7u32])?;
//! let rows = client.query(by_shop.sql(), &by_shop.params_ref()).await?;
//! ```

pub mod accessor;
pub mod crud;
pub mod ddl;
pub mod error;
pub mod ident;
pub mod record;
pub mod registry;
pub mod row;
pub mod schema;
pub mod statement;
pub mod types;
pub mod value;

pub use accessor::{AccessorSet, Cardinality, KeyedAccessor, MAX_ACCESSOR_KEY_COLUMNS};
pub use error::{SchemaError, SchemaResult};
pub use ident::{escape_literal, quote_ident, quote_ident_list};
pub use record::SqlRecord;
pub use registry::{CompiledTable, TableRegistration, TableRegistry};
pub use row::{RowExt, decode_row, read_row};
pub use schema::{
    CheckConstraint, Column, ColumnRef, ForeignKeyRef, TableSchema, TableSchemaBuilder,
    UniqueGroup,
};
pub use statement::{
    BoundStatement, CompileOptions, InsertConflict, Param, PlaceholderStyle, Statement,
};
pub use types::{BoundaryConversion, IntWidth, SemanticType, TypeMapper};
pub use value::Value;

// Re-export inventory for `TableRegistration` submissions
pub use inventory;
