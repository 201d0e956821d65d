//! Record types backed by a table schema.
//!
//! Implement [`SqlRecord`] for a struct to get bound insert, update, upsert,
//! and delete statements from an instance, and to rebuild instances from
//! rows that come back. The table is compiled once, on
//! first use, and cached in [`TableRegistry::global`].
//!
//! ```ignore
//! struct User { id: i64, email: String }
//!
//! impl SqlRecord for User {
//!     const TABLE: &'static str = "users";
//!
//!     fn table_schema() -> SchemaResult<TableSchema> {
//!         TableSchema::builder(Self::TABLE)
//!             .column("id", SemanticType::Int64)
//!             .column("email", SemanticType::Text)
//!             .build()
//!     }
//!
//!     fn to_values(&self) -> Vec<Value> {
//!         vec![self.id.into(), self.email.clone().into()]
//!     }
//!
//!     fn from_values(values: Vec<Value>) -> SchemaResult<Self> {
//!         let mut it = values.into_iter();
//!         Ok(Self {
//!             id: it.next().unwrap_or(Value::Null).try_into()?,
//!             email: it.next().unwrap_or(Value::Null).try_into()?,
//!         })
//!     }
//! }
//!
//! let stmt = user.insert_statement()?;
//! client.execute(stmt.sql(), &stmt.params_ref()).await?;
//!
//! let by_id = User::select_by(&["id"], [7i64])?;
//! let rows = client.query(by_id.sql(), &by_id.params_ref()).await?;
//! let users = rows.iter().map(User::from_row).collect::<SchemaResult<Vec<_>>>()?;
//! ```

use std::sync::Arc;

use tokio_postgres::Row;

use crate::error::{SchemaError, SchemaResult};
use crate::registry::{CompiledTable, TableRegistry};
use crate::row;
use crate::schema::TableSchema;
use crate::statement::BoundStatement;
use crate::value::Value;

pub trait SqlRecord {
    /// Table name; must match the name in [`SqlRecord::table_schema`].
    const TABLE: &'static str;

    fn table_schema() -> SchemaResult<TableSchema>;

    /// Field values in column declaration order.
    fn to_values(&self) -> Vec<Value>;

    /// Rebuild a record from application values in column declaration
    /// order; the inverse of [`SqlRecord::to_values`].
    fn from_values(values: Vec<Value>) -> SchemaResult<Self>
    where
        Self: Sized;

    /// The compiled table, compiled on first use.
    fn compiled() -> SchemaResult<Arc<CompiledTable>> {
        TableRegistry::global().get_or_register(Self::TABLE, Self::table_schema)
    }

    fn create_table_sql() -> SchemaResult<String> {
        Ok(Self::compiled()?.create.sql.clone())
    }

    fn select_all_sql() -> SchemaResult<String> {
        Ok(Self::compiled()?.select_all.sql.clone())
    }

    /// Rebuild a record from a row of storage values, as bound by the
    /// driver, in column declaration order.
    fn from_storage_values(row: Vec<Value>) -> SchemaResult<Self>
    where
        Self: Sized,
    {
        let table = Self::compiled()?;
        Self::from_values(row::decode_row(table.schema(), row)?)
    }

    /// Rebuild a record from a `tokio_postgres` row.
    fn from_row(row: &Row) -> SchemaResult<Self>
    where
        Self: Sized,
    {
        let table = Self::compiled()?;
        Self::from_values(row::read_row(table.schema(), row)?)
    }

    fn insert_statement(&self) -> SchemaResult<BoundStatement> {
        Self::compiled()?.insert.bind_record(&self.to_values())
    }

    fn update_statement(&self) -> SchemaResult<BoundStatement> {
        Self::compiled()?
            .update_statement()?
            .bind_record(&self.to_values())
    }

    fn upsert_statement(&self) -> SchemaResult<BoundStatement> {
        Self::compiled()?.upsert.bind_record(&self.to_values())
    }

    /// Delete this record by its primary key.
    fn delete_statement(&self) -> SchemaResult<BoundStatement> {
        Self::compiled()?.delete.bind_record(&self.to_values())
    }

    /// Select by a subset of primary-key columns, named in declaration order.
    fn select_by<I, V>(columns: &[&str], values: I) -> SchemaResult<BoundStatement>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let table = Self::compiled()?;
        let accessor = table
            .accessors
            .get_by_columns(columns)
            .ok_or_else(|| no_accessor(Self::TABLE, columns))?;
        accessor.select.bind(values)
    }

    /// Delete by a subset of primary-key columns, named in declaration order.
    fn delete_by<I, V>(columns: &[&str], values: I) -> SchemaResult<BoundStatement>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let table = Self::compiled()?;
        let accessor = table
            .accessors
            .get_by_columns(columns)
            .ok_or_else(|| no_accessor(Self::TABLE, columns))?;
        accessor.delete.bind(values)
    }
}

fn no_accessor(table: &str, columns: &[&str]) -> SchemaError {
    SchemaError::configuration(format!(
        "table '{table}' has no accessor for primary key columns ({})",
        columns.join(", ")
    ))
}
