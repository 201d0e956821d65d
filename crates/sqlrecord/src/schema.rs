//! Table schema model.
//!
//! A [`TableSchema`] is the single input to every statement builder. It can
//! only be obtained from [`TableSchemaBuilder::build`], which checks all
//! invariants up front, so the builders never see a malformed table:
//!
//! - at least one column, unique non-empty column names
//! - `1 <= primary_key_count <= columns.len()`, the primary key being the
//!   leading `primary_key_count` columns, none of them nullable
//! - every constraint references an existing column
//! - every column type resolves under the schema's [`TypeMapper`]
//!
//! # Example
//! ```
//! use sqlrecord::{SemanticType, TableSchema};
//!
//! let schema = TableSchema::builder("memberships")
//!     .column("org_id", SemanticType::Int64)
//!     .column("user_id", SemanticType::Int64)
//!     .nullable_column("role", SemanticType::Text)
//!     .primary_keys(2)
//!     .foreign_key("org_id", "orgs", "id")
//!     .build()?;
//!
//! assert_eq!(schema.primary_keys().len(), 2);
//! assert_eq!(schema.data_columns()[0].name, "role");
//! # Ok::<(), sqlrecord::SchemaError>(())
//! ```

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{SchemaError, SchemaResult};
use crate::ident::check_ident;
use crate::types::{SemanticType, TypeMapper};

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub ty: SemanticType,
    pub nullable: bool,
}

impl Column {
    /// A `NOT NULL` column.
    pub fn new(name: impl Into<String>, ty: SemanticType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
        }
    }

    /// A nullable column.
    pub fn nullable(name: impl Into<String>, ty: SemanticType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
        }
    }
}

/// Columns that are unique in aggregate, as indices into the table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueGroup {
    pub columns: Vec<usize>,
}

/// `FOREIGN KEY(column) REFERENCES foreign_table(foreign_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRef {
    pub column: usize,
    pub foreign_table: String,
    pub foreign_key: String,
}

/// `CHECK(column predicate)`, where `predicate` is raw SQL such as `> 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckConstraint {
    pub column: usize,
    pub predicate: String,
}

/// A validated, immutable table description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    table_name: String,
    columns: Vec<Column>,
    /// Resolved SQL type per column, parallel to `columns`.
    sql_types: Vec<String>,
    primary_key_count: usize,
    unique_groups: Vec<UniqueGroup>,
    foreign_keys: Vec<ForeignKeyRef>,
    checks: Vec<CheckConstraint>,
    extra_sql: Vec<String>,
    type_mapper: TypeMapper,
}

impl TableSchema {
    pub fn builder(table_name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder::new(table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn primary_key_count(&self) -> usize {
        self.primary_key_count
    }

    /// The leading `primary_key_count` columns.
    pub fn primary_keys(&self) -> &[Column] {
        &self.columns[..self.primary_key_count]
    }

    /// Every column after the primary key.
    pub fn data_columns(&self) -> &[Column] {
        &self.columns[self.primary_key_count..]
    }

    pub fn is_primary_key(&self, index: usize) -> bool {
        index < self.primary_key_count
    }

    /// Resolved SQL type of the column at `index`.
    pub fn sql_type(&self, index: usize) -> &str {
        &self.sql_types[index]
    }

    pub fn unique_groups(&self) -> &[UniqueGroup] {
        &self.unique_groups
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyRef] {
        &self.foreign_keys
    }

    pub fn checks(&self) -> &[CheckConstraint] {
        &self.checks
    }

    pub fn extra_sql(&self) -> &[String] {
        &self.extra_sql
    }

    pub fn type_mapper(&self) -> &TypeMapper {
        &self.type_mapper
    }
}

/// Reference to a column, by name or by declaration index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Name(String),
    Index(usize),
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Index(i) => write!(f, "#{i}"),
        }
    }
}

#[derive(Debug, Clone)]
enum UniqueSpec {
    Single(ColumnRef),
    Group(Vec<ColumnRef>),
    /// Columns sharing a group id are unique together.
    Keyed(i64, ColumnRef),
}

/// Builder for [`TableSchema`].
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    table_name: String,
    columns: Vec<Column>,
    primary_key_count: usize,
    uniques: Vec<UniqueSpec>,
    foreign_keys: Vec<(ColumnRef, String, String)>,
    checks: Vec<(ColumnRef, String)>,
    extra_sql: Vec<String>,
    type_mapper: TypeMapper,
}

impl TableSchemaBuilder {
    /// Start a table. The primary key defaults to the first column.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key_count: 1,
            uniques: Vec::new(),
            foreign_keys: Vec::new(),
            checks: Vec::new(),
            extra_sql: Vec::new(),
            type_mapper: TypeMapper::default(),
        }
    }

    /// Add a `NOT NULL` column.
    pub fn column(self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.push_column(Column::new(name, ty))
    }

    /// Add a nullable column.
    pub fn nullable_column(self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.push_column(Column::nullable(name, ty))
    }

    pub fn push_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Number of leading columns forming the primary key.
    pub fn primary_keys(mut self, count: usize) -> Self {
        self.primary_key_count = count;
        self
    }

    /// A single-column `UNIQUE` constraint.
    pub fn unique(mut self, column: impl Into<ColumnRef>) -> Self {
        self.uniques.push(UniqueSpec::Single(column.into()));
        self
    }

    /// A multi-column `UNIQUE` constraint.
    pub fn unique_group<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.uniques.push(UniqueSpec::Group(columns));
        self
    }

    /// Add `column` to the unique group identified by `group`.
    ///
    /// All columns added with the same id end up in one `UNIQUE(...)` clause,
    /// placed where the id was first used.
    pub fn unique_in_group(mut self, group: i64, column: impl Into<ColumnRef>) -> Self {
        self.uniques.push(UniqueSpec::Keyed(group, column.into()));
        self
    }

    /// A `CHECK(column predicate)` constraint.
    pub fn check(mut self, column: impl Into<ColumnRef>, predicate: impl Into<String>) -> Self {
        self.checks.push((column.into(), predicate.into()));
        self
    }

    /// A `FOREIGN KEY(column) REFERENCES table(key)` constraint.
    pub fn foreign_key(
        mut self,
        column: impl Into<ColumnRef>,
        foreign_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.foreign_keys
            .push((column.into(), foreign_table.into(), foreign_key.into()));
        self
    }

    /// A raw SQL clause appended verbatim to `CREATE TABLE`.
    pub fn sql(mut self, line: impl Into<String>) -> Self {
        self.extra_sql.push(line.into());
        self
    }

    pub fn type_mapper(mut self, mapper: TypeMapper) -> Self {
        self.type_mapper = mapper;
        self
    }

    /// Validate and build the schema.
    pub fn build(self) -> SchemaResult<TableSchema> {
        check_ident(&self.table_name, "table name")?;

        if self.columns.is_empty() {
            return Err(SchemaError::validation(format!(
                "table '{}' must have at least one column",
                self.table_name
            )));
        }
        if self.primary_key_count == 0 || self.primary_key_count > self.columns.len() {
            return Err(SchemaError::validation(format!(
                "table '{}' declares {} primary key columns but has {} columns (expected 1..={})",
                self.table_name,
                self.primary_key_count,
                self.columns.len(),
                self.columns.len()
            )));
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            check_ident(&column.name, "column name")?;
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::validation(format!(
                    "table '{}' has duplicate column '{}'",
                    self.table_name, column.name
                )));
            }
        }

        if let Some(column) = self.columns[..self.primary_key_count]
            .iter()
            .find(|c| c.nullable)
        {
            return Err(SchemaError::validation(format!(
                "primary key column '{}' of table '{}' cannot be nullable",
                column.name, self.table_name
            )));
        }

        let sql_types = self
            .columns
            .iter()
            .map(|c| self.type_mapper.column_sql_type(c))
            .collect::<SchemaResult<Vec<_>>>()?;

        let unique_groups = self.resolve_uniques()?;

        let foreign_keys = self
            .foreign_keys
            .iter()
            .map(|(column, table, key)| -> SchemaResult<ForeignKeyRef> {
                check_ident(table, "foreign table name")
                    .and_then(|_| check_ident(key, "foreign key column"))
                    .map_err(|e| SchemaError::configuration(e.to_string()))?;
                Ok(ForeignKeyRef {
                    column: self.resolve(column, "foreign key")?,
                    foreign_table: table.clone(),
                    foreign_key: key.clone(),
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        let checks = self
            .checks
            .iter()
            .map(|(column, predicate)| -> SchemaResult<CheckConstraint> {
                let predicate = predicate.trim();
                if predicate.is_empty() {
                    return Err(SchemaError::configuration(format!(
                        "check on column {column} has an empty predicate"
                    )));
                }
                Ok(CheckConstraint {
                    column: self.resolve(column, "check")?,
                    predicate: predicate.to_string(),
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Ok(TableSchema {
            table_name: self.table_name,
            columns: self.columns,
            sql_types,
            primary_key_count: self.primary_key_count,
            unique_groups,
            foreign_keys,
            checks,
            extra_sql: self.extra_sql,
            type_mapper: self.type_mapper,
        })
    }

    fn resolve(&self, column: &ColumnRef, what: &str) -> SchemaResult<usize> {
        let index = match column {
            ColumnRef::Name(name) => self.columns.iter().position(|c| &c.name == name),
            ColumnRef::Index(i) => (*i < self.columns.len()).then_some(*i),
        };
        index.ok_or_else(|| {
            SchemaError::configuration(format!(
                "{what} references unknown column {column} in table '{}'",
                self.table_name
            ))
        })
    }

    fn resolve_uniques(&self) -> SchemaResult<Vec<UniqueGroup>> {
        let mut groups: Vec<UniqueGroup> = Vec::new();
        let mut keyed: Vec<(i64, usize)> = Vec::new(); // group id -> position in `groups`

        for spec in &self.uniques {
            match spec {
                UniqueSpec::Single(column) => groups.push(UniqueGroup {
                    columns: vec![self.resolve(column, "unique")?],
                }),
                UniqueSpec::Group(columns) => {
                    if columns.is_empty() {
                        return Err(SchemaError::configuration(format!(
                            "unique group in table '{}' has no columns",
                            self.table_name
                        )));
                    }
                    let columns = columns
                        .iter()
                        .map(|c| self.resolve(c, "unique"))
                        .collect::<SchemaResult<Vec<_>>>()?;
                    groups.push(UniqueGroup { columns });
                }
                UniqueSpec::Keyed(id, column) => {
                    let index = self.resolve(column, "unique")?;
                    match keyed.iter().find(|(k, _)| k == id) {
                        Some(&(_, pos)) => groups[pos].columns.push(index),
                        None => {
                            keyed.push((*id, groups.len()));
                            groups.push(UniqueGroup {
                                columns: vec![index],
                            });
                        }
                    }
                }
            }
        }

        for group in &groups {
            let mut seen = HashSet::with_capacity(group.columns.len());
            if let Some(dup) = group.columns.iter().find(|i| !seen.insert(**i)) {
                return Err(SchemaError::configuration(format!(
                    "unique group in table '{}' lists column '{}' twice",
                    self.table_name, self.columns[*dup].name
                )));
            }
        }

        Ok(groups)
    }
}
