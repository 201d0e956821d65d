//! Compiled statements and their parameter lists.
//!
//! Every builder returns a [`Statement`]: SQL text with positional
//! placeholders plus one [`Param`] per placeholder, in placeholder order.
//! Values are never part of the SQL text. Binding a statement runs each value
//! through the column's [`BoundaryConversion`](crate::types::BoundaryConversion)
//! and yields a [`BoundStatement`] ready for the driver.

use serde::{Deserialize, Serialize};
use tokio_postgres::types::ToSql;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::TableSchema;
use crate::types::{BoundaryConversion, SemanticType};
use crate::value::Value;

/// How positional parameters are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL). A number may appear more than once.
    #[default]
    Numbered,
    /// `?` for every parameter, bound strictly in order of appearance.
    Positional,
}

/// What a plain `INSERT` does when the primary key already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertConflict {
    /// Append `ON CONFLICT(<primary key>) DO NOTHING`; the insert affects 0 rows.
    #[default]
    DoNothing,
    /// No conflict clause; the database raises a unique violation.
    Fail,
}

/// Options shared by the statement builders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub placeholder: PlaceholderStyle,
    pub insert_conflict: InsertConflict,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder = style;
        self
    }

    pub fn insert_conflict(mut self, policy: InsertConflict) -> Self {
        self.insert_conflict = policy;
        self
    }
}

/// One statement parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Declaration position of the column in its table.
    pub index: usize,
    pub column: String,
    pub ty: SemanticType,
    pub nullable: bool,
}

impl Param {
    pub fn conversion(&self) -> BoundaryConversion {
        BoundaryConversion::new(self.ty.clone())
    }
}

/// SQL text plus its ordered parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Bind one value per parameter, in parameter order.
    pub fn bind<I, V>(&self, values: I) -> SchemaResult<BoundStatement>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.params.len() {
            return Err(SchemaError::configuration(format!(
                "statement expects {} parameters, got {}",
                self.params.len(),
                values.len()
            )));
        }
        let values = self
            .params
            .iter()
            .zip(values)
            .map(|(param, value)| convert(param, value))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(BoundStatement {
            sql: self.sql.clone(),
            values,
        })
    }

    /// Bind from a full record given in column declaration order.
    ///
    /// Each parameter takes the value at its column index, so the same row
    /// can be bound to insert, update, upsert, and delete statements.
    pub fn bind_record(&self, row: &[Value]) -> SchemaResult<BoundStatement> {
        let values = self
            .params
            .iter()
            .map(|param| {
                let value = row.get(param.index).cloned().ok_or_else(|| {
                    SchemaError::configuration(format!(
                        "record has {} values but column '{}' is at position {}",
                        row.len(),
                        param.column,
                        param.index
                    ))
                })?;
                convert(param, value)
            })
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(BoundStatement {
            sql: self.sql.clone(),
            values,
        })
    }
}

fn convert(param: &Param, value: Value) -> SchemaResult<Value> {
    param.conversion().to_storage(value).map_err(|e| match e {
        SchemaError::Conversion { ty, message } => SchemaError::conversion(
            ty,
            format!("column '{}': {message}", param.column),
        ),
        other => other,
    })
}

/// SQL text with storage values, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl BoundStatement {
    /// SQL with caller-supplied values, converted by value kind only.
    pub fn new<I, V>(sql: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            sql: sql.into(),
            values: values
                .into_iter()
                .map(|v| v.into().into_storage())
                .collect(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get parameters as references compatible with tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}

/// Allocates placeholders while a statement is being written.
pub(crate) struct ParamWriter<'a> {
    schema: &'a TableSchema,
    style: PlaceholderStyle,
    params: Vec<Param>,
}

impl<'a> ParamWriter<'a> {
    pub(crate) fn new(schema: &'a TableSchema, style: PlaceholderStyle) -> Self {
        Self {
            schema,
            style,
            params: Vec::new(),
        }
    }

    /// Write a fresh placeholder for the column at `index`.
    pub(crate) fn push(&mut self, out: &mut String, index: usize) {
        let column = &self.schema.columns()[index];
        self.params.push(Param {
            index,
            column: column.name.clone(),
            ty: column.ty.clone(),
            nullable: column.nullable,
        });
        self.write_placeholder(out, self.params.len());
    }

    /// Write a placeholder for a column that may already be bound.
    ///
    /// Numbered placeholders reuse the existing number; positional
    /// placeholders cannot refer back, so the column is bound again.
    pub(crate) fn reuse(&mut self, out: &mut String, index: usize) {
        if self.style == PlaceholderStyle::Numbered {
            if let Some(pos) = self.params.iter().position(|p| p.index == index) {
                self.write_placeholder(out, pos + 1);
                return;
            }
        }
        self.push(out, index);
    }

    fn write_placeholder(&self, out: &mut String, number: usize) {
        match self.style {
            PlaceholderStyle::Numbered => {
                out.push('$');
                out.push_str(&number.to_string());
            }
            PlaceholderStyle::Positional => out.push('?'),
        }
    }

    pub(crate) fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}
