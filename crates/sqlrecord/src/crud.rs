//! CRUD statement templates.
//!
//! All templates bind values through placeholders; the only text spliced
//! into the SQL is quoted identifiers and, for [`select_where`] /
//! [`delete_where`], the caller's condition.
//!
//! Insert, update, and upsert parameters carry column indices, so the same
//! record (values in declaration order) can be bound to any of them with
//! [`Statement::bind_record`].

use crate::ddl::write_column_list;
use crate::error::{SchemaError, SchemaResult};
use crate::ident::{quote_ident, write_quoted};
use crate::schema::TableSchema;
use crate::statement::{BoundStatement, CompileOptions, InsertConflict, ParamWriter, Statement};
use crate::value::Value;

/// `SELECT * FROM "table";`
pub fn select_all(schema: &TableSchema) -> Statement {
    Statement::raw(format!("SELECT * FROM {};", quote_ident(schema.table_name())))
}

/// `SELECT * FROM "table" WHERE <condition>;`
///
/// The condition is used verbatim and must reference its own placeholders;
/// `params` are kept in the given order.
pub fn select_where<I, V>(schema: &TableSchema, condition: &str, params: I) -> BoundStatement
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    BoundStatement::new(
        format!(
            "SELECT * FROM {} WHERE {};",
            quote_ident(schema.table_name()),
            condition.trim().trim_end_matches(';')
        ),
        params,
    )
}

/// `DELETE FROM "table" WHERE <condition>;`
pub fn delete_where<I, V>(schema: &TableSchema, condition: &str, params: I) -> BoundStatement
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    BoundStatement::new(
        format!(
            "DELETE FROM {} WHERE {};",
            quote_ident(schema.table_name()),
            condition.trim().trim_end_matches(';')
        ),
        params,
    )
}

/// `INSERT INTO "table" (<all columns>) VALUES(<placeholders>)[ ON CONFLICT(<pk>) DO NOTHING];`
pub fn insert(schema: &TableSchema, options: &CompileOptions) -> Statement {
    let mut w = ParamWriter::new(schema, options.placeholder);
    let mut sql = insert_head(schema, &mut w);
    if options.insert_conflict == InsertConflict::DoNothing {
        sql.push_str(" ON CONFLICT(");
        write_column_list(&mut sql, schema, 0..schema.primary_key_count());
        sql.push_str(") DO NOTHING");
    }
    sql.push(';');
    w.finish(sql)
}

/// `UPDATE "table" SET <data col> = <p>, ... WHERE <pk col> = <p> AND ...;`
///
/// Fails with a configuration error when every column is part of the
/// primary key, since there is nothing to set.
pub fn update(schema: &TableSchema, options: &CompileOptions) -> SchemaResult<Statement> {
    if schema.data_columns().is_empty() {
        return Err(SchemaError::configuration(format!(
            "table '{}' has no data columns to update",
            schema.table_name()
        )));
    }

    let mut w = ParamWriter::new(schema, options.placeholder);
    let mut sql = String::from("UPDATE ");
    write_quoted(&mut sql, schema.table_name());
    sql.push_str(" SET ");
    write_assignments(&mut sql, schema, &mut w, false);
    sql.push_str(" WHERE ");
    write_key_condition(&mut sql, schema, &mut w, 0..schema.primary_key_count());
    sql.push(';');
    Ok(w.finish(sql))
}

/// `INSERT ... ON CONFLICT(<pk>) DO UPDATE SET <data col> = <p>, ...;`
///
/// A table without data columns falls back to `DO NOTHING`.
pub fn upsert(schema: &TableSchema, options: &CompileOptions) -> Statement {
    let mut w = ParamWriter::new(schema, options.placeholder);
    let mut sql = insert_head(schema, &mut w);
    sql.push_str(" ON CONFLICT(");
    write_column_list(&mut sql, schema, 0..schema.primary_key_count());
    if schema.data_columns().is_empty() {
        sql.push_str(") DO NOTHING;");
    } else {
        sql.push_str(") DO UPDATE SET ");
        write_assignments(&mut sql, schema, &mut w, true);
        sql.push(';');
    }
    w.finish(sql)
}

/// `DELETE FROM "table" WHERE <pk col> = <p> AND ...;`
pub fn delete_by_primary_key(schema: &TableSchema, options: &CompileOptions) -> Statement {
    keyed_delete(schema, options, 0..schema.primary_key_count())
}

/// `SELECT * FROM "table" WHERE <col> = <p> AND ...;` over the given columns.
pub(crate) fn keyed_select(
    schema: &TableSchema,
    options: &CompileOptions,
    columns: impl IntoIterator<Item = usize>,
) -> Statement {
    let mut w = ParamWriter::new(schema, options.placeholder);
    let mut sql = String::from("SELECT * FROM ");
    write_quoted(&mut sql, schema.table_name());
    sql.push_str(" WHERE ");
    write_key_condition(&mut sql, schema, &mut w, columns);
    sql.push(';');
    w.finish(sql)
}

/// `DELETE FROM "table" WHERE <col> = <p> AND ...;` over the given columns.
pub(crate) fn keyed_delete(
    schema: &TableSchema,
    options: &CompileOptions,
    columns: impl IntoIterator<Item = usize>,
) -> Statement {
    let mut w = ParamWriter::new(schema, options.placeholder);
    let mut sql = String::from("DELETE FROM ");
    write_quoted(&mut sql, schema.table_name());
    sql.push_str(" WHERE ");
    write_key_condition(&mut sql, schema, &mut w, columns);
    sql.push(';');
    w.finish(sql)
}

fn insert_head(schema: &TableSchema, w: &mut ParamWriter<'_>) -> String {
    let mut sql = String::from("INSERT INTO ");
    write_quoted(&mut sql, schema.table_name());
    sql.push_str(" (");
    write_column_list(&mut sql, schema, 0..schema.columns().len());
    sql.push_str(") VALUES(");
    for index in 0..schema.columns().len() {
        if index > 0 {
            sql.push_str(", ");
        }
        w.push(&mut sql, index);
    }
    sql.push(')');
    sql
}

fn write_assignments(sql: &mut String, schema: &TableSchema, w: &mut ParamWriter<'_>, reuse: bool) {
    for (i, index) in (schema.primary_key_count()..schema.columns().len()).enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        write_quoted(sql, &schema.columns()[index].name);
        sql.push_str(" = ");
        if reuse {
            w.reuse(sql, index);
        } else {
            w.push(sql, index);
        }
    }
}

pub(crate) fn write_key_condition(
    sql: &mut String,
    schema: &TableSchema,
    w: &mut ParamWriter<'_>,
    columns: impl IntoIterator<Item = usize>,
) {
    for (i, index) in columns.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        write_quoted(sql, &schema.columns()[index].name);
        sql.push_str(" = ");
        w.push(sql, index);
    }
}
