//! Table management statements: `CREATE TABLE`, `TRUNCATE`, `DROP TABLE`.

use crate::ident::{quote_ident, write_quoted};
use crate::schema::TableSchema;
use crate::statement::Statement;

/// Build the `CREATE TABLE IF NOT EXISTS` statement for a schema.
///
/// Columns appear in declaration order, followed by the primary key and then
/// unique, check, foreign key, and raw clauses in that order.
pub fn create_table(schema: &TableSchema) -> Statement {
    let mut sql = String::from("CREATE TABLE IF NOT EXISTS ");
    write_quoted(&mut sql, schema.table_name());
    sql.push_str(" (");

    for (i, column) in schema.columns().iter().enumerate() {
        write_quoted(&mut sql, &column.name);
        sql.push(' ');
        sql.push_str(schema.sql_type(i));
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        sql.push_str(", ");
    }

    sql.push_str("PRIMARY KEY(");
    write_column_list(&mut sql, schema, 0..schema.primary_key_count());
    sql.push(')');

    for clause in constraint_clauses(schema) {
        sql.push_str(", ");
        sql.push_str(&clause);
    }

    sql.push_str(");");
    Statement::raw(sql)
}

/// The clauses that follow `PRIMARY KEY(...)`, in emission order.
pub fn constraint_clauses(schema: &TableSchema) -> Vec<String> {
    let columns = schema.columns();
    let mut clauses = Vec::with_capacity(
        schema.unique_groups().len()
            + schema.checks().len()
            + schema.foreign_keys().len()
            + schema.extra_sql().len(),
    );

    for group in schema.unique_groups() {
        let mut clause = String::from("UNIQUE(");
        write_column_list(&mut clause, schema, group.columns.iter().copied());
        clause.push(')');
        clauses.push(clause);
    }

    for check in schema.checks() {
        let mut clause = String::from("CHECK(");
        write_quoted(&mut clause, &columns[check.column].name);
        clause.push(' ');
        clause.push_str(&check.predicate);
        clause.push(')');
        clauses.push(clause);
    }

    for fk in schema.foreign_keys() {
        clauses.push(format!(
            "FOREIGN KEY({}) REFERENCES {}({})",
            quote_ident(&columns[fk.column].name),
            quote_ident(&fk.foreign_table),
            quote_ident(&fk.foreign_key)
        ));
    }

    for line in schema.extra_sql() {
        let line = line.trim().trim_end_matches(',').trim_end();
        if !line.is_empty() {
            clauses.push(line.to_string());
        }
    }

    clauses
}

/// `TRUNCATE "table"[ CASCADE];`
pub fn truncate(schema: &TableSchema, cascade: bool) -> Statement {
    Statement::raw(format!(
        "TRUNCATE {}{};",
        quote_ident(schema.table_name()),
        cascade_suffix(cascade)
    ))
}

/// `DROP TABLE IF EXISTS "table"[ CASCADE];`
pub fn drop(schema: &TableSchema, cascade: bool) -> Statement {
    Statement::raw(format!(
        "DROP TABLE IF EXISTS {}{};",
        quote_ident(schema.table_name()),
        cascade_suffix(cascade)
    ))
}

fn cascade_suffix(cascade: bool) -> &'static str {
    if cascade { " CASCADE" } else { "" }
}

pub(crate) fn write_column_list(
    out: &mut String,
    schema: &TableSchema,
    indices: impl IntoIterator<Item = usize>,
) {
    for (i, index) in indices.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_quoted(out, &schema.columns()[index].name);
    }
}
