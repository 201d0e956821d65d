//! Rendering of a compiled table into a `.sql` catalog file.

use sqlrecord::{CompiledTable, Statement, ddl};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// First line of every catalog file; marks files the generator owns.
pub const HEADER: &str = "-- Code generated by sqlrecord. DO NOT EDIT.";

const TABLE_PREFIX: &str = "-- table: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub table: String,
    pub path: PathBuf,
    pub content: String,
}

/// One file per table under `out_dir`.
///
/// Fails when two tables map to the same file name. Names are compared
/// case-insensitively so the catalog stays portable.
pub fn generate_catalog(
    out_dir: &Path,
    tables: &[CompiledTable],
) -> anyhow::Result<Vec<GeneratedFile>> {
    let mut owners = HashMap::<String, &str>::new();
    let mut files = Vec::with_capacity(tables.len());
    for t in tables {
        let file_name = format!("{}.sql", file_stem(t.table_name()));
        let path = out_dir.join(&file_name);
        if let Some(prev) = owners.insert(file_name.to_ascii_lowercase(), t.table_name()) {
            anyhow::bail!(
                "tables '{prev}' and '{}' both write {}",
                t.table_name(),
                path.display()
            );
        }
        files.push(GeneratedFile {
            table: t.table_name().to_string(),
            path,
            content: render_table(t),
        });
    }
    Ok(files)
}

/// The table a generated file was rendered for, or `None` when `content`
/// was not written by the generator.
pub fn generated_table(content: &str) -> Option<&str> {
    let mut lines = content.lines();
    if lines.next()? != HEADER {
        return None;
    }
    lines.next()?.strip_prefix(TABLE_PREFIX)
}

/// Every statement for `table`, each preceded by `-- name:` and, when it
/// takes parameters, a `-- params:` line.
pub fn render_table(table: &CompiledTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADER}");
    let _ = writeln!(out, "{TABLE_PREFIX}{}", table.table_name());

    let schema = table.schema();
    let truncate = ddl::truncate(schema, false);
    let drop = ddl::drop(schema, false);

    let mut statements = table.named_statements();
    statements.insert(1, ("truncate".to_string(), &truncate));
    statements.insert(2, ("drop_table".to_string(), &drop));

    for (name, stmt) in statements {
        out.push('\n');
        write_statement(&mut out, &name, stmt);
    }
    out
}

fn write_statement(out: &mut String, name: &str, stmt: &Statement) {
    let _ = writeln!(out, "-- name: {name}");
    if !stmt.params.is_empty() {
        let params = stmt
            .params
            .iter()
            .map(|p| format!("{} {}", p.column, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "-- params: {params}");
    }
    let _ = writeln!(out, "{}", stmt.sql);
}

/// Table names are arbitrary identifiers; keep file names portable.
fn file_stem(table: &str) -> String {
    table
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
