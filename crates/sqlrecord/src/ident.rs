//! Identifier quoting and literal escaping.
//!
//! Every table and column name that reaches generated SQL goes through
//! [`quote_ident`], so a name is always a single quoted identifier no matter
//! what characters it contains:
//!
//! - Identifiers are wrapped in `"` and an embedded `"` is written as `""`
//! - Literals are wrapped in `'` and an embedded `'` is written as `''`
//!
//! [`escape_literal`] is only meant for constant text that is part of a
//! definition (for example a default in a raw SQL line). Application values
//! never go through it; they are always bound as parameters.
//!
//! # Example
//! ```
//! use sqlrecord::ident::{escape_literal, quote_ident};
//!
//! assert_eq!(quote_ident("users"), r#""users""#);
//! assert_eq!(quote_ident(r#"a"b"#), r#""a""b""#);
//! assert_eq!(escape_literal("it's"), "'it''s'");
//! ```

use crate::error::{SchemaError, SchemaResult};

/// Quote an identifier (table or column name).
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(&mut out, name);
    out
}

/// Quote each identifier and join them with `", "`.
pub fn quote_ident_list<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_quoted(&mut out, name);
    }
    out
}

/// Escape constant text as a single-quoted SQL string literal.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

pub(crate) fn write_quoted(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Reject names that cannot be represented as a quoted identifier.
///
/// PostgreSQL forbids empty quoted identifiers and NUL anywhere in the text.
pub(crate) fn check_ident(name: &str, what: &str) -> SchemaResult<()> {
    if name.is_empty() {
        return Err(SchemaError::validation(format!("{what} cannot be empty")));
    }
    if name.contains('\0') {
        return Err(SchemaError::validation(format!(
            "{what} '{}' cannot contain NUL character",
            name.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_simple() {
        assert_eq!(quote_ident("users"), r#""users""#);
    }

    #[test]
    fn quote_keeps_case_and_spaces() {
        assert_eq!(quote_ident("Order Items"), r#""Order Items""#);
    }

    #[test]
    fn quote_doubles_embedded_quote() {
        assert_eq!(quote_ident(r#"a"b"#), r#""a""b""#);
        assert_eq!(quote_ident(r#""""#), r#""""""""#);
    }

    #[test]
    fn quote_does_not_treat_dot_as_separator() {
        assert_eq!(quote_ident("public.users"), r#""public.users""#);
    }

    #[test]
    fn quote_list() {
        assert_eq!(quote_ident_list(["a", "b"]), r#""a", "b""#);
        assert_eq!(quote_ident_list(std::iter::empty()), "");
    }

    #[test]
    fn literal_doubles_single_quote() {
        assert_eq!(escape_literal("plain"), "'plain'");
        assert_eq!(escape_literal("it's"), "'it''s'");
        assert_eq!(escape_literal("'; DROP TABLE x; --"), "'''; DROP TABLE x; --'");
    }

    #[test]
    fn check_ident_rejects_empty_and_nul() {
        assert!(check_ident("", "column name").is_err());
        assert!(check_ident("a\0b", "column name").is_err());
        assert!(check_ident(r#"we"ird"#, "column name").is_ok());
    }
}
