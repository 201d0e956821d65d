use crate::cli::InitArgs;
use std::path::Path;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

pub(crate) const TEMPLATE: &str = r#"version = "1"

# Output directory for <table>.sql files, relative to this file.
out = "sql"

[compile]
placeholder = "numbered"        # numbered ($1, $2) | positional (?)
insert_conflict = "do_nothing"  # do_nothing | fail

[types]
# Custom type names, or replacements for built-in mappings.
"uuid" = "UUID"
# "datetime" = "TIMESTAMPTZ"

[[tables]]
name = "users"
primary_keys = 1

[[tables.columns]]
name = "id"
type = "i64"

[[tables.columns]]
name = "email"
type = "text"
unique = true

[[tables.columns]]
name = "external_id"
type = "uuid"
nullable = true

# Column types: bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64,
# text, char, bytes, datetime, enum:<width> (e.g. enum:u8), or any name
# listed under [types].
#
# Per-column options:
#   nullable = true
#   unique = true
#   unique_group = 1                          # shared id -> UNIQUE(a, b)
#   check = "> 0"                             # CHECK("col" > 0)
#   references = { table = "orgs", column = "id" }
#
# Raw table constraints:
#   sql = ["CONSTRAINT email_lower CHECK (email = lower(email))"]
"#;

fn write_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    std::fs::write(path, TEMPLATE)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}
