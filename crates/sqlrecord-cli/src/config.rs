use serde::Deserialize;
use sqlrecord::{CompileOptions, SemanticType, TableSchema, TypeMapper};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!(
                "invalid config file {}: {e:#}",
                config_path.display()
            )
        })?;

        Ok(Self { config_dir, file })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.file.out)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    #[serde(default = "default_out")]
    pub out: String,

    #[serde(default)]
    pub compile: CompileOptions,

    /// Type name -> SQL type text, for custom types or to replace a built-in.
    #[serde(default)]
    pub types: BTreeMap<String, String>,

    #[serde(default)]
    pub tables: Vec<TableDef>,
}

fn default_out() -> String {
    "sql".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default = "default_primary_keys")]
    pub primary_keys: usize,
    pub columns: Vec<ColumnDef>,
    /// Raw table-constraint lines appended to CREATE TABLE.
    #[serde(default)]
    pub sql: Vec<String>,
}

fn default_primary_keys() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    /// Columns sharing a group id are unique in aggregate.
    pub unique_group: Option<i64>,
    /// Predicate appended to the column, e.g. `> 0`.
    pub check: Option<String>,
    pub references: Option<ReferenceDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceDef {
    pub table: String,
    pub column: String,
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.out = expand_env_vars(&file.out)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if self.out.trim().is_empty() {
            anyhow::bail!("out must not be empty");
        }

        let mut seen = std::collections::HashSet::<&str>::new();
        for t in &self.tables {
            if !seen.insert(t.name.as_str()) {
                anyhow::bail!("duplicate tables.name: {}", t.name);
            }
            if t.columns.is_empty() {
                anyhow::bail!("tables.columns must not be empty (table: {})", t.name);
            }
        }

        Ok(())
    }

    pub fn type_mapper(&self) -> TypeMapper {
        TypeMapper::with_overrides(self.types.clone())
    }

    /// Build and validate every table schema.
    pub fn schemas(&self) -> anyhow::Result<Vec<TableSchema>> {
        let mapper = self.type_mapper();
        self.tables
            .iter()
            .map(|t| {
                t.to_schema(&mapper)
                    .map_err(|e| anyhow::anyhow!("table '{}': {e}", t.name))
            })
            .collect()
    }
}

impl TableDef {
    pub fn to_schema(&self, mapper: &TypeMapper) -> Result<TableSchema, sqlrecord::SchemaError> {
        let mut b = TableSchema::builder(&self.name)
            .primary_keys(self.primary_keys)
            .type_mapper(mapper.clone());

        for c in &self.columns {
            let ty: SemanticType = c.ty.parse()?;
            b = if c.nullable {
                b.nullable_column(&c.name, ty)
            } else {
                b.column(&c.name, ty)
            };
            if c.unique {
                b = b.unique(c.name.as_str());
            }
            if let Some(group) = c.unique_group {
                b = b.unique_in_group(group, c.name.as_str());
            }
            if let Some(check) = &c.check {
                b = b.check(c.name.as_str(), check);
            }
            if let Some(r) = &c.references {
                b = b.foreign_key(c.name.as_str(), &r.table, &r.column);
            }
        }

        for line in &self.sql {
            b = b.sql(line);
        }

        b.build()
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
