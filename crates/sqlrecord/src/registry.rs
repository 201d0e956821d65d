//! Compiled tables and the process-wide table registry.
//!
//! Compiling a table renders every statement once; the registry caches the
//! result per table name so record types can look their SQL up cheaply.
//! Record types registered via [`TableRegistration`] are picked up by
//! [`TableRegistry::global`] the first time it is used.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use serde::Serialize;

use crate::accessor::AccessorSet;
use crate::crud;
use crate::ddl;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::TableSchema;
use crate::statement::{CompileOptions, Statement};

/// Every statement for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledTable {
    schema: TableSchema,
    options: CompileOptions,
    pub create: Statement,
    pub select_all: Statement,
    pub insert: Statement,
    /// `None` when the table has no data columns.
    pub update: Option<Statement>,
    pub upsert: Statement,
    pub delete: Statement,
    pub accessors: AccessorSet,
}

impl CompiledTable {
    pub fn compile(schema: TableSchema, options: CompileOptions) -> SchemaResult<Self> {
        let update = match crud::update(&schema, &options) {
            Ok(stmt) => Some(stmt),
            Err(e) if e.is_configuration() && schema.data_columns().is_empty() => None,
            Err(e) => return Err(e),
        };
        let accessors = AccessorSet::build(&schema, &options)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            table = schema.table_name(),
            columns = schema.columns().len(),
            primary_keys = schema.primary_key_count(),
            accessors = accessors.len(),
            "compiled table"
        );

        Ok(Self {
            create: ddl::create_table(&schema),
            select_all: crud::select_all(&schema),
            insert: crud::insert(&schema, &options),
            upsert: crud::upsert(&schema, &options),
            delete: crud::delete_by_primary_key(&schema, &options),
            update,
            accessors,
            schema,
            options,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn table_name(&self) -> &str {
        self.schema.table_name()
    }

    /// The update statement, or a configuration error for key-only tables.
    pub fn update_statement(&self) -> SchemaResult<&Statement> {
        self.update.as_ref().ok_or_else(|| {
            SchemaError::configuration(format!(
                "table '{}' has no data columns to update",
                self.table_name()
            ))
        })
    }

    /// Every named statement in a stable order: create, crud, then
    /// accessors by mask.
    pub fn named_statements(&self) -> Vec<(String, &Statement)> {
        let mut out = vec![
            ("create_table".to_string(), &self.create),
            ("select_all".to_string(), &self.select_all),
            ("insert".to_string(), &self.insert),
        ];
        if let Some(update) = &self.update {
            out.push(("update".to_string(), update));
        }
        out.push(("upsert".to_string(), &self.upsert));
        out.push(("delete".to_string(), &self.delete));
        for accessor in &self.accessors {
            out.push((accessor.select_name(), &accessor.select));
            out.push((accessor.delete_name(), &accessor.delete));
        }
        out
    }
}

/// Registration entry for record types linked into the binary.
///
/// ```ignore
/// fn register_users(registry: &TableRegistry) -> SchemaResult<()> {
///     registry.register_record::<User>()
/// }
///
/// sqlrecord::inventory::submit! {
///     sqlrecord::TableRegistration { register_fn: register_users }
/// }
/// ```
pub struct TableRegistration {
    /// Function that registers one table with a registry.
    pub register_fn: fn(&TableRegistry) -> SchemaResult<()>,
}

inventory::collect!(TableRegistration);

static GLOBAL: OnceLock<TableRegistry> = OnceLock::new();

/// Compiled tables by name.
#[derive(Debug, Default)]
pub struct TableRegistry {
    options: CompileOptions,
    tables: RwLock<HashMap<String, Arc<CompiledTable>>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            options,
            tables: RwLock::default(),
        }
    }

    /// The process-wide registry, seeded from every [`TableRegistration`].
    ///
    /// Uses default options unless [`TableRegistry::init_global`] ran first.
    /// Registrations that fail are skipped (and logged with the `tracing`
    /// feature); they surface again when the record type compiles its
    /// table on first use.
    pub fn global() -> &'static TableRegistry {
        GLOBAL.get_or_init(|| TableRegistry::seeded(CompileOptions::default()))
    }

    /// Create the process-wide registry with `options`.
    ///
    /// Must run before anything touches [`TableRegistry::global`]. Calling it
    /// again with the same options returns the existing registry; different
    /// options are a configuration error.
    pub fn init_global(options: CompileOptions) -> SchemaResult<&'static TableRegistry> {
        let registry = GLOBAL.get_or_init(|| TableRegistry::seeded(options));
        if registry.options != options {
            return Err(SchemaError::configuration(format!(
                "global registry already initialized with {:?}",
                registry.options
            )));
        }
        Ok(registry)
    }

    fn seeded(options: CompileOptions) -> TableRegistry {
        let registry = TableRegistry::with_options(options);
        for reg in inventory::iter::<TableRegistration> {
            if let Err(_e) = (reg.register_fn)(&registry) {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "table registration failed");
            }
        }
        registry
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile and store a table, replacing any previous entry of that name.
    pub fn register(&self, schema: TableSchema) -> SchemaResult<Arc<CompiledTable>> {
        let compiled = Arc::new(CompiledTable::compile(schema, self.options)?);
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.insert(compiled.table_name().to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn register_record<R: crate::record::SqlRecord>(&self) -> SchemaResult<()> {
        self.register(R::table_schema()?).map(|_| ())
    }

    pub fn get(&self, table: &str) -> Option<Arc<CompiledTable>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.get(table).cloned()
    }

    pub fn require(&self, table: &str) -> SchemaResult<Arc<CompiledTable>> {
        self.get(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))
    }

    /// Fetch a table, compiling it with `schema` on first use.
    pub fn get_or_register(
        &self,
        table: &str,
        schema: impl FnOnce() -> SchemaResult<TableSchema>,
    ) -> SchemaResult<Arc<CompiledTable>> {
        if let Some(found) = self.get(table) {
            return Ok(found);
        }
        let schema = schema()?;
        if schema.table_name() != table {
            return Err(SchemaError::configuration(format!(
                "schema for '{table}' declares table '{}'",
                schema.table_name()
            )));
        }
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if let Some(found) = tables.get(table) {
            return Ok(Arc::clone(found));
        }
        let compiled = Arc::new(CompiledTable::compile(schema, self.options)?);
        tables.insert(table.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<_> = tables.keys().cloned().collect();
        names.sort();
        names
    }
}
