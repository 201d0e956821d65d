//! Keyed select/delete accessors over every primary-key subset.
//!
//! A table with `k` primary-key columns gets `2^k - 1` accessor pairs, one
//! per non-empty subset of its key. Subsets are identified by a bitmask
//! where bit `i` selects primary-key column `i`; within a subset columns
//! always appear in declaration order, so `select_by_a_c` exists but
//! `select_by_c_a` does not.

use std::collections::HashMap;

use serde::Serialize;

use crate::crud::{keyed_delete, keyed_select};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::TableSchema;
use crate::statement::{CompileOptions, Statement};

/// Largest primary key for which accessors are generated.
pub const MAX_ACCESSOR_KEY_COLUMNS: usize = 16;

/// Key sizes at or above this are compiled with a warning.
const LARGE_KEY_WARNING: usize = 10;

/// How many rows an accessor can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// The full primary key: at most one row.
    One,
    /// A strict subset of the key.
    Many,
}

/// Select and delete statements for one primary-key subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedAccessor {
    pub mask: u32,
    /// Primary-key column indices, ascending.
    pub columns: Vec<usize>,
    /// Column names joined with `_`.
    pub signature: String,
    pub cardinality: Cardinality,
    pub select: Statement,
    pub delete: Statement,
}

impl KeyedAccessor {
    pub fn select_name(&self) -> String {
        format!("select_by_{}", self.signature)
    }

    pub fn delete_name(&self) -> String {
        format!("delete_by_{}", self.signature)
    }

    pub fn column_names<'s>(&self, schema: &'s TableSchema) -> Vec<&'s str> {
        self.columns
            .iter()
            .map(|&i| schema.columns()[i].name.as_str())
            .collect()
    }
}

/// All accessors for a table, ordered by mask.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessorSet {
    accessors: Vec<KeyedAccessor>,
    /// Primary-key column names; position `i` is mask bit `i`.
    key_columns: Vec<String>,
    #[serde(skip)]
    by_signature: HashMap<String, usize>,
}

impl AccessorSet {
    /// Build accessors for every non-empty subset of the primary key.
    pub fn build(schema: &TableSchema, options: &CompileOptions) -> SchemaResult<Self> {
        let k = schema.primary_key_count();
        if k > MAX_ACCESSOR_KEY_COLUMNS {
            return Err(SchemaError::configuration(format!(
                "table '{}' has {k} primary key columns; accessors support at most {MAX_ACCESSOR_KEY_COLUMNS}",
                schema.table_name()
            )));
        }
        if k >= LARGE_KEY_WARNING {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                table = schema.table_name(),
                key_columns = k,
                accessors = (1u32 << k) - 1,
                "large primary key, generating every keyed accessor"
            );
        }

        let count = (1u32 << k) - 1;
        let mut accessors = Vec::with_capacity(count as usize);
        let mut by_signature = HashMap::with_capacity(count as usize);
        for mask in 1..=count {
            let columns = mask_columns(mask, k);
            let names = columns
                .iter()
                .map(|&i| schema.columns()[i].name.as_str())
                .collect::<Vec<_>>();
            let signature = names.join("_");
            let cardinality = if columns.len() == k {
                Cardinality::One
            } else {
                Cardinality::Many
            };
            // Joining with `_` is ambiguous once key names contain `_`.
            if let Some(&other) = by_signature.get(&signature) {
                let other: &KeyedAccessor = &accessors[other];
                return Err(SchemaError::configuration(format!(
                    "table '{}': primary key subsets ({}) and ({}) both produce accessor name '{signature}'",
                    schema.table_name(),
                    other.column_names(schema).join(", "),
                    names.join(", ")
                )));
            }
            by_signature.insert(signature.clone(), accessors.len());
            accessors.push(KeyedAccessor {
                mask,
                select: keyed_select(schema, options, columns.iter().copied()),
                delete: keyed_delete(schema, options, columns.iter().copied()),
                columns,
                signature,
                cardinality,
            });
        }

        Ok(Self {
            accessors,
            key_columns: schema
                .primary_keys()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            by_signature,
        })
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyedAccessor> {
        self.accessors.iter()
    }

    pub fn get_by_mask(&self, mask: u32) -> Option<&KeyedAccessor> {
        let pos = usize::try_from(mask).ok()?.checked_sub(1)?;
        self.accessors.get(pos)
    }

    /// Look up an accessor by signature, e.g. `"a_c"`.
    pub fn get(&self, signature: &str) -> Option<&KeyedAccessor> {
        self.by_signature
            .get(signature)
            .map(|&pos| &self.accessors[pos])
    }

    /// Look up an accessor by column names, which must be distinct
    /// primary-key columns given in declaration order.
    pub fn get_by_columns(&self, columns: &[&str]) -> Option<&KeyedAccessor> {
        let mut mask = 0u32;
        let mut last = None;
        for name in columns {
            let bit = self.key_columns.iter().position(|c| c == name)?;
            if last.is_some_and(|prev| prev >= bit) {
                return None;
            }
            last = Some(bit);
            mask |= 1 << bit;
        }
        self.get_by_mask(mask)
    }

    /// The accessor over the whole primary key.
    pub fn full_key(&self) -> Option<&KeyedAccessor> {
        self.accessors.last()
    }
}

impl<'a> IntoIterator for &'a AccessorSet {
    type Item = &'a KeyedAccessor;
    type IntoIter = std::slice::Iter<'a, KeyedAccessor>;

    fn into_iter(self) -> Self::IntoIter {
        self.accessors.iter()
    }
}

fn mask_columns(mask: u32, k: usize) -> Vec<usize> {
    (0..k).filter(|&i| mask & (1 << i) != 0).collect()
}
