//! Table registry: row-type names to physical table identifiers
//!
//! The mapping between a typed row description and its physical table is an
//! explicit registration, supplied at construction time, never a declarative
//! annotation read from ambient state. Each mapping also carries the ordered
//! field schema used to validate member access during query construction.

use quarry_ir::Schema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("table mapping not found: {0}")]
    TableNotFound(String),

    #[error("table mapping already registered: {0}")]
    Duplicate(String),
}

/// One registered row type: logical name, physical table identifier, and the
/// ordered field list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMapping {
    pub name: String,
    pub table: String,
    pub schema: Schema,
}

#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, TableMapping>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mapping: TableMapping) -> Result<(), RegistryError> {
        if self.tables.contains_key(&mapping.name) {
            return Err(RegistryError::Duplicate(mapping.name));
        }
        self.tables.insert(mapping.name.clone(), mapping);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&TableMapping, RegistryError> {
        self.tables
            .get(name)
            .ok_or_else(|| RegistryError::TableNotFound(name.to_string()))
    }
}
