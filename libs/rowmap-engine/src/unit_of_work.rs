use std::collections::HashMap;

use rowmap_api::MapperError;

use crate::config::MapperConfig;
use crate::table::Table;

/// Scope of identity and change tracking: one request or one transaction.
///
/// Owns one [`Table`] (and so one identity map) per configured table. Pass it
/// explicitly to whatever loads or saves rows; drop it at scope end to
/// discard every registry at once. Concurrent units of work each build their
/// own.
#[derive(Debug)]
pub struct UnitOfWork {
    tables: HashMap<String, Table>,
}

impl UnitOfWork {
    pub fn new(config: &MapperConfig) -> Result<Self, MapperError> {
        let mut tables = HashMap::with_capacity(config.tables.len());
        for schema in &config.tables {
            let table = Table::new(schema.clone())?;
            tables.insert(schema.name.clone(), table);
        }
        tracing::debug!(tables = tables.len(), "started unit of work");
        Ok(Self { tables })
    }

    pub fn table(&self, name: &str) -> Result<&Table, MapperError> {
        self.tables
            .get(name)
            .ok_or_else(|| MapperError::UnknownTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table, MapperError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| MapperError::UnknownTable(name.to_string()))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Rows tracked across all tables.
    pub fn tracked_rows(&self) -> usize {
        self.tables.values().map(|t| t.identity().len()).sum()
    }
}
