use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use crate::catalog::catalog::Catalog;
use crate::catalog::schema::{TableDef, TableSchema};
use crate::error::Result;
use crate::value_err;

/// An in-process [`Catalog`], filled either programmatically or from a
/// schema file.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    tables: HashMap<String, TableSchema>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tables: Vec<TableDef>,
}

impl MemoryCatalog {
    pub fn new() -> MemoryCatalog {
        MemoryCatalog { tables: HashMap::new() }
    }

    /// Loads table schemas from a YAML/TOML/JSON file shaped like
    ///
    /// ```yaml
    /// tables:
    ///   - name: Events
    ///     fields:
    ///       - { name: Tags, type: String, is_list: true }
    /// ```
    pub fn from_file(file: &str) -> Result<MemoryCatalog> {
        let file: CatalogFile = config::Config::builder()
            .add_source(config::File::with_name(file))
            .build()?
            .try_deserialize()?;
        let mut catalog = MemoryCatalog::new();
        for def in file.tables {
            catalog.create_table(def.into())?;
        }
        Ok(catalog)
    }

    /// Declares a new table
    pub fn create_table(&mut self, schema: TableSchema) -> Result<()> {
        schema.validate()?;
        if self.tables.contains_key(&schema.name) {
            return Err(value_err!("Table {} already exists", schema.name));
        }
        debug!("declaring {}", schema);
        self.tables.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Builder style [`MemoryCatalog::create_table`]
    pub fn with_table(mut self, schema: TableSchema) -> Result<MemoryCatalog> {
        self.create_table(schema)?;
        Ok(self)
    }
}

impl Catalog for MemoryCatalog {
    fn get_schema(&self, table_name: &str) -> Result<Option<TableSchema>> {
        Ok(self.tables.get(table_name).cloned())
    }
}
