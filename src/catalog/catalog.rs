use crate::catalog::field::split_field_table_name;
use crate::catalog::schema::{Schemas, TableSchema};
use crate::error::Result;
use crate::value_err;

/// The catalog stores the declared schema of every table. The query
/// compiler only ever reads from it.
pub trait Catalog {
    /// Gets the schema of a table, if it was declared
    fn get_schema(&self, table_name: &str) -> Result<Option<TableSchema>>;

    /// Gets the schema of a table, and errors if it was not declared
    fn must_get_schema(&self, table_name: &str) -> Result<TableSchema> {
        self.get_schema(table_name)?
            .ok_or_else(|| value_err!("Table {} does not exist", table_name))
    }

    /// Gets the schemas of the given tables, in the given order. Field
    /// tables resolve to the schema of their main table.
    fn get_schemas(&self, table_names: &[String]) -> Result<Schemas> {
        let mut schemas = Schemas::new();
        for table_name in table_names {
            let main_table = match split_field_table_name(table_name) {
                Some((main_table, _)) => main_table,
                None => table_name.as_str(),
            };
            if schemas.get(main_table).is_some() {
                continue;
            }
            schemas.insert(self.must_get_schema(main_table)?);
        }
        Ok(schemas)
    }
}
