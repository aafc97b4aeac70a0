use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use log::debug;

use super::Record;
use super::Storage;
use crate::error::Result;
use crate::sql::execution::query::SelectQuery;

/// An in-memory storage answering every select with the same primed
/// rows. It remembers the SQL of every query it ran.
#[derive(Debug, Default)]
pub struct Memory {
    tables: HashSet<String>,
    rows: Vec<Record>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory { tables: HashSet::new(), rows: vec![], queries: Arc::new(Mutex::new(vec![])) }
    }

    /// Declares a table, named as within the storage, i.e. prefixed.
    pub fn with_table(mut self, table: impl Into<String>) -> Memory {
        self.tables.insert(table.into());
        self
    }

    pub fn with_rows(mut self, rows: Vec<Record>) -> Memory {
        self.rows = rows;
        self
    }

    /// The SQL of the queries run so far.
    pub fn queries(&self) -> Result<Vec<String>> {
        let queries = self.queries.lock()?;
        Ok(queries.clone())
    }
}

impl Storage for Memory {
    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.contains(table))
    }

    fn select(&self, query: &SelectQuery) -> Result<Vec<Record>> {
        let sql = query.to_string();
        debug!("select: {}", sql);
        let mut queries = self.queries.lock()?;
        queries.push(sql);
        Ok(self.rows.iter().take(usize::try_from(query.options().limit).unwrap_or(usize::MAX)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::r#type::Value;
    use crate::sql::execution::query::SelectOptions;

    #[test]
    fn test_select_records_queries() -> Result<()> {
        let rows = (0..3)
            .map(|i| Record::from([("n".to_string(), Value::Integer(i))]))
            .collect::<Vec<_>>();
        let storage = Memory::new().with_table("p_A").with_rows(rows);
        assert!(storage.table_exists("p_A")?);
        assert!(!storage.table_exists("A")?);

        let options = SelectOptions { order_by: "n".to_string(), limit: 2, ..Default::default() };
        let query = SelectQuery::try_new("p_", vec!["A".to_string()], vec![], None, vec![], options)?;
        let records = storage.select(&query)?;
        assert_eq!(2, records.len());
        assert_eq!(Some(&Value::Integer(1)), records[1].get("n"));
        assert_eq!(vec!["SELECT  FROM p_A ORDER BY n LIMIT 2".to_string()], storage.queries()?);
        Ok(())
    }

    #[test]
    fn test_select_with_huge_limit() -> Result<()> {
        let rows = vec![Record::from([("n".to_string(), Value::Integer(1))])];
        let storage = Memory::new().with_table("p_A").with_rows(rows);
        let options = SelectOptions { limit: u64::MAX, ..Default::default() };
        let query = SelectQuery::try_new("p_", vec!["A".to_string()], vec![], None, vec![], options)?;
        assert_eq!(1, storage.select(&query)?.len());
        Ok(())
    }
}
