use std::collections::HashMap;
use std::fmt::Debug;

use crate::catalog::r#type::Value;
use crate::error::Result;
use crate::sql::execution::query::SelectQuery;

pub mod memory;

/// A result row as returned by the storage, keyed by column alias.
pub type Record = HashMap<String, Value>;

/// The relational database holding the tables. Table names passed in and
/// out carry the storage prefix.
/// The Storage trait is `trait object` compatible, so that the executor
/// can run against any backend.
pub trait Storage: Debug + Send + Sync {
    /// Whether the table exists.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Runs the select query, returning one record per result row, in
    /// result order.
    fn select(&self, query: &SelectQuery) -> Result<Vec<Record>>;
}
