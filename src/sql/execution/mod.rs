use std::fmt::Display;
use std::fmt::Formatter;

use log::debug;

use crate::config::Config;
use crate::error::Result;
use crate::sql::compiler::describe::FieldInfo;
use crate::sql::execution::query::SelectQuery;
use crate::storage::Storage;
use crate::storage_err;

pub mod query;

/// Runs compiled queries against a storage.
pub struct Executor<'a> {
    storage: &'a dyn Storage,
    config: &'a Config,
}

impl<'a> Executor<'a> {
    pub fn new(storage: &'a dyn Storage, config: &'a Config) -> Executor<'a> {
        Executor { storage, config }
    }

    /// Checks that every table of the query exists, runs it, and returns
    /// the rows with their values formatted and HTML escaped.
    pub fn execute(&self, query: &SelectQuery) -> Result<ResultSet> {
        for table in query.tables() {
            if !self.storage.table_exists(&query.storage_table(table))? {
                return Err(storage_err!("No database table exists for \"{}\"", table));
            }
        }

        let records = self.storage.select(query)?;
        debug!("query returned {} rows", records.len());
        let columns = query.fields().iter().map(|it| it.alias.clone()).collect::<Vec<_>>();
        let descriptions = query.fields().iter().map(|it| it.info.clone()).collect();
        let rows = records
            .iter()
            .map(|record| {
                let values = columns
                    .iter()
                    .map(|alias| {
                        let value = record
                            .get(alias)
                            .map(|it| it.format(&self.config.decimal_mark))
                            .unwrap_or_default();
                        escape_html(&value)
                    })
                    .collect();
                Row { values }
            })
            .collect();
        Ok(ResultSet { columns, descriptions, rows })
    }
}

/// Escapes the characters with a meaning in HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// A result row, with one value per column of the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    /// Type description of each column
    descriptions: Vec<FieldInfo>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column aliases, in field order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// What is known about the type of the column `alias`.
    pub fn description(&self, alias: &str) -> Option<&FieldInfo> {
        let col = self.columns.iter().position(|it| it == alias)?;
        self.descriptions.get(col)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The value of the column `alias` in the row at `index`.
    pub fn get(&self, index: usize, alias: &str) -> Option<&str> {
        let col = self.columns.iter().position(|it| it == alias)?;
        self.rows.get(index)?.values.get(col).map(String::as_str)
    }

    /// The rows as alias/value pairs, in field order.
    pub fn to_maps(&self) -> Vec<Vec<(&str, &str)>> {
        self.rows
            .iter()
            .map(|row| {
                let values = row.values.iter().map(String::as_str);
                self.columns.iter().map(String::as_str).zip(values).collect()
            })
            .collect()
    }
}

impl Display for ResultSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            writeln!(f, "{}", row.values.join(" | "))?;
        }
        write!(f, "({} rows)", self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::r#type::Value;
    use crate::error::Error;
    use crate::catalog::r#type::FieldType;
    use crate::sql::execution::query::{SelectField, SelectOptions};
    use crate::storage::memory::Memory;
    use crate::storage::Record;

    fn query(tables: &[&str]) -> Result<SelectQuery> {
        let fields = ["Name", "Score"]
            .iter()
            .map(|alias| SelectField {
                alias: alias.to_string(),
                expr: alias.to_string(),
                info: FieldInfo {
                    ty: (*alias == "Score").then_some(FieldType::Float),
                    ..FieldInfo::default()
                },
            })
            .collect();
        let tables = tables.iter().map(|it| it.to_string()).collect();
        let options = SelectOptions { order_by: "Name".to_string(), limit: 10, ..Default::default() };
        SelectQuery::try_new("p_", tables, fields, None, vec![], options)
    }

    #[test]
    fn test_execute() -> Result<()> {
        let rows = vec![
            Record::from([
                ("Name".to_string(), Value::from("<b>Tom & Jerry's</b>")),
                ("Score".to_string(), Value::Float(2.5)),
            ]),
            Record::from([("Name".to_string(), Value::from(true))]),
        ];
        let storage = Memory::new().with_table("p_A").with_rows(rows);
        let config = Config { decimal_mark: ",".to_string(), ..Config::default() };
        let rs = Executor::new(&storage, &config).execute(&query(&["A"])?)?;

        assert_eq!(vec!["Name", "Score"], rs.columns());
        assert_eq!(Some("&lt;b&gt;Tom &amp; Jerry&#039;s&lt;/b&gt;"), rs.get(0, "Name"));
        assert_eq!(Some("2,5"), rs.get(0, "Score"));
        assert_eq!(vec![("Name", "1"), ("Score", "")], rs.to_maps()[1]);
        assert_eq!(None, rs.get(2, "Name"));
        assert_eq!(Some(FieldType::Float), rs.description("Score").and_then(|it| it.ty));
        assert_eq!(Some(&FieldInfo::default()), rs.description("Name"));
        assert_eq!(None, rs.description("Missing"));
        Ok(())
    }

    #[test]
    fn test_missing_table() -> Result<()> {
        let storage = Memory::new().with_table("p_A");
        let config = Config::default();
        let err = Executor::new(&storage, &config).execute(&query(&["A"])?).map(|_| ());
        assert_eq!(Ok(()), err);

        let options = SelectOptions::default();
        let q = SelectQuery::try_new("p_", vec!["B".to_string()], vec![], None, vec![], options)?;
        let err = Executor::new(&storage, &config).execute(&q).unwrap_err();
        assert_eq!(Error::storage("No database table exists for \"B\""), err);
        assert!(storage.queries()?.len() == 1);
        Ok(())
    }

    #[test]
    fn test_display() -> Result<()> {
        let rows = vec![Record::from([("Name".to_string(), Value::from("x"))])];
        let storage = Memory::new().with_table("p_A").with_rows(rows);
        let config = Config::default();
        let rs = Executor::new(&storage, &config).execute(&query(&["A"])?)?;
        assert_eq!("Name | Score\nx | \n(1 rows)", rs.to_string());
        assert!(!rs.is_empty());
        Ok(())
    }
}
