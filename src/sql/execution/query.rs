use std::fmt::Display;
use std::fmt::Formatter;

use crate::error::Result;
use crate::internal_err;
use crate::sql::compiler::describe::FieldInfo;
use crate::sql::compiler::join::{JoinCondition, JoinType};

/// An output column, `expr AS "alias"`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    pub alias: String,
    pub expr: String,
    pub info: FieldInfo,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub group_by: Option<String>,
    pub order_by: String,
    pub limit: u64,
}

/// A table joined to the tables before it, with the conditions linking
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: String,
    pub conditions: Vec<JoinCondition>,
}

/// A compiled query. Table names are kept without the storage prefix,
/// which is only applied when rendering. The clauses are already
/// prefixed.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    prefix: String,
    tables: Vec<String>,
    fields: Vec<SelectField>,
    where_clause: Option<String>,
    join_conditions: Vec<JoinCondition>,
    joins: Vec<Join>,
    options: SelectOptions,
}

impl SelectQuery {
    pub fn try_new(
        prefix: &str,
        tables: Vec<String>,
        fields: Vec<SelectField>,
        where_clause: Option<String>,
        join_conditions: Vec<JoinCondition>,
        options: SelectOptions,
    ) -> Result<SelectQuery> {
        let joins = plan_joins(&tables, &join_conditions)?;
        Ok(SelectQuery {
            prefix: prefix.to_string(),
            tables,
            fields,
            where_clause,
            join_conditions,
            joins,
            options,
        })
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Name of a table within the storage.
    pub fn storage_table(&self, table: &str) -> String {
        format!("{}{}", self.prefix, table)
    }

    pub fn fields(&self) -> &[SelectField] {
        &self.fields
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    pub fn join_conditions(&self) -> &[JoinCondition] {
        &self.join_conditions
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn options(&self) -> &SelectOptions {
        &self.options
    }
}

/// Orders the tables so that each one joins onto a table before it,
/// preferring the declared order.
fn plan_joins(tables: &[String], conditions: &[JoinCondition]) -> Result<Vec<Join>> {
    let Some(first) = tables.first() else {
        return Err(internal_err!("Query has no table"));
    };
    let mut joined = vec![first.as_str()];
    let mut joins = vec![];
    while joined.len() < tables.len() {
        let next = tables
            .iter()
            .filter(|it| !joined.contains(&it.as_str()))
            .find(|it| conditions.iter().any(|cond| connects(cond, it.as_str(), &joined)));
        let Some(table) = next else {
            return Err(internal_err!("Tables {:?} can't be joined to {:?}", tables, joined));
        };
        joined.push(table.as_str());
        let on = conditions.iter().filter(|cond| connects(cond, table, &joined)).cloned().collect();
        joins.push(Join { join_type: JoinType::LeftOuter, table: table.clone(), conditions: on });
    }
    Ok(joins)
}

/// Whether the condition links `table` to one of the `joined` tables.
fn connects(cond: &JoinCondition, table: &str, joined: &[&str]) -> bool {
    (cond.table1 == table && joined.contains(&cond.table2.as_str()))
        || (cond.table2 == table && joined.contains(&cond.table1.as_str()))
}

/// Quotes an alias as an SQL identifier.
pub fn quote_alias(alias: &str) -> String {
    format!("\"{}\"", alias.replace('"', "\"\""))
}

impl Display for SelectQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SELECT ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} AS {}", field.expr, quote_alias(&field.alias))?;
        }
        if let Some(first) = self.tables.first() {
            write!(f, " FROM {}{}", self.prefix, first)?;
        }
        for join in &self.joins {
            write!(f, " {} {}{} ON (", join.join_type, self.prefix, join.table)?;
            for (i, cond) in join.conditions.iter().enumerate() {
                if i > 0 {
                    write!(f, " AND ")?;
                }
                write!(f, "{}", cond.to_sql(&self.prefix))?;
            }
            write!(f, ")")?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {}", where_clause)?;
        }
        if let Some(group_by) = &self.options.group_by {
            write!(f, " GROUP BY {}", group_by)?;
        }
        if !self.options.order_by.is_empty() {
            write!(f, " ORDER BY {}", self.options.order_by)?;
        }
        write!(f, " LIMIT {}", self.options.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|it| it.to_string()).collect()
    }

    #[test]
    fn test_join_order_follows_conditions() -> Result<()> {
        // C is declared before B but only reachable through it.
        let conditions = vec![JoinCondition::new("B", "y", "C", "y"), JoinCondition::new("A", "x", "B", "x")];
        let joins = plan_joins(&tables(&["A", "C", "B"]), &conditions)?;
        let order = joins.iter().map(|it| it.table.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["B", "C"], order);
        assert_eq!(vec![conditions[1].clone()], joins[0].conditions);
        Ok(())
    }

    #[test]
    fn test_unjoinable_tables() {
        assert!(plan_joins(&tables(&["A", "B"]), &[]).is_err());
        assert!(plan_joins(&[], &[]).is_err());
    }

    #[test]
    fn test_display() -> Result<()> {
        let query = SelectQuery::try_new(
            "p_",
            tables(&["A", "B"]),
            vec![SelectField {
                alias: "Say \"hi\"".to_string(),
                expr: "p_A.x".to_string(),
                info: FieldInfo::default(),
            }],
            None,
            vec![JoinCondition::new("A", "x", "B", "x"), JoinCondition::new("B", "y", "A", "y")],
            SelectOptions { group_by: Some("p_A.x".to_string()), order_by: "p_A.x".to_string(), limit: 3 },
        )?;
        assert_eq!(
            r#"SELECT p_A.x AS "Say ""hi""" FROM p_A LEFT OUTER JOIN p_B ON (p_A.x=p_B.x AND p_B.y=p_A.y) GROUP BY p_A.x ORDER BY p_A.x LIMIT 3"#,
            query.to_string()
        );
        assert_eq!("p_B", query.storage_table("B"));
        Ok(())
    }
}
