use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::error::Result;
use crate::parse_err;
use crate::sql::parser::lexer::{Keyword, Token, TokenWithSpan};
use crate::sql::parser::Clause;
use crate::value_err;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JoinType {
    LeftOuter,
}

impl Display for JoinType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::LeftOuter => f.write_str("LEFT OUTER JOIN"),
        }
    }
}

/// `table1.field1 = table2.field2`, or `table1.field1 HOLDS table2.field2`
/// when `holds` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub join_type: JoinType,
    pub table1: String,
    pub field1: String,
    pub table2: String,
    pub field2: String,
    pub holds: bool,
}

impl JoinCondition {
    pub fn new(
        table1: impl Into<String>,
        field1: impl Into<String>,
        table2: impl Into<String>,
        field2: impl Into<String>,
    ) -> JoinCondition {
        JoinCondition {
            join_type: JoinType::LeftOuter,
            table1: table1.into(),
            field1: field1.into(),
            table2: table2.into(),
            field2: field2.into(),
            holds: false,
        }
    }

    /// Whether both conditions compare the same columns.
    pub fn same_columns(&self, other: &JoinCondition) -> bool {
        self.table1 == other.table1
            && self.field1 == other.field1
            && self.table2 == other.table2
            && self.field2 == other.field2
    }

    pub fn involves(&self, table: &str) -> bool {
        self.table1 == table || self.table2 == table
    }

    /// Renders the condition against the storage tables.
    pub fn to_sql(&self, prefix: &str) -> String {
        format!(
            "{prefix}{}.{}={prefix}{}.{}",
            self.table1, self.field1, self.table2, self.field2
        )
    }
}

impl Display for JoinCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let op = if self.holds { " HOLDS " } else { "=" };
        write!(f, "{}.{}{}{}.{}", self.table1, self.field1, op, self.table2, self.field2)
    }
}

/// Parses a join-on string like `A.x=B.y, B.z HOLDS C.w` into its join
/// conditions and proves that they connect every table.
pub fn parse_join_on(join_on: &str, table_names: &[String]) -> Result<Vec<JoinCondition>> {
    if join_on.trim().is_empty() {
        if table_names.len() > 1 {
            return Err(value_err!(
                "Join conditions must be set for tables {}",
                table_names.join(", ")
            ));
        }
        return Ok(vec![]);
    }

    let clause = Clause::new(join_on)?;
    let mut conditions = vec![];
    for part in clause.split(|t| *t == Token::Comma) {
        if part.is_empty() {
            continue;
        }
        conditions.push(parse_join_condition(&clause, part)?);
    }
    validate(&conditions, table_names)?;
    Ok(conditions)
}

fn parse_join_condition(clause: &Clause, tokens: &[TokenWithSpan]) -> Result<JoinCondition> {
    let op = tokens
        .iter()
        .position(|t| t.token == Token::Eq || t.is_keyword(Keyword::Holds))
        .ok_or_else(|| {
            parse_err!("Missing '=' or 'HOLDS' in join condition ({})", clause.text(tokens))
        })?;
    let (table1, field1) = parse_qualified_field(clause, &tokens[..op])?;
    let (table2, field2) = parse_qualified_field(clause, &tokens[op + 1..])?;
    let mut condition = JoinCondition::new(table1, field1, table2, field2);
    condition.holds = tokens[op].is_keyword(Keyword::Holds);
    Ok(condition)
}

fn parse_qualified_field(clause: &Clause, tokens: &[TokenWithSpan]) -> Result<(String, String)> {
    match tokens {
        [table, dot, field] if dot.token == Token::Dot => match (table.ident(), field.ident()) {
            (Some(table), Some(field)) => Ok((table.to_string(), field.to_string())),
            _ => Err(missing_qualifier(clause, tokens)),
        },
        _ => Err(missing_qualifier(clause, tokens)),
    }
}

fn missing_qualifier(clause: &Clause, tokens: &[TokenWithSpan]) -> crate::error::Error {
    parse_err!("Table and field name must both be specified in '{}'", clause.text(tokens))
}

/// Checks that every table of the conditions is declared, and that the
/// conditions join every declared table, i.e. the graph of tables and
/// conditions is connected.
pub fn validate(conditions: &[JoinCondition], table_names: &[String]) -> Result<()> {
    let declared = table_names.iter().map(String::as_str).collect::<HashSet<_>>();
    for cond in conditions {
        for table in [&cond.table1, &cond.table2] {
            if !declared.contains(table.as_str()) {
                return Err(value_err!("Table \"{}\" is not in list of table names", table));
            }
        }
    }

    let Some(first) = conditions.first() else {
        return match table_names {
            [_, second, ..] => {
                Err(value_err!("Table \"{}\" is not included within the join conditions", second))
            }
            _ => Ok(()),
        };
    };

    let mut matched = HashSet::from([first.table1.as_str()]);
    loop {
        let mut changed = false;
        for cond in conditions {
            let (t1, t2) = (cond.table1.as_str(), cond.table2.as_str());
            if matched.contains(t1) != matched.contains(t2) {
                matched.insert(t1);
                matched.insert(t2);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    match table_names.iter().find(|it| !matched.contains(it.as_str())) {
        Some(table) => {
            Err(value_err!("Table \"{}\" is not included within the join conditions", table))
        }
        None => Ok(()),
    }
}
