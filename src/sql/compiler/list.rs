use indexmap::IndexMap;
use log::debug;

use crate::catalog::field;
use crate::catalog::r#type::FieldType;
use crate::error::Result;
use crate::parse_err;
use crate::sql::compiler::join::JoinCondition;
use crate::sql::compiler::Context;
use crate::sql::parser::lexer::{Keyword, Span};
use crate::sql::parser::{Clause, Rewriter};
use crate::value_err;

/// Rewrites `field HOLDS value` predicates of the where clause into a
/// comparison against the field table, which gets joined.
pub fn rewrite_where(ctx: &mut Context) -> Result<()> {
    if ctx.where_clause.trim().is_empty() {
        return Ok(());
    }
    let source = ctx.where_clause.clone();
    let clause = Clause::new(&source)?;
    let mut rewriter = Rewriter::new();
    for column in clause.column_refs() {
        let Some(vf) = ctx.virtual_field(&column) else {
            continue;
        };
        if !vf.description.is_list || vf.description.ty == FieldType::Coordinates {
            continue;
        }
        let name = clause.slice(column.span);
        if !clause.token(column.next).is_some_and(|t| t.is_keyword(Keyword::Holds)) {
            return Err(value_err!("Operator for the virtual field '{}' must be 'HOLDS'", name));
        }
        let Some(value) = clause.token(column.next + 1) else {
            return Err(parse_err!("Missing value after '{} HOLDS'", name));
        };

        let field_table = ctx.join_field_table(&vf);
        // `HOLDS LIKE 'pattern'` keeps its own operator.
        let is_like = value.ident().is_some_and(|it| it.eq_ignore_ascii_case("like"));
        let replacement = if is_like {
            format!("{}.{} ", field_table, field::VALUE)
        } else {
            format!("{}.{}=", field_table, field::VALUE)
        };
        debug!("rewrote {} HOLDS as {}", name, replacement);
        rewriter.replace(Span::new(column.span.start, value.span.start), replacement);
    }
    ctx.where_clause = rewriter.apply(&source)?;
    Ok(())
}

/// Replaces every `table.field HOLDS other.field` join condition by a
/// join through the field table of `table.field`.
pub fn rewrite_join_on(ctx: &mut Context) -> Result<()> {
    let mut rewritten = vec![];
    for cond in std::mem::take(&mut ctx.join_conditions) {
        let is_list = ctx.schemas.field(&cond.table1, &cond.field1).is_some_and(|it| it.is_list);
        match (cond.holds, is_list) {
            (true, true) => {
                let field_table = field::field_table_name(&cond.table1, &cond.field1);
                ctx.add_field_table(&field_table, &cond.table1);
                rewritten.push(JoinCondition::new(
                    &cond.table1,
                    field::ID,
                    &field_table,
                    field::ROW_ID,
                ));
                rewritten.push(JoinCondition::new(
                    &field_table,
                    field::VALUE,
                    &cond.table2,
                    &cond.field2,
                ));
            }
            (true, false) => {
                return Err(value_err!(
                    "Operator 'HOLDS' in join condition ({}) requires a list field",
                    cond
                ))
            }
            (false, true) => {
                return Err(value_err!("Join condition ({}) on a list field must use 'HOLDS'", cond))
            }
            (false, false) => ctx.join_conditions.push(cond),
        }
    }
    for cond in rewritten {
        ctx.add_join_condition(cond);
    }
    Ok(())
}

/// Rewrites the references to virtual fields of the field list, the
/// group by and the order by clauses into real columns.
pub fn rewrite_fields(ctx: &mut Context) -> Result<()> {
    let mut aliased_fields = IndexMap::with_capacity(ctx.aliased_fields.len());
    for (alias, expr) in &ctx.aliased_fields {
        aliased_fields.insert(alias.clone(), rewrite_references(ctx, expr)?);
    }
    ctx.aliased_fields = aliased_fields;
    ctx.group_by = rewrite_references(ctx, &ctx.group_by)?;
    ctx.order_by = rewrite_references(ctx, &ctx.order_by)?;
    Ok(())
}

/// A list field reads from its field table if that table is joined,
/// otherwise from the column holding all of its values. Coordinates read
/// from their combined column.
fn rewrite_references(ctx: &Context, source: &str) -> Result<String> {
    if source.trim().is_empty() {
        return Ok(source.to_string());
    }
    let clause = Clause::new(source)?;
    let mut rewriter = Rewriter::new();
    for column in clause.column_refs() {
        let Some(vf) = ctx.virtual_field(&column) else {
            continue;
        };
        let field_table = vf.field_table();
        let text = if vf.description.is_list && ctx.is_joined(&field_table) {
            format!("{}.{}", field_table, field::VALUE)
        } else {
            match &column.table {
                Some(table) => format!("{}.{}", table, field::full_column(&vf.field)),
                None => field::full_column(&vf.field),
            }
        };
        rewriter.replace(column.span, text);
    }
    rewriter.apply(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::field::FieldDescription;
    use crate::catalog::schema::TableSchema;
    use crate::error::Error;

    fn context(tables: &[&str], join_on: &str) -> Result<Context> {
        let events = TableSchema::new("Events")
            .field("Title", FieldDescription::new(FieldType::String))
            .field("Tags", FieldDescription::list(FieldType::String))
            .field("Venue", FieldDescription::new(FieldType::Page));
        let tags = TableSchema::new("Tags").field("Label", FieldDescription::new(FieldType::String));
        let mut ctx = Context::default();
        ctx.schemas = [events, tags].into_iter().collect();
        ctx.table_names = tables.iter().map(|it| it.to_string()).collect();
        ctx.join_conditions =
            crate::sql::compiler::join::parse_join_on(join_on, &ctx.table_names)?;
        Ok(ctx)
    }

    #[test]
    fn test_where_holds() -> Result<()> {
        let mut ctx = context(&["Events"], "")?;
        ctx.where_clause = "Tags HOLDS 'music' AND Events.Tags HOLDS LIKE 'jazz%'".to_string();
        rewrite_where(&mut ctx)?;
        assert_eq!(
            "Events__Tags._value='music' AND Events__Tags._value LIKE 'jazz%'",
            ctx.where_clause
        );
        assert_eq!(vec!["Events", "Events__Tags"], ctx.table_names);
        // Both predicates share one join.
        assert_eq!(vec![JoinCondition::new("Events", "_ID", "Events__Tags", "_rowID")], ctx.join_conditions);
        Ok(())
    }

    #[test]
    fn test_where_requires_holds() -> Result<()> {
        let mut ctx = context(&["Events"], "")?;
        ctx.where_clause = "Tags = 'music'".to_string();
        let err = rewrite_where(&mut ctx).unwrap_err();
        assert_eq!(Error::value("Operator for the virtual field 'Tags' must be 'HOLDS'"), err);

        ctx.where_clause = "Tags HOLDS".to_string();
        assert!(matches!(rewrite_where(&mut ctx), Err(Error::Parse(_))));
        Ok(())
    }

    #[test]
    fn test_join_on_holds() -> Result<()> {
        let mut ctx = context(&["Events", "Tags"], "Events.Tags HOLDS Tags._pageName")?;
        rewrite_join_on(&mut ctx)?;
        assert_eq!(vec!["Events", "Events__Tags", "Tags"], ctx.table_names);
        assert_eq!(
            vec![
                JoinCondition::new("Events", "_ID", "Events__Tags", "_rowID"),
                JoinCondition::new("Events__Tags", "_value", "Tags", "_pageName"),
            ],
            ctx.join_conditions
        );
        Ok(())
    }

    #[test]
    fn test_join_on_misused_operators() -> Result<()> {
        let mut ctx = context(&["Events", "Tags"], "Events.Venue HOLDS Tags._pageName")?;
        assert!(matches!(rewrite_join_on(&mut ctx), Err(Error::Value(_))));

        let mut ctx = context(&["Events", "Tags"], "Events.Tags=Tags._pageName")?;
        assert!(matches!(rewrite_join_on(&mut ctx), Err(Error::Value(_))));
        Ok(())
    }

    #[test]
    fn test_fields() -> Result<()> {
        let mut ctx = context(&["Events", "Tags"], "Events.Venue=Tags._pageName")?;
        ctx.aliased_fields =
            [("Title", "Title"), ("Tags", "Events.Tags"), ("n", "COUNT(Tags)")]
                .into_iter()
                .map(|(a, e)| (a.to_string(), e.to_string()))
                .collect();
        ctx.order_by = "Tags DESC".to_string();
        rewrite_fields(&mut ctx)?;
        assert_eq!(Some(&"Title".to_string()), ctx.aliased_fields.get("Title"));
        assert_eq!(Some(&"Events.Tags__full".to_string()), ctx.aliased_fields.get("Tags"));
        assert_eq!(Some(&"COUNT(Tags__full)".to_string()), ctx.aliased_fields.get("n"));
        assert_eq!("Tags__full DESC", ctx.order_by);

        ctx.join_conditions.push(JoinCondition::new("Events", "_ID", "Events__Tags", "_rowID"));
        ctx.aliased_fields.insert("again".to_string(), "Tags".to_string());
        rewrite_fields(&mut ctx)?;
        assert_eq!(Some(&"Events__Tags._value".to_string()), ctx.aliased_fields.get("again"));
        Ok(())
    }
}
