use indexmap::IndexMap;

use crate::error::Result;
use crate::sql::compiler::Context;
use crate::sql::parser::lexer::Token;
use crate::sql::parser::{Clause, Rewriter};

/// Prepends `prefix` to every `table.` qualifier naming one of `tables`.
/// Names within literals, names that merely contain a table name, and
/// the field part of a qualified name are left alone.
pub fn add_table_prefixes(source: &str, tables: &[String], prefix: &str) -> Result<String> {
    if prefix.is_empty() || source.trim().is_empty() {
        return Ok(source.to_string());
    }
    let clause = Clause::new(source)?;
    let tokens = clause.tokens();
    let mut rewriter = Rewriter::new();
    for (i, tok) in tokens.iter().enumerate() {
        let Some(name) = tok.ident() else {
            continue;
        };
        if i > 0 && tokens[i - 1].token == Token::Dot {
            continue;
        }
        let qualifies = tokens
            .get(i + 1)
            .is_some_and(|next| next.token == Token::Dot && next.span.start == tok.span.end);
        if qualifies && tables.iter().any(|it| it == name) {
            rewriter.replace(tok.span, format!("{}{}", prefix, name));
        }
    }
    rewriter.apply(source)
}

/// Prefixes the field list, where, group by and order by clauses. Tables
/// and join conditions get their prefix when the query is rendered.
pub fn prefix_context(ctx: &mut Context, prefix: &str) -> Result<()> {
    let tables = &ctx.table_names;
    let mut aliased_fields = IndexMap::with_capacity(ctx.aliased_fields.len());
    for (alias, expr) in &ctx.aliased_fields {
        aliased_fields.insert(alias.clone(), add_table_prefixes(expr, tables, prefix)?);
    }
    let where_clause = add_table_prefixes(&ctx.where_clause, tables, prefix)?;
    let group_by = add_table_prefixes(&ctx.group_by, tables, prefix)?;
    let order_by = add_table_prefixes(&ctx.order_by, tables, prefix)?;

    ctx.aliased_fields = aliased_fields;
    ctx.where_clause = where_clause;
    ctx.group_by = group_by;
    ctx.order_by = order_by;
    Ok(())
}
