use indexmap::IndexMap;

use crate::catalog::field::{PAGE_NAME, SYSTEM_FIELD_PREFIX};
use crate::error::Result;
use crate::sql::parser::lexer::{tokenize, Keyword};
use crate::value_err;

/// Splits `input` at every `delimiter` that is neither nested within
/// parentheses nor within a quoted literal. Parts are trimmed and empty
/// parts dropped.
pub fn smart_split(delimiter: char, input: &str) -> Vec<String> {
    let mut parts = vec![];
    let mut start = 0;
    for pos in split_points(delimiter, input) {
        parts.push(&input[start..pos]);
        start = pos + delimiter.len_utf8();
    }
    parts.push(&input[start..]);
    parts.into_iter().map(str::trim).filter(|it| !it.is_empty()).map(String::from).collect()
}

/// Byte offsets of the top level occurrences of `delimiter`.
fn split_points(delimiter: char, input: &str) -> Vec<usize> {
    let mut points = vec![];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == delimiter && depth == 0 => points.push(i),
            _ => {}
        }
    }
    points
}

/// Splits `expr = alias` at the first top level `=` that is not part of
/// a comparison operator.
fn split_alias(field: &str) -> (&str, Option<&str>) {
    let bytes = field.as_bytes();
    let point = split_points('=', field).into_iter().find(|&i| {
        let prev = if i > 0 { bytes[i - 1] } else { b' ' };
        let next = bytes.get(i + 1).copied().unwrap_or(b' ');
        !matches!(prev, b'<' | b'>' | b'!' | b'=') && next != b'='
    });
    match point {
        Some(i) => {
            let alias = field[i + 1..].trim();
            (field[..i].trim(), Some(alias).filter(|it| !it.is_empty()))
        }
        None => (field.trim(), None),
    }
}

/// The alias of a field given without one: system fields keep their
/// name, plain fields lose their table qualifier and get their
/// underscores turned into spaces, expressions are kept verbatim.
pub fn default_alias(expr: &str) -> String {
    if expr.contains('(') {
        return expr.to_string();
    }
    let field = match expr.split_once('.') {
        Some((_, field)) => field,
        None => expr,
    };
    if field.starts_with(SYSTEM_FIELD_PREFIX) {
        return field.to_string();
    }
    field.replace('_', " ")
}

/// Parses a comma separated field list into alias/expression pairs, in
/// the given order. An empty list selects the page name only.
pub fn parse_fields(fields: &str) -> Result<IndexMap<String, String>> {
    let mut field_names = smart_split(',', fields);
    if field_names.is_empty() {
        field_names.push(PAGE_NAME.to_string());
    }

    let mut aliased_fields = IndexMap::new();
    for field in &field_names {
        let (expr, alias) = split_alias(field);
        if expr.is_empty() {
            return Err(value_err!("Missing field name in '{}'", field));
        }
        if tokenize(expr)?.iter().any(|t| t.is_keyword(Keyword::Distinct)) {
            return Err(value_err!(
                "DISTINCT is not allowed in '{}', use a GROUP BY clause instead",
                field
            ));
        }
        let alias = match alias {
            Some(alias) => alias.to_string(),
            None => default_alias(expr),
        };
        if aliased_fields.contains_key(&alias) {
            return Err(value_err!("Alias '{}' is used for more than one field", alias));
        }
        aliased_fields.insert(alias, expr.to_string());
    }
    Ok(aliased_fields)
}
