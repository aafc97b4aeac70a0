use crate::error::Result;
use crate::internal_err;
use crate::sql::parser::lexer::Span;
use crate::sql::parser::lexer::Token;
use crate::sql::parser::lexer::TokenWithSpan;

pub mod lexer;

/// A lexed clause fragment, e.g. the where or the order by part of a
/// query. Rewrites are expressed as edits against the token spans, so
/// untouched text is kept byte for byte.
pub struct Clause<'a> {
    source: &'a str,
    tokens: Vec<TokenWithSpan>,
}

/// A reference to a column, either qualified (`table.field`) or bare
/// (`field`). Function names are not column references.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub table_span: Option<Span>,
    pub field: String,
    /// Span of the whole reference
    pub span: Span,
    /// Index of the token following the reference
    pub next: usize,
}

impl<'a> Clause<'a> {
    pub fn new(source: &'a str) -> Result<Clause<'a>> {
        let tokens = lexer::tokenize(source)?;
        Ok(Clause { source, tokens })
    }

    pub fn tokens(&self) -> &[TokenWithSpan] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&TokenWithSpan> {
        self.tokens.get(index)
    }

    /// The source text covered by the span
    pub fn slice(&self, span: Span) -> &'a str {
        &self.source[span.start..span.end]
    }

    /// The source text covered by a run of tokens
    pub fn text(&self, tokens: &[TokenWithSpan]) -> &'a str {
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => self.slice(first.span.union(&last.span)),
            _ => "",
        }
    }

    /// Splits the tokens at every token matching `is_delimiter` outside
    /// of parentheses. Empty parts are kept.
    pub fn split<F>(&self, is_delimiter: F) -> Vec<&[TokenWithSpan]>
    where
        F: Fn(&Token) -> bool,
    {
        let mut parts = vec![];
        let mut depth = 0usize;
        let mut start = 0;
        for (i, tok) in self.tokens.iter().enumerate() {
            match &tok.token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                t if depth == 0 && is_delimiter(t) => {
                    parts.push(&self.tokens[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        parts.push(&self.tokens[start..]);
        parts
    }

    /// Finds the index of the parenthesis closing the one at `open`.
    pub fn closing_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open) {
            match tok.token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Collects every column reference of the clause, in source order.
    pub fn column_refs(&self) -> Vec<ColumnRef> {
        let mut refs = vec![];
        let tokens = &self.tokens;
        for (i, tok) in tokens.iter().enumerate() {
            let Some(name) = tok.ident() else {
                continue;
            };
            if i > 0 && tokens[i - 1].token == Token::Dot {
                continue;
            }
            match tokens.get(i + 1).map(|it| &it.token) {
                Some(Token::LParen) => continue,
                Some(Token::Dot) => {
                    if let Some(field) = tokens.get(i + 2).and_then(|it| it.ident()) {
                        refs.push(ColumnRef {
                            table: Some(name.to_string()),
                            table_span: Some(tok.span),
                            field: field.to_string(),
                            span: tok.span.union(&tokens[i + 2].span),
                            next: i + 3,
                        });
                    }
                }
                _ => refs.push(ColumnRef {
                    table: None,
                    table_span: None,
                    field: name.to_string(),
                    span: tok.span,
                    next: i + 1,
                }),
            }
        }
        refs
    }
}

/// Collects span replacements against one source text and applies them
/// all at once.
#[derive(Debug, Default)]
pub struct Rewriter {
    edits: Vec<(Span, String)>,
}

impl Rewriter {
    pub fn new() -> Rewriter {
        Rewriter { edits: vec![] }
    }

    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push((span, text.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies the edits to `source`, the edits must not overlap.
    pub fn apply(mut self, source: &str) -> Result<String> {
        self.edits.sort_by_key(|(span, _)| *span);
        let mut out = String::with_capacity(source.len());
        let mut pos = 0;
        for (span, text) in &self.edits {
            if span.start < pos || span.end > source.len() {
                return Err(internal_err!(
                    "Overlapping rewrite at {}..{} of '{}'",
                    span.start,
                    span.end,
                    source
                ));
            }
            out.push_str(&source[pos..span.start]);
            out.push_str(text);
            pos = span.end;
        }
        out.push_str(&source[pos..]);
        Ok(out)
    }
}
