use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::Result;
use crate::parse_err;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(String),
    /// A literal quoted with `'` or `"`, without the quotes.
    String(String, char),
    Keyword(Keyword),
    LParen,
    RParen,
    Comma,
    Dot,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    /// Any other punctuation, passed through untouched.
    Symbol(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => f.write_str(s),
            Token::Number(n) => f.write_str(n),
            Token::String(s, quote) => write!(f, "{quote}{s}{quote}"),
            Token::Keyword(k) => f.write_str(k.to_str()),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Dot => f.write_str("."),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Mul => f.write_str("*"),
            Token::Div => f.write_str("/"),
            Token::Mod => f.write_str("%"),
            Token::Eq => f.write_str("="),
            Token::Neq => f.write_str("!="),
            Token::Gt => f.write_str(">"),
            Token::GtEq => f.write_str(">="),
            Token::Lt => f.write_str("<"),
            Token::LtEq => f.write_str("<="),
            Token::Symbol(c) => write!(f, "{c}"),
        }
    }
}

/// The words the mini-language reserves on top of plain SQL.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Keyword {
    Holds,
    Near,
    Distinct,
}

impl Keyword {
    fn from_str(str: &str) -> Option<Keyword> {
        let ans = match str.to_uppercase().as_ref() {
            "HOLDS" => Self::Holds,
            "NEAR" => Self::Near,
            "DISTINCT" => Self::Distinct,
            _ => return None,
        };
        Some(ans)
    }

    fn to_str(&self) -> &str {
        match self {
            Keyword::Holds => "HOLDS",
            Keyword::Near => "NEAR",
            Keyword::Distinct => "DISTINCT",
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Byte range of a token within the lexed input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    /// The smallest span covering both spans.
    pub fn union(&self, other: &Span) -> Span {
        Span { start: self.start.min(other.start), end: self.end.max(other.end) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithSpan {
    pub token: Token,
    pub span: Span,
}

impl TokenWithSpan {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.token == Token::Keyword(keyword)
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.token {
            Token::Ident(s) => Some(s),
            _ => None,
        }
    }
}

/// Lexer produce token with the given input string, it is
/// also known as tokenizer. Every token remembers where it came from so
/// that a clause can be rewritten in place without reformatting it.
pub struct Lexer<'a> {
    input: &'a str,
    iter: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer { input, iter: input.char_indices().peekable() }
    }

    /// Current byte offset.
    fn offset(&mut self) -> usize {
        self.iter.peek().map(|(i, _)| *i).unwrap_or(self.input.len())
    }

    fn peek_char(&mut self) -> Option<char> {
        self.iter.peek().map(|(_, c)| *c)
    }

    /// Check if the next char match the given char, if yes, consume it
    /// otherwise do not move forward.
    fn consume_if_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.iter.next();
            return true;
        }
        false
    }

    /// Consumes the next char if it matches the predicate function.
    fn next_if<F>(&mut self, predicate: F) -> Option<char>
    where
        F: Fn(char) -> bool,
    {
        self.iter.next_if(|(_, c)| predicate(*c)).map(|(_, c)| c)
    }

    /// Consumes the next consecutive chars as a string until the predicate is not
    /// match anymore.
    fn next_while<F>(&mut self, predicate: F) -> Option<String>
    where
        F: Fn(char) -> bool,
    {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c)
        }
        Some(value).filter(|it| !it.is_empty())
    }

    /// Skip any consecutive whitespace chars
    fn skip_whitespace(&mut self) {
        self.next_while(|c| c.is_whitespace());
    }

    /// Scans the input for the next token if any, ignoring leading whitespace
    fn scan(&mut self) -> Result<Option<TokenWithSpan>> {
        self.skip_whitespace();
        let start = self.offset();
        let token = match self.peek_char() {
            Some(q @ ('\'' | '"')) => self.scan_string_literal(q)?,
            Some(c) if c.is_ascii_digit() => self.scan_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.scan_word(),
            Some(_) => self.scan_symbol(),
            None => return Ok(None),
        };
        let end = self.offset();
        Ok(token.map(|token| TokenWithSpan { token, span: Span::new(start, end) }))
    }

    /// Scans the input for the next symbol token, and
    /// handle any multi-symbol tokens
    fn scan_symbol(&mut self) -> Option<Token> {
        let c = self.iter.next()?.1;
        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Mul,
            '/' => Token::Div,
            '%' => Token::Mod,
            '=' => Token::Eq,
            '!' if self.consume_if_char('=') => Token::Neq,
            '>' if self.consume_if_char('=') => Token::GtEq,
            '>' => Token::Gt,
            '<' if self.consume_if_char('=') => Token::LtEq,
            '<' if self.consume_if_char('>') => Token::Neq,
            '<' => Token::Lt,
            c => Token::Symbol(c),
        };
        Some(token)
    }

    /// Scans consecutive chars as keyword or unquoted identifier
    fn scan_word(&mut self) -> Option<Token> {
        let name = self.next_while(|c| c.is_alphanumeric() || c == '_')?;
        if let Some(keyword) = Keyword::from_str(&name) {
            return Some(Token::Keyword(keyword));
        }
        Some(Token::Ident(name))
    }

    /// Scans consecutive regular numeric chars
    fn scan_number(&mut self) -> Option<Token> {
        let mut num = self.next_while(|c| c.is_ascii_digit())?;
        if let Some(sep) = self.next_if(|c| c == '.') {
            num.push(sep);
            while let Some(it) = self.next_if(|c| c.is_ascii_digit()) {
                num.push(it)
            }
        }
        if let Some(exp) = self.next_if(|c| c == 'e' || c == 'E') {
            num.push(exp);
            if let Some(it) = self.next_if(|c| c == '-' || c == '+') {
                num.push(it)
            }
            while let Some(it) = self.next_if(|c| c.is_ascii_digit()) {
                num.push(it)
            }
        }
        Some(Token::Number(num))
    }

    /// Scans a string literal, a doubled quote char stands for the quote itself
    fn scan_string_literal(&mut self, quote: char) -> Result<Option<Token>> {
        if self.next_if(|c| c == quote).is_none() {
            return Ok(None);
        }
        let mut s = String::new();
        loop {
            match self.iter.next().map(|(_, c)| c) {
                Some(c) if c == quote => {
                    if self.consume_if_char(quote) {
                        s.push(quote);
                        continue;
                    }
                    break;
                }
                Some('\\') => match self.iter.next() {
                    Some((_, c)) => {
                        s.push('\\');
                        s.push(c);
                    }
                    None => return Err(parse_err!("Unexpected end of string literal")),
                },
                Some(c) => s.push(c),
                None => return Err(parse_err!("Unexpected end of string literal")),
            }
        }
        Ok(Some(Token::String(s, quote)))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<TokenWithSpan>;

    fn next(&mut self) -> Option<Result<TokenWithSpan>> {
        self.scan().transpose()
    }
}

/// Lexes the whole input.
pub fn tokenize(input: &str) -> Result<Vec<TokenWithSpan>> {
    Lexer::new(input).collect()
}
