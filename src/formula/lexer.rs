//! Tokenizer for formula source.
//!
//! Produces a flat token list ending in [`TokenKind::Eof`]. Identifiers are
//! upper-cased here so every later stage sees canonical names; string
//! literals are kept verbatim.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Number(Decimal),
    Text(String),
    /// Canonical (upper-cased) identifier, possibly dotted.
    Ident(String),
    True,
    False,
    If,
    And,
    Or,
    Not,
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {}", n),
            Self::Text(s) => write!(f, "string \"{}\"", s),
            Self::Ident(name) => write!(f, "identifier '{}'", name),
            Self::True => f.write_str("'TRUE'"),
            Self::False => f.write_str("'FALSE'"),
            Self::If => f.write_str("'IF'"),
            Self::And => f.write_str("'AND'"),
            Self::Or => f.write_str("'OR'"),
            Self::Not => f.write_str("'NOT'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::Comma => f.write_str("','"),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Star => f.write_str("'*'"),
            Self::Slash => f.write_str("'/'"),
            Self::EqEq => f.write_str("'=='"),
            Self::NotEq => f.write_str("'!='"),
            Self::Lt => f.write_str("'<'"),
            Self::Le => f.write_str("'<='"),
            Self::Gt => f.write_str("'>'"),
            Self::Ge => f.write_str("'>='"),
            Self::Eof => f.write_str("end of formula"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of the token.
    pub position: usize,
}

struct Lexer<'input> {
    input: &'input str,
    pos: usize,
}

/// Splits `source` into tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        input: source,
        pos: 0,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'input> Lexer<'input> {
    fn rest(&self) -> &'input str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn skip_whitespace(&mut self) {
        let skipped: usize = self
            .rest()
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        self.pos += skipped;
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: start,
            });
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ',' => self.single(TokenKind::Comma),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '=' => {
                if self.peek_second() == Some('=') {
                    self.pos += 2;
                    TokenKind::EqEq
                } else {
                    return Err(ParseError::new(
                        start,
                        "unexpected '='; use '==' for equality",
                    ));
                }
            }
            '!' => {
                if self.peek_second() == Some('=') {
                    self.pos += 2;
                    TokenKind::NotEq
                } else {
                    self.single(TokenKind::Not)
                }
            }
            '<' => {
                if self.peek_second() == Some('=') {
                    self.pos += 2;
                    TokenKind::Le
                } else {
                    self.single(TokenKind::Lt)
                }
            }
            '>' => {
                if self.peek_second() == Some('=') {
                    self.pos += 2;
                    TokenKind::Ge
                } else {
                    self.single(TokenKind::Gt)
                }
            }
            '&' | '|' => {
                if self.peek_second() == Some(c) {
                    self.pos += 2;
                    if c == '&' {
                        TokenKind::And
                    } else {
                        TokenKind::Or
                    }
                } else {
                    return Err(ParseError::new(
                        start,
                        format!("unexpected '{}'; use '{}{}'", c, c, c),
                    ));
                }
            }
            '"' => self.take_text()?,
            '0'..='9' => self.take_number()?,
            c if is_ident_start(c) => self.take_ident()?,
            other => {
                return Err(ParseError::new(
                    start,
                    format!("unexpected character '{}'", other),
                ));
            }
        };

        Ok(Token {
            kind,
            position: start,
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn take_text(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let body = &self.input[start + 1..];
        match body.find('"') {
            Some(end) => {
                self.pos = start + 1 + end + 1;
                Ok(TokenKind::Text(body[..end].to_string()))
            }
            None => Err(ParseError::new(start, "unterminated string literal")),
        }
    }

    fn take_number(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' {
            end += 1;
            let fraction_start = end;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end == fraction_start {
                return Err(ParseError::new(
                    end,
                    "expected digit after decimal point",
                ));
            }
        }
        let literal = &self.input[start..end];
        self.pos = end;
        Decimal::from_str(literal)
            .map(TokenKind::Number)
            .map_err(|_| ParseError::new(start, format!("numeric literal out of range: {}", literal)))
    }

    fn take_ident(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut end = start;
        loop {
            while end < bytes.len() && is_ident_continue(bytes[end] as char) {
                end += 1;
            }
            if end < bytes.len() && bytes[end] == b'.' {
                let next = bytes.get(end + 1).map(|b| *b as char);
                if next.is_some_and(is_ident_start) {
                    end += 1;
                    continue;
                }
                return Err(ParseError::new(
                    end + 1,
                    "expected identifier segment after '.'",
                ));
            }
            break;
        }
        self.pos = end;

        let name = self.input[start..end].to_ascii_uppercase();
        Ok(match name.as_str() {
            "TRUE" => TokenKind::True,
            "FALSE" => TokenKind::False,
            "IF" => TokenKind::If,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            _ => TokenKind::Ident(name),
        })
    }
}
