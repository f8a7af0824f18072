//! Formula tokenizer.
//!
//! Produces tokens on demand; the parser keeps a single token of lookahead.
//! Positions are character offsets into the formula text (after the leading
//! `=` has been stripped).

use regex::Regex;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::OnceLock;

use super::ast::BinaryOp;
use super::error::{EngineError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    Bool(bool),
    /// Uppercased reference text, `$` markers included (e.g. `$A$1`).
    CellRef(String),
    /// Uppercased identifier that is not a cell reference.
    Function(String),
    Operator(BinaryOp),
    LParen,
    RParen,
    Comma,
    Colon,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            TokenKind::CellRef(s) | TokenKind::Function(s) => f.write_str(s),
            TokenKind::Operator(op) => f.write_str(op.symbol()),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

impl Token {
    /// The error raised when the parser finds this token where it doesn't belong.
    pub fn unexpected(&self) -> EngineError {
        EngineError::UnexpectedToken {
            token: self.kind.to_string(),
            pos: self.pos,
        }
    }
}

fn cell_ref_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$?[A-Za-z]+\$?[0-9]+$").expect("cell reference token regex must compile")
    })
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
            pos: 0,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.input.next()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.input.peek().is_some_and(|ch| ch.is_whitespace()) {
            self.bump();
        }
    }

    /// Advance past the next token and return it.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let token = |kind| Ok(Token { kind, pos: start });

        let Some(ch) = self.bump() else {
            return token(TokenKind::Eof);
        };

        match ch {
            '+' => token(TokenKind::Operator(BinaryOp::Add)),
            '-' => token(TokenKind::Operator(BinaryOp::Sub)),
            '*' => token(TokenKind::Operator(BinaryOp::Mul)),
            '/' => token(TokenKind::Operator(BinaryOp::Div)),
            '^' => token(TokenKind::Operator(BinaryOp::Pow)),
            '=' => token(TokenKind::Operator(BinaryOp::Eq)),
            '<' => match self.input.peek() {
                Some('>') => {
                    self.bump();
                    token(TokenKind::Operator(BinaryOp::Ne))
                }
                Some('=') => {
                    self.bump();
                    token(TokenKind::Operator(BinaryOp::Le))
                }
                _ => token(TokenKind::Operator(BinaryOp::Lt)),
            },
            '>' => match self.input.peek() {
                Some('=') => {
                    self.bump();
                    token(TokenKind::Operator(BinaryOp::Ge))
                }
                _ => token(TokenKind::Operator(BinaryOp::Gt)),
            },
            '(' => token(TokenKind::LParen),
            ')' => token(TokenKind::RParen),
            ',' => token(TokenKind::Comma),
            ':' => token(TokenKind::Colon),
            '"' => self.read_string(start),
            c if c.is_ascii_digit() || c == '.' => self.read_number(c, start),
            c if c.is_ascii_alphabetic() || c == '$' => token(self.read_identifier(c)),
            c => Err(EngineError::UnexpectedCharacter { ch: c, pos: start }),
        }
    }

    fn read_number(&mut self, first: char, start: usize) -> Result<Token> {
        let mut text = String::from(first);
        let mut has_dot = first == '.';
        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else if ch == '.' && !has_dot {
                has_dot = true;
                text.push(ch);
            } else {
                break;
            }
            self.bump();
        }

        // A lone "." has no digits to parse.
        let value = text
            .parse::<f64>()
            .map_err(|_| EngineError::UnexpectedCharacter { ch: '.', pos: start })?;
        Ok(Token {
            kind: TokenKind::Number(value),
            pos: start,
        })
    }

    fn read_string(&mut self, start: usize) -> Result<Token> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    return Ok(Token {
                        kind: TokenKind::String(text),
                        pos: start,
                    });
                }
                Some(ch) => text.push(ch),
                None => return Err(EngineError::UnterminatedString { pos: start }),
            }
        }
    }

    fn read_identifier(&mut self, first: char) -> TokenKind {
        let mut ident = String::from(first);
        while let Some(&ch) = self.input.peek() {
            if !(ch.is_ascii_alphanumeric() || ch == '$') {
                break;
            }
            ident.push(ch);
            self.bump();
        }

        let ident = ident.to_ascii_uppercase();
        if cell_ref_token_re().is_match(&ident) {
            return TokenKind::CellRef(ident);
        }
        match ident.as_str() {
            "TRUE" => TokenKind::Bool(true),
            "FALSE" => TokenKind::Bool(false),
            _ => TokenKind::Function(ident),
        }
    }
}

/// Tokenize a whole formula, including the trailing EOF token.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
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
