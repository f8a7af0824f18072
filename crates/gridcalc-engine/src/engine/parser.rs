//! Precedence-climbing formula parser.
//!
//! Grammar, loosely:
//!
//! ```text
//! expression := unary (OPERATOR unary)*        -- climbed by precedence
//! unary      := "-" unary | primary
//! primary    := NUMBER | STRING | BOOL | "(" expression ")"
//!             | CELL_REF [":" CELL_REF]
//!             | FUNCTION "(" [expression ("," expression)*] ")"
//! ```

use super::ast::{BinaryOp, Expr};
use super::cell_ref::CellRef;
use super::error::Result;
use super::lexer::{Lexer, Token, TokenKind};

/// Parse formula text into an AST. A single leading `=` is ignored.
pub fn parse_formula(source: &str) -> Result<Expr> {
    let body = source.strip_prefix('=').unwrap_or(source);
    let mut parser = Parser::new(body)?;
    let expr = parser.parse_expression(0)?;
    match parser.current.kind {
        TokenKind::Eof => Ok(expr),
        _ => Err(parser.current.unexpected()),
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    /// Move to the next token, returning the one just consumed.
    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.current.unexpected())
        }
    }

    fn parse_expression(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_primary()?;

        while let TokenKind::Operator(op) = self.current.kind {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            // precedence + 1 keeps equal-strength operators left-associative, `^` included.
            let right = self.parse_expression(precedence + 1)?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Operator(BinaryOp::Sub) => Ok(Expr::neg(self.parse_primary()?)),
            TokenKind::LParen => {
                let expr = self.parse_expression(0)?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::String(s) => Ok(Expr::Text(s)),
            TokenKind::Bool(b) => Ok(Expr::Bool(b)),
            TokenKind::CellRef(text) => {
                let (cell, anchor) = CellRef::decode(&text)?;
                if self.current.kind != TokenKind::Colon {
                    return Ok(Expr::Ref { cell, anchor });
                }
                self.advance()?;
                let end_token = self.advance()?;
                match end_token.kind {
                    TokenKind::CellRef(end_text) => {
                        let (end, end_anchor) = CellRef::decode(&end_text)?;
                        Ok(Expr::Range {
                            start: cell,
                            start_anchor: anchor,
                            end,
                            end_anchor,
                        })
                    }
                    _ => Err(end_token.unexpected()),
                }
            }
            TokenKind::Function(name) => {
                self.expect(TokenKind::LParen)?;
                let args = self.parse_arguments()?;
                Ok(Expr::Function { name, args })
            }
            _ => Err(token.unexpected()),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.current.kind == TokenKind::RParen {
            self.advance()?;
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression(0)?);
            match self.current.kind {
                TokenKind::Comma => {
                    self.advance()?;
                }
                TokenKind::RParen => {
                    self.advance()?;
                    return Ok(args);
                }
                _ => return Err(self.current.unexpected()),
            }
        }
    }
}
