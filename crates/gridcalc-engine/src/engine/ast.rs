//! Formula abstract syntax tree.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cell_ref::{Anchor, CellRef};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Binding strength, low to high. Every operator is left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Eq | BinaryOp::Ne => 1,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div => 4,
            BinaryOp::Pow => 5,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Ref {
        cell: CellRef,
        anchor: Anchor,
    },
    /// Inclusive rectangle, endpoints kept in written order.
    Range {
        start: CellRef,
        start_anchor: Anchor,
        end: CellRef,
        end_anchor: Anchor,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn neg(operand: Expr) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: u8, right_side: bool) -> fmt::Result {
        match self {
            Expr::Binary { op, .. }
                if op.precedence() < parent || (right_side && op.precedence() == parent) =>
            {
                write!(f, "({})", self)
            }
            _ => write!(f, "{}", self),
        }
    }
}

/// Renders the expression back to formula text (without the leading `=`).
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => f.write_str(&super::value::canonical_number(*n)),
            Expr::Text(s) => write!(f, "\"{}\"", s),
            Expr::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Expr::Ref { cell, anchor } => f.write_str(&cell.to_anchored_string(*anchor)),
            Expr::Range {
                start,
                start_anchor,
                end,
                end_anchor,
            } => write!(
                f,
                "{}:{}",
                start.to_anchored_string(*start_anchor),
                end.to_anchored_string(*end_anchor)
            ),
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Binary { op, left, right } => {
                left.fmt_operand(f, op.precedence(), false)?;
                f.write_str(op.symbol())?;
                right.fmt_operand(f, op.precedence(), true)
            }
            Expr::Unary { operand, .. } => {
                f.write_str("-")?;
                match operand.as_ref() {
                    Expr::Binary { .. } => write!(f, "({})", operand),
                    other => write!(f, "{}", other),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parenthesizes_only_where_needed() {
        let a1 = Expr::Ref {
            cell: CellRef::new(0, 0),
            anchor: Anchor { col: true, row: false },
        };
        let sum = Expr::binary(BinaryOp::Add, Expr::Number(1.0), Expr::Number(2.0));
        let product = Expr::binary(BinaryOp::Mul, sum.clone(), a1);
        assert_eq!(product.to_string(), "(1+2)*$A1");

        let left_assoc = Expr::binary(BinaryOp::Sub, sum, Expr::Number(3.0));
        assert_eq!(left_assoc.to_string(), "1+2-3");

        let right_nested = Expr::binary(
            BinaryOp::Sub,
            Expr::Number(1.0),
            Expr::binary(BinaryOp::Sub, Expr::Number(2.0), Expr::Number(3.0)),
        );
        assert_eq!(right_nested.to_string(), "1-(2-3)");
    }

    #[test]
    fn test_display_functions_and_ranges() {
        let expr = Expr::Function {
            name: "SUM".to_string(),
            args: vec![
                Expr::Range {
                    start: CellRef::new(0, 0),
                    start_anchor: Anchor::default(),
                    end: CellRef::new(0, 2),
                    end_anchor: Anchor::default(),
                },
                Expr::neg(Expr::Text("x".to_string())),
            ],
        };
        assert_eq!(expr.to_string(), "SUM(A1:A3,-\"x\")");
    }

    #[test]
    fn test_display_keeps_range_anchors() {
        let range = Expr::Range {
            start: CellRef::new(0, 0),
            start_anchor: Anchor { col: true, row: true },
            end: CellRef::new(1, 1),
            end_anchor: Anchor { col: false, row: true },
        };
        assert_eq!(range.to_string(), "$A$1:B$2");
    }
}
