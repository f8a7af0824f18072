//! Formula evaluation against a sheet snapshot.
//!
//! Every failure inside AST evaluation is an [`EngineError`] threaded back with
//! `?`. [`Evaluator::evaluate_cell`] is the boundary: it converts the error into
//! a [`CellError`] on the returned [`EvalResult`], so callers never see a
//! failure escape a single cell.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::cell::{Cell, Sheet};
use super::cell_ref::{CellRef, cells_in_range, range_corners};
use super::error::{CellError, EngineError, ErrorCode, Result};
use super::parser::parse_formula;
use super::value::Value;
use crate::builtins;

/// Configurable parts of the error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalPolicy {
    /// Code reported for calls to functions that don't exist (`NAME` or `REF`).
    pub unknown_function: ErrorCode,
}

impl Default for EvalPolicy {
    fn default() -> Self {
        EvalPolicy {
            unknown_function: ErrorCode::Name,
        }
    }
}

/// One sub-evaluation recorded when tracing is requested.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceStep {
    /// Formula text of the node (or the referenced address).
    pub expression: String,
    /// Display form of the value, or `error: <message>`.
    pub result: String,
}

/// Outcome of evaluating one cell: a value or an error code with message,
/// plus the explain trace when one was requested.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalResult {
    pub outcome: std::result::Result<Value, CellError>,
    pub explain: Option<Vec<TraceStep>>,
}

impl EvalResult {
    pub fn value(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CellError> {
        self.outcome.as_ref().err()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error().map(|e| e.code)
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    fn ok(value: Value) -> Self {
        EvalResult {
            outcome: Ok(value),
            explain: None,
        }
    }

    fn err(error: CellError) -> Self {
        EvalResult {
            outcome: Err(error),
            explain: None,
        }
    }
}

/// State scoped to one evaluation call.
struct EvalContext<'a> {
    sheet: &'a Sheet,
    /// Cells whose values are currently being computed on this call's stack.
    resolving: HashSet<CellRef>,
    trace: Option<Vec<TraceStep>>,
}

impl EvalContext<'_> {
    fn record(&mut self, expression: impl FnOnce() -> String, result: &Result<Value>) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceStep {
                expression: expression(),
                result: match result {
                    Ok(value) => value.to_string(),
                    Err(err) => format!("error: {}", err),
                },
            });
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    policy: EvalPolicy,
}

impl Evaluator {
    pub fn new(policy: EvalPolicy) -> Self {
        Evaluator { policy }
    }

    pub fn policy(&self) -> &EvalPolicy {
        &self.policy
    }

    /// Evaluate the cell at `cell_ref`. Empty cells evaluate to null; stored
    /// error cells surface their code and message; formulas that failed to
    /// parse report `PARSE` without being re-parsed.
    pub fn evaluate_cell(&self, sheet: &Sheet, cell_ref: &CellRef, trace: bool) -> EvalResult {
        if !sheet.contains(cell_ref) {
            return self.fail(cell_ref, EngineError::OutOfBounds(cell_ref.clone()));
        }

        let ast = match sheet.get(cell_ref) {
            None => return EvalResult::ok(Value::Null),
            Some(Cell::Literal { value }) => return EvalResult::ok(value.clone()),
            Some(Cell::Error { code, message }) => {
                return EvalResult::err(CellError::new(*code, message.clone()));
            }
            Some(Cell::Formula { source, ast: None }) => {
                return self.fail(cell_ref, EngineError::Parse(source.clone()));
            }
            Some(Cell::Formula { ast: Some(ast), .. }) => ast,
        };

        let mut ctx = EvalContext {
            sheet,
            resolving: HashSet::from([cell_ref.clone()]),
            trace: trace.then(Vec::new),
        };
        let outcome = self.eval(&mut ctx, ast);
        self.finish(cell_ref.to_string(), outcome, ctx.trace)
    }

    /// Evaluate free-standing formula text against `sheet`, as if typed into a
    /// cell that nothing references.
    pub fn evaluate_formula(&self, sheet: &Sheet, source: &str, trace: bool) -> EvalResult {
        let ast = match parse_formula(source) {
            Ok(ast) => ast,
            Err(err) => return EvalResult::err(err.into_cell_error(&self.policy)),
        };
        let mut ctx = EvalContext {
            sheet,
            resolving: HashSet::new(),
            trace: trace.then(Vec::new),
        };
        let outcome = self.eval(&mut ctx, &ast);
        self.finish(source.to_string(), outcome, ctx.trace)
    }

    fn fail(&self, cell_ref: &CellRef, err: EngineError) -> EvalResult {
        self.finish(cell_ref.to_string(), Err(err), None)
    }

    fn finish(&self, origin: String, outcome: Result<Value>, explain: Option<Vec<TraceStep>>) -> EvalResult {
        let outcome = outcome.map_err(|err| {
            let error = err.into_cell_error(&self.policy);
            tracing::debug!(%origin, code = %error.code, message = %error.message, "evaluation failed");
            error
        });
        EvalResult { outcome, explain }
    }

    fn eval(&self, ctx: &mut EvalContext<'_>, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Ref { cell, .. } => self.resolve(ctx, cell),
            Expr::Range { .. } => Err(EngineError::RangeOutsideFunction(expr.to_string())),
            Expr::Function { name, args } => {
                let result = self.call(ctx, name, args);
                ctx.record(|| expr.to_string(), &result);
                result
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(ctx, left)?;
                let right = self.eval(ctx, right)?;
                let result = apply_binary(*op, &left, &right);
                ctx.record(|| expr.to_string(), &result);
                result
            }
            Expr::Unary { op: UnaryOp::Neg, operand } => {
                let operand = self.eval(ctx, operand)?;
                let result = Ok(Value::Number(-operand.to_number()));
                ctx.record(|| expr.to_string(), &result);
                result
            }
        }
    }

    /// Read a referenced cell, guarding against revisiting a cell that is
    /// still being computed.
    fn resolve(&self, ctx: &mut EvalContext<'_>, cell_ref: &CellRef) -> Result<Value> {
        if !ctx.sheet.contains(cell_ref) {
            return Err(EngineError::OutOfBounds(cell_ref.clone()));
        }
        if !ctx.resolving.insert(cell_ref.clone()) {
            return Err(EngineError::CircularRef(cell_ref.clone()));
        }

        let sheet = ctx.sheet;
        let result = match sheet.get(cell_ref) {
            None => Ok(Value::Null),
            Some(Cell::Literal { value }) => Ok(value.clone()),
            Some(Cell::Error { code, message }) => Err(EngineError::Propagated {
                cell: cell_ref.clone(),
                code: *code,
                message: message.clone(),
            }),
            Some(Cell::Formula { source, ast: None }) => Err(EngineError::Parse(source.clone())),
            Some(Cell::Formula { ast: Some(ast), .. }) => self.eval(ctx, ast),
        };

        ctx.resolving.remove(cell_ref);
        ctx.record(|| cell_ref.to_string(), &result);
        result
    }

    fn call(&self, ctx: &mut EvalContext<'_>, name: &str, args: &[Expr]) -> Result<Value> {
        let builtin =
            builtins::lookup(name).ok_or_else(|| EngineError::UnknownFunction(name.to_string()))?;
        builtin.check_arity(name, args.len())?;

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Expr::Range { start, end, .. } if builtin.accepts_ranges() => {
                    let (_, max) = range_corners(start, end);
                    if !ctx.sheet.contains(&max) {
                        return Err(EngineError::OutOfBounds(max));
                    }
                    for cell in cells_in_range(start, end) {
                        values.push(self.resolve(ctx, &cell)?);
                    }
                }
                _ => values.push(self.eval(ctx, arg)?),
            }
        }
        builtin.apply(values)
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let (l, r) = (left.to_number(), right.to_number());
    let value = match op {
        BinaryOp::Add => Value::Number(l + r),
        BinaryOp::Sub => Value::Number(l - r),
        BinaryOp::Mul => Value::Number(l * r),
        BinaryOp::Div => {
            if r == 0.0 {
                return Err(EngineError::DivisionByZero);
            }
            Value::Number(l / r)
        }
        BinaryOp::Pow => Value::Number(l.powf(r)),
        BinaryOp::Eq => Value::Bool(left.strict_eq(right)),
        BinaryOp::Ne => Value::Bool(!left.strict_eq(right)),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::Le => Value::Bool(l <= r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::Ge => Value::Bool(l >= r),
    };
    Ok(value)
}
