//! Error taxonomy for the formula engine.
//!
//! [`EngineError`] is the internal failure type threaded through the codec,
//! lexer, parser and evaluator. Callers never see it raw: the evaluator
//! boundary converts it into an [`ErrorCode`] plus message on the
//! [`EvalResult`](super::EvalResult).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::cell_ref::CellRef;
use super::eval::EvalPolicy;

/// Caller-facing error code. Rendered as `#CODE!` by display layers.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCode {
    Parse,
    Circular,
    Div0,
    Ref,
    Name,
    Eval,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Parse => "PARSE",
            ErrorCode::Circular => "CIRCULAR",
            ErrorCode::Div0 => "DIV0",
            ErrorCode::Ref => "REF",
            ErrorCode::Name => "NAME",
            ErrorCode::Eval => "EVAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PARSE" => Ok(ErrorCode::Parse),
            "CIRCULAR" => Ok(ErrorCode::Circular),
            "DIV0" => Ok(ErrorCode::Div0),
            "REF" => Ok(ErrorCode::Ref),
            "NAME" => Ok(ErrorCode::Name),
            "EVAL" => Ok(ErrorCode::Eval),
            other => Err(format!("Unknown error code: {}", other)),
        }
    }
}

/// An error code with its human-readable message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellError {
    pub code: ErrorCode,
    pub message: String,
}

impl CellError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CellError {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Failures raised while decoding addresses, parsing or evaluating formulas.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    #[error("Unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedCharacter { ch: char, pos: usize },

    #[error("Unexpected token {token} at position {pos}")]
    UnexpectedToken { token: String, pos: usize },

    #[error("Circular reference detected: {0}")]
    CircularRef(CellRef),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{name}() expects {expected} arguments, got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Range {0} cannot be evaluated outside a function argument")]
    RangeOutsideFunction(String),

    #[error("Reference {0} is outside the sheet")]
    OutOfBounds(CellRef),

    #[error("Formula could not be parsed: {0}")]
    Parse(String),

    #[error("Error in {cell}: {message}")]
    Propagated {
        cell: CellRef,
        code: ErrorCode,
        message: String,
    },
}

impl EngineError {
    /// Map this failure onto the code reported to callers.
    pub fn code(&self, policy: &EvalPolicy) -> ErrorCode {
        match self {
            EngineError::InvalidAddress(_)
            | EngineError::UnterminatedString { .. }
            | EngineError::UnexpectedCharacter { .. }
            | EngineError::UnexpectedToken { .. }
            | EngineError::Parse(_) => ErrorCode::Parse,
            EngineError::CircularRef(_) => ErrorCode::Circular,
            EngineError::DivisionByZero => ErrorCode::Div0,
            EngineError::UnknownFunction(_) => policy.unknown_function,
            EngineError::OutOfBounds(_) => ErrorCode::Ref,
            EngineError::Propagated { code, .. } => *code,
            EngineError::Arity { .. } | EngineError::RangeOutsideFunction(_) => ErrorCode::Eval,
        }
    }

    pub fn into_cell_error(self, policy: &EvalPolicy) -> CellError {
        let code = self.code(policy);
        let message = match self {
            // Keep the stored message so chains of references don't nest prefixes.
            EngineError::Propagated { message, .. } => message,
            other => other.to_string(),
        };
        CellError { code, message }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
