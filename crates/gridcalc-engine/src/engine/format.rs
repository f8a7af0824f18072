//! Display and export formatting of evaluation results.

use super::error::{CellError, ErrorCode};
use super::eval::EvalResult;
use super::value::Value;

/// `#CODE!` marker shown in place of a value for failed cells.
pub fn format_error_code(code: ErrorCode) -> String {
    format!("#{}!", code)
}

/// Canonical text for an evaluation result: the value's string form, or the
/// error marker. Used for export, where numbers must round-trip.
pub fn format_result(result: &EvalResult) -> String {
    match &result.outcome {
        Ok(value) => value.to_string(),
        Err(CellError { code, .. }) => format_error_code(*code),
    }
}

/// Format an evaluation result for display in a grid.
pub fn format_display(result: &EvalResult) -> String {
    match &result.outcome {
        Ok(Value::Number(n)) => format_number(*n),
        Ok(Value::Bool(b)) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Ok(value) => value.to_string(),
        Err(CellError { code, .. }) => format_error_code(*code),
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        format!("{:.0}", n)
    } else {
        format!("{:.2}", n)
    }
}
