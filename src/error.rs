//! Error types for the gridcalc command line

use thiserror::Error;

/// Problems with the command line itself. Everything past argument parsing
/// is reported through `anyhow`.
#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid edit '{0}': expected ADDRESS=INPUT")]
    InvalidEdit(String),

    #[error("Invalid sort '{0}': expected COLUMN or COLUMN:desc")]
    InvalidSort(String),

    #[error("--demo cannot be combined with a file")]
    DemoWithFile,
}

pub type Result<T> = std::result::Result<T, CliError>;
