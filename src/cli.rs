//! Command line parsing.

use crate::error::{CliError, Result};
use gridcalc_core::SortRequest;
use gridcalc_engine::builtins::BUILTINS;
use gridcalc_engine::engine::CellRef;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub file: Option<PathBuf>,
    pub demo: bool,
    /// (address, raw input) in command line order.
    pub edits: Vec<(String, String)>,
    pub sort: Option<SortRequest>,
    pub commands: Vec<String>,
    pub get: Vec<String>,
    pub explain: Vec<String>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub verbosity: u8,
    pub help: bool,
}

impl Args {
    /// Nothing asked for on stdout, so the sheet is printed as CSV.
    pub fn prints_sheet(&self) -> bool {
        self.commands.is_empty() && self.get.is_empty() && self.explain.is_empty() && self.output.is_none()
    }
}

pub fn print_usage() {
    eprintln!("Usage: gridcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    CSV file to load");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --demo                    Load the built-in Budget Calculator sheet");
    eprintln!("  -s, --set <ADDR=INPUT>    Edit a cell, e.g. B3=500 or C1==A1*2 (can be repeated)");
    eprintln!("  --sort <COL[:desc]>       Sort the data rows by a column, e.g. B or B:desc");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula against the sheet and print it");
    eprintln!("  -g, --get <ADDR>          Print a cell's value (can be repeated)");
    eprintln!("  -e, --explain <ADDR>      Print a cell's evaluation trace (can be repeated)");
    eprintln!("  -o, --output <FILE>       Export the sheet to CSV");
    eprintln!("  --config <FILE>           Config file (default: config.toml in the user config dir)");
    eprintln!("  -v, --verbose             More logging on stderr (-vv for trace)");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Functions:");
    for info in BUILTINS {
        eprintln!("  {:<10}{}", info.sheet_name, info.description);
    }
}

pub fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = || -> Result<String> {
            i += 1;
            args.get(i).cloned().ok_or_else(|| CliError::MissingValue(arg.to_string()))
        };
        match arg {
            "-h" | "--help" => parsed.help = true,
            "--demo" => parsed.demo = true,
            "-v" | "--verbose" => parsed.verbosity += 1,
            "-vv" => parsed.verbosity += 2,
            "-s" | "--set" => {
                let edit = value()?;
                parsed.edits.push(parse_edit(&edit)?);
            }
            "--sort" => {
                let sort = value()?;
                parsed.sort = Some(parse_sort(&sort)?);
            }
            "-c" | "--command" => parsed.commands.push(value()?),
            "-g" | "--get" => parsed.get.push(value()?),
            "-e" | "--explain" => parsed.explain.push(value()?),
            "-o" | "--output" => parsed.output = Some(PathBuf::from(value()?)),
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(CliError::UnknownOption(other.to_string()));
            }
            other => {
                if parsed.file.is_some() {
                    return Err(CliError::UnexpectedArgument(other.to_string()));
                }
                parsed.file = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    if parsed.demo && parsed.file.is_some() {
        return Err(CliError::DemoWithFile);
    }
    Ok(parsed)
}

/// `B3=500` -> ("B3", "500"). Only the first `=` splits, so `C1==A1*2` sets a formula.
fn parse_edit(text: &str) -> Result<(String, String)> {
    match text.split_once('=') {
        Some((address, input)) if !address.trim().is_empty() => {
            Ok((address.trim().to_string(), input.to_string()))
        }
        _ => Err(CliError::InvalidEdit(text.to_string())),
    }
}

/// `B` or `B:desc` (also `B:asc`).
fn parse_sort(text: &str) -> Result<SortRequest> {
    let invalid = || CliError::InvalidSort(text.to_string());
    let (letters, direction) = text.split_once(':').unwrap_or((text, "asc"));
    let column = CellRef::letters_to_col(letters.trim()).ok_or_else(invalid)?;
    let ascending = match direction.trim().to_ascii_lowercase().as_str() {
        "asc" => true,
        "desc" => false,
        _ => return Err(invalid()),
    };
    Ok(SortRequest {
        column,
        ascending,
        range: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_command_line() {
        let parsed = parse_args(&args(&[
            "budget.csv",
            "-s",
            "B3=500",
            "--set",
            "C1==A1*2",
            "--sort",
            "b:desc",
            "-g",
            "C5",
            "-o",
            "out.csv",
            "-vv",
        ]))
        .unwrap();

        assert_eq!(parsed.file, Some(PathBuf::from("budget.csv")));
        assert_eq!(
            parsed.edits,
            vec![
                ("B3".to_string(), "500".to_string()),
                ("C1".to_string(), "=A1*2".to_string())
            ]
        );
        assert_eq!(
            parsed.sort,
            Some(SortRequest {
                column: 1,
                ascending: false,
                range: None
            })
        );
        assert_eq!(parsed.get, vec!["C5".to_string()]);
        assert_eq!(parsed.output, Some(PathBuf::from("out.csv")));
        assert_eq!(parsed.verbosity, 2);
        assert!(!parsed.prints_sheet());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_args(&args(&["--set"])),
            Err(CliError::MissingValue("--set".to_string()))
        );
        assert_eq!(
            parse_args(&args(&["--bogus"])),
            Err(CliError::UnknownOption("--bogus".to_string()))
        );
        assert_eq!(
            parse_args(&args(&["a.csv", "b.csv"])),
            Err(CliError::UnexpectedArgument("b.csv".to_string()))
        );
        assert_eq!(
            parse_args(&args(&["-s", "=5"])),
            Err(CliError::InvalidEdit("=5".to_string()))
        );
        assert_eq!(
            parse_args(&args(&["--sort", "B:sideways"])),
            Err(CliError::InvalidSort("B:sideways".to_string()))
        );
        assert_eq!(
            parse_args(&args(&["--demo", "a.csv"])),
            Err(CliError::DemoWithFile)
        );
    }

    #[test]
    fn test_defaults_print_sheet() {
        let parsed = parse_args(&[]).unwrap();
        assert!(parsed.prints_sheet());
        assert!(!parsed.demo);
    }
}
