//! Import and export of sheets.

mod csv;

pub use csv::{parse_csv_str, read_csv, sheet_from_csv, to_csv_string, write_csv};
