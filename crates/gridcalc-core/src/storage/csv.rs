//! CSV import/export functionality

use crate::document::Document;
use crate::error::{CoreError, Result};
use gridcalc_engine::engine::{Cell, CellRef, Sheet, Value, format_result, parse_decimal};
use std::path::Path;

/// Parse CSV text into cells, starting at the given offset. Empty fields are skipped.
pub fn parse_csv_str(content: &str, start_col: usize, start_row: usize) -> Result<Vec<(CellRef, Cell)>> {
    let mut cells = Vec::new();

    for (row_idx, line) in content.lines().enumerate() {
        let fields = parse_csv_line(line).ok_or_else(|| CoreError::CsvParse {
            line: row_idx + 1,
            message: "unterminated quoted field".to_string(),
        })?;
        for (col_idx, field) in fields.into_iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            let cell_ref = CellRef::new(start_col + col_idx, start_row + row_idx);
            cells.push((cell_ref, parse_csv_field(&field)));
        }
    }

    Ok(cells)
}

/// Build a sheet from CSV text. The sheet is at least `min_rows` x `min_cols`
/// and grows to fit the data.
pub fn sheet_from_csv(content: &str, id: &str, name: &str, min_rows: usize, min_cols: usize) -> Result<Sheet> {
    let cells = parse_csv_str(content, 0, 0)?;
    let rows = cells.iter().map(|(r, _)| r.row + 1).max().unwrap_or(0).max(min_rows);
    let cols = cells.iter().map(|(r, _)| r.col + 1).max().unwrap_or(0).max(min_cols);

    let mut sheet = Sheet::new(id, name, rows, cols);
    for (cell_ref, cell) in cells {
        sheet.set(cell_ref, cell);
    }
    Ok(sheet)
}

/// Read a CSV file into a new sheet named after the file.
pub fn read_csv(path: &Path, min_rows: usize, min_cols: usize) -> Result<Sheet> {
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet".to_string());
    sheet_from_csv(&content, &name, &name, min_rows, min_cols)
}

/// Parse a single CSV line, handling quoted fields. Returns None if a quote is left open.
pub(crate) fn parse_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                }
                ',' => {
                    let field = std::mem::take(&mut current);
                    fields.push(if field_was_quoted {
                        field
                    } else {
                        field.trim().to_string()
                    });
                    field_was_quoted = false;
                }
                _ => current.push(c),
            }
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(if field_was_quoted {
        current
    } else {
        current.trim().to_string()
    });
    Some(fields)
}

/// Parse a CSV field into a cell:
/// - `=...` -> formula
/// - valid number -> number (unless it has leading zeros like "007")
/// - `TRUE` / `FALSE` -> bool
/// - otherwise -> text
pub(crate) fn parse_csv_field(field: &str) -> Cell {
    // Keep explicit surrounding whitespace (typically from quoted CSV fields).
    let trimmed = field.trim();
    if field != trimmed {
        return Cell::literal(field);
    }

    if trimmed.starts_with('=') {
        return Cell::formula(trimmed);
    }

    // "007", "00123" stay text; "0" and "0.5" are numbers.
    let leading_zero = trimmed.starts_with('0')
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit());
    if !leading_zero {
        if let Some(n) = parse_decimal(trimmed) {
            return Cell::literal(n);
        }
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Cell::literal(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Cell::literal(false);
    }

    Cell::literal(Value::from(trimmed))
}

/// Render every row and column of the sheet as CSV using evaluated values.
/// Failed cells are written as `#CODE!`.
pub fn to_csv_string(doc: &Document) -> String {
    let sheet = doc.sheet();
    let mut lines = Vec::with_capacity(sheet.rows);

    for row in 0..sheet.rows {
        let row_fields: Vec<String> = (0..sheet.cols)
            .map(|col| {
                let result = doc.evaluate_cell(&CellRef::new(col, row), false);
                escape_csv_field(&format_result(&result))
            })
            .collect();
        lines.push(row_fields.join(","));
    }

    lines.join("\n")
}

/// Export the document to a CSV file.
pub fn write_csv(path: &Path, doc: &Document) -> Result<()> {
    let mut content = to_csv_string(doc);
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl Document {
    /// Import CSV text at an offset, overwriting cells and growing the sheet
    /// if the data doesn't fit. Returns the number of cells written.
    pub fn import_csv_str(&mut self, content: &str, start_col: usize, start_row: usize) -> Result<usize> {
        let cells = parse_csv_str(content, start_col, start_row)?;

        let rows_needed = cells.iter().map(|(r, _)| r.row + 1).max().unwrap_or(0);
        let cols_needed = cells.iter().map(|(r, _)| r.col + 1).max().unwrap_or(0);
        self.extend_rows(rows_needed.saturating_sub(self.sheet.rows));
        self.extend_cols(cols_needed.saturating_sub(self.sheet.cols));

        let count = cells.len();
        for (cell_ref, cell) in cells {
            self.update_cell(cell_ref, cell)?;
        }
        Ok(count)
    }
}
