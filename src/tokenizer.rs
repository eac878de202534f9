use crate::error::{PaytrailError, Result};
use crate::models::{CellValue, RawRow, Table};

/// Split text into non-blank lines, treating `\r\n`, `\r` and `\n` alike.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Tokenize one line on commas. Quotes toggle quoting state, `""` inside a
/// quoted field is a literal quote, and only unquoted fields are trimmed.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            ',' if !in_quotes => {
                fields.push(finish_field(&mut current, quoted));
                quoted = false;
            }
            _ => current.push(c),
        }
    }
    fields.push(finish_field(&mut current, quoted));
    fields
}

fn finish_field(current: &mut String, quoted: bool) -> String {
    let value = std::mem::take(current);
    if quoted {
        value
    } else {
        value.trim().to_string()
    }
}

/// Tokenize every non-blank line.
pub fn tokenize_lines(text: &str) -> Vec<Vec<String>> {
    split_lines(text)
        .into_iter()
        .map(tokenize_line)
        .filter(|fields| !fields.is_empty())
        .collect()
}

/// Build a header + rows table from the given tokenized lines. The first
/// line is the header; each following line is zipped against it.
pub fn table_from_lines(mut lines: Vec<Vec<String>>) -> Result<Table> {
    if lines.is_empty() {
        return Err(PaytrailError::EmptyInput);
    }
    let headers = lines.remove(0);
    let rows = lines
        .into_iter()
        .map(|fields| zip_row(&headers, fields))
        .collect();
    Ok(Table { headers, rows })
}

/// Parse delimited text into a header + rows table.
pub fn tokenize(text: &str) -> Result<Table> {
    table_from_lines(tokenize_lines(text))
}

fn zip_row(headers: &[String], fields: Vec<String>) -> RawRow {
    fields
        .into_iter()
        .take(headers.len())
        .map(CellValue::Text)
        .collect()
}
