use std::io::Cursor;

use calamine::{Data, Reader};

use crate::error::{PaytrailError, Result};
use crate::models::{CellValue, RawRow};

/// Positional grid of the first worksheet. No header inference happens here.
pub type Grid = Vec<RawRow>;

/// Read workbook bytes (xlsx, xls, ods) into a grid of cells from the first sheet.
pub fn extract_rows(bytes: &[u8]) -> Result<Grid> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| PaytrailError::UnreadableWorkbook(e.to_string()))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(PaytrailError::EmptyWorkbook);
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PaytrailError::UnreadableWorkbook(e.to_string()))?;

    // Ranges start at the first used cell; pad so column indexes stay absolute.
    let col_offset = range.start().map_or(0, |(_, col)| col as usize);
    let grid: Grid = range
        .rows()
        .map(|row| {
            let mut cells = vec![CellValue::Empty; col_offset];
            cells.extend(row.iter().map(cell_value));
            cells
        })
        .filter(|row| row.iter().any(|c| !c.is_blank()))
        .collect();

    if grid.is_empty() {
        return Err(PaytrailError::EmptyWorkbook);
    }
    tracing::debug!(sheet = %sheet_name, rows = grid.len(), "extracted workbook rows");
    Ok(grid)
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::Error(_) => CellValue::Empty,
    }
}
