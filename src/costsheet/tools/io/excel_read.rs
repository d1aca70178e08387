use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};

use crate::costsheet::tools::error::{Result, ToolError};
use crate::costsheet::tools::model::{Cell, Spreadsheet};

/// Reads the first worksheet of an `.xlsx`/`.xls` file. The first row is
/// taken as the header; rows where every cell is blank are dropped.
pub fn read_spreadsheet(path: &Path) -> Result<Spreadsheet> {
    let unreadable = |reason: String| ToolError::FileUnreadable {
        path: path.to_path_buf(),
        reason,
    };

    if !path.is_file() {
        return Err(unreadable("file does not exist".into()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|err| unreadable(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable("workbook has no worksheet".into()))?
        .map_err(|err| unreadable(err.to_string()))?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| cell_to_string(Some(cell)).trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    Ok(Spreadsheet::new(columns, rows))
}

fn data_to_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(value) => Cell::Text(value.clone()),
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        DataType::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
