use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::costsheet::tools::error::Result;
use crate::costsheet::tools::model::{Cell, Spreadsheet};

/// Writes the spreadsheet as a single-sheet workbook at `path`, creating the
/// parent directory when needed.
pub fn write_spreadsheet(path: &Path, sheet: &Spreadsheet) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    let sheet_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    worksheet.set_name(sanitize_sheet_name(&sheet_name))?;

    for (col_idx, header) in sheet.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
    }

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(value) if value.is_empty() => {}
                Cell::Text(value) => {
                    worksheet.write_string(row_num, col_num, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row_num, col_num, *value)?;
                }
                Cell::Bool(value) => {
                    worksheet.write_boolean(row_num, col_num, *value)?;
                }
            }
        }
    }

    if !sheet.columns.is_empty() && !sheet.rows.is_empty() {
        let col_end = (sheet.columns.len() as u16).saturating_sub(1);
        worksheet.autofilter(0, 0, sheet.rows.len() as u32, col_end)?;
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    workbook.save(path)?;
    Ok(())
}

fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "Sheet1".to_string();
    }

    // Excel caps sheet names at 31 characters.
    sanitized.chars().take(31).collect()
}
