//! Cell-level cleaning for identifier, name, and monetary columns.
//!
//! Every normalizer validates the full list of requested columns before it
//! touches any cell, so a missing column leaves the spreadsheet unchanged.

use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::costsheet::tools::error::{Result, ToolError};
use crate::costsheet::tools::model::{Cell, ColumnRole, Spreadsheet};

/// Kind of cleaning applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Identifier,
    Name,
    Monetary,
}

impl ValueKind {
    /// Normalizer selected for a column role, if any.
    pub fn for_role(role: ColumnRole) -> Option<Self> {
        match role {
            ColumnRole::Identifier => Some(ValueKind::Identifier),
            ColumnRole::Name => Some(ValueKind::Name),
            ColumnRole::MonetaryAmount => Some(ValueKind::Monetary),
            ColumnRole::Unclassified => None,
        }
    }

    fn apply(self, cell: &Cell) -> Cell {
        match self {
            ValueKind::Identifier => normalize_identifier(cell),
            ValueKind::Name => normalize_name(cell),
            ValueKind::Monetary => normalize_monetary(cell),
        }
    }
}

/// Returns a copy of `sheet` with the listed columns rewritten by `kind`.
pub fn normalize_columns<S: AsRef<str>>(
    sheet: &Spreadsheet,
    kind: ValueKind,
    columns: &[S],
) -> Result<Spreadsheet> {
    let indices = sheet.require_columns(columns)?;
    let mut normalized = sheet.clone();
    for index in indices {
        normalized.map_column(index, |cell| kind.apply(cell));
    }
    debug!(?kind, column_count = columns.len(), "columns normalized");
    Ok(normalized)
}

/// Removes `.`, `-`, and whitespace from the cell's string form.
pub fn normalize_identifier(cell: &Cell) -> Cell {
    if matches!(cell, Cell::Empty) {
        return Cell::Empty;
    }
    let cleaned: String = cell
        .as_text()
        .chars()
        .filter(|ch| *ch != '.' && *ch != '-' && !ch.is_whitespace())
        .collect();
    Cell::Text(cleaned)
}

/// Trims, title-cases, and strips diacritics from the cell's string form.
pub fn normalize_name(cell: &Cell) -> Cell {
    if matches!(cell, Cell::Empty) {
        return Cell::Empty;
    }
    let collapsed = cell.as_text().split_whitespace().collect::<Vec<_>>().join(" ");
    Cell::Text(strip_diacritics(&title_case(&collapsed)))
}

/// Re-formats a monetary cell as two-decimal text with a comma separator.
/// Values that cannot be parsed become empty text.
pub fn normalize_monetary(cell: &Cell) -> Cell {
    let amount = match cell {
        Cell::Number(value) => Ok(*value),
        Cell::Empty => return Cell::text(""),
        other => parse_amount(&other.as_text()),
    };

    match amount {
        Ok(value) => Cell::Text(format_amount(value)),
        Err(err) => {
            debug!(error = %err, "monetary value replaced by empty text");
            Cell::text("")
        }
    }
}

/// Parses monetary text using comma as the decimal separator.
///
/// Everything except digits, `,`, `.`, and `-` is discarded first. When a
/// comma is present, periods are thousands separators.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, ',' | '.' | '-'))
        .collect();

    let canonical = if kept.contains(',') {
        kept.replace('.', "").replace(',', ".")
    } else {
        kept
    };

    canonical
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ToolError::UnparseableValue(raw.to_string()))
}

/// Formats a number with two decimals, comma separator, no grouping.
pub fn format_amount(value: f64) -> String {
    let rounded = format!("{value:.2}");
    // Avoid "-0,00" for tiny negative values.
    let magnitude = rounded.trim_start_matches('-');
    let rounded = if magnitude.chars().all(|ch| ch == '0' || ch == '.') {
        magnitude.to_string()
    } else {
        rounded
    };
    rounded.replace('.', ",")
}

/// Reads a cell as a number for aggregation, accepting comma-decimal text.
pub fn cell_amount(cell: &Cell) -> Result<Option<f64>> {
    match cell {
        Cell::Number(value) => Ok(Some(*value)),
        Cell::Text(value) if value.trim().is_empty() => Ok(None),
        Cell::Text(value) => parse_amount(value).map(Some),
        Cell::Empty | Cell::Bool(_) => Ok(None),
    }
}

/// Uppercases the first letter of each word and lowercases the rest. A word
/// starts after any non-alphabetic character.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(ch);
            at_word_start = true;
        }
    }
    result
}

/// Decomposes accented characters and keeps only ASCII, dropping anything
/// without an ASCII base letter.
pub fn strip_diacritics(value: &str) -> String {
    value.nfkd().filter(char::is_ascii).collect()
}
