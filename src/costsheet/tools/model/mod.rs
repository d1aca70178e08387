use std::fmt;

use serde::{Deserialize, Serialize};

use crate::costsheet::tools::error::{Result, ToolError};

/// Canonical name of the employee identifier column.
pub const CPF_COLUMN: &str = "CPF";
/// Canonical name of the per-source cost column before merging.
pub const FATURA_COLUMN: &str = "Fatura";
/// Employee name column expected in the base report.
pub const NAME_COLUMN: &str = "Nome";
/// Salary column expected in the base report.
pub const SALARY_COLUMN: &str = "Salario";
/// Computed total column appended to the merged report.
pub const TOTAL_COLUMN: &str = "Custo Total";

/// Represents a single cell value read from or written to a worksheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Cell {
    /// Missing value.
    #[default]
    Empty,
    /// Plain text.
    Text(String),
    /// Floating point number.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
}

impl Cell {
    /// Creates a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Returns `true` for missing values and blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Renders the cell as the string a reader would see in the sheet.
    ///
    /// Integral numbers drop the fractional part so that identifiers stored
    /// as numbers compare equal to the same identifier stored as text.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => format_number(*value),
            Cell::Bool(value) => value.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Semantic classification of a spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Identifier,
    Name,
    MonetaryAmount,
    Unclassified,
}

/// An in-memory, single-sheet table with a header row.
///
/// Rows are positionally aligned with `columns`; every row holds exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spreadsheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Spreadsheet {
    /// Builds a spreadsheet, padding or truncating rows to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Resolves every requested column to its index, failing with the full
    /// list of missing names when any of them is absent.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name.as_ref()) {
                Some(index) => indices.push(index),
                None => missing.push(name.as_ref().to_string()),
            }
        }

        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(ToolError::MissingColumn {
                missing,
                available: self.columns.clone(),
            })
        }
    }

    /// Returns the values of a column in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Rewrites every cell of the column at `index`.
    pub fn map_column(&mut self, index: usize, mut f: impl FnMut(&Cell) -> Cell) {
        for row in &mut self.rows {
            row[index] = f(&row[index]);
        }
    }

    /// Renames a column in place, leaving its data untouched.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let index = self.require_columns(&[from])?[0];
        self.columns[index] = to.to_string();
        Ok(())
    }

    /// Projects the spreadsheet onto the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Spreadsheet> {
        let indices = self.require_columns(names)?;
        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Spreadsheet { columns, rows })
    }

    /// Replaces the column called `name` with `values`, or appends it when
    /// it does not exist yet.
    pub fn set_column(&mut self, name: &str, mut values: Vec<Cell>) {
        values.resize(self.rows.len(), Cell::Empty);
        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// First `count` rows rendered as text, used to give classifiers a
    /// glimpse of the data.
    pub fn sample_rows(&self, count: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(count)
            .map(|row| row.iter().map(Cell::as_text).collect())
            .collect()
    }
}
