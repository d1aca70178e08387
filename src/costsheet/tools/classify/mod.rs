//! Column role assignment.
//!
//! The pipeline only depends on the [`ColumnClassifier`] trait. Two
//! implementations ship with the crate: a keyword matcher and a JSON mapping
//! file written by hand. Whatever the implementation returns is validated
//! against the spreadsheet's real columns before it is used.

mod keyword;
mod mapping;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use keyword::KeywordClassifier;
pub use mapping::MappingClassifier;

use crate::costsheet::tools::error::{Result, ToolError};
use crate::costsheet::tools::model::{ColumnRole, Spreadsheet};

/// Number of data rows shown to a classifier.
pub const SAMPLE_ROWS: usize = 2;

/// Column headers plus a small sample of rows rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub file_name: String,
    pub columns: Vec<String>,
    pub samples: Vec<Vec<String>>,
}

impl ClassificationRequest {
    pub fn from_sheet(file_name: impl Into<String>, sheet: &Spreadsheet) -> Self {
        Self {
            file_name: file_name.into(),
            columns: sheet.columns.clone(),
            samples: sheet.sample_rows(SAMPLE_ROWS),
        }
    }

    /// Sample values of the column at `index`.
    pub fn column_samples(&self, index: usize) -> impl Iterator<Item = &str> {
        self.samples
            .iter()
            .filter_map(move |row| row.get(index).map(String::as_str))
    }

    fn reject(&self, reason: impl Into<String>) -> ToolError {
        ToolError::Classification {
            file_name: self.file_name.clone(),
            reason: reason.into(),
        }
    }

    fn ensure_known<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
        let unknown: Vec<&String> = names
            .into_iter()
            .filter(|name| !self.columns.contains(*name))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(self.reject(format!(
                "unknown column(s) {unknown:?}; available columns: {:?}",
                self.columns
            )))
        }
    }
}

/// Identifier and cost columns used by the renamer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostColumns {
    pub identifier_column: String,
    pub cost_column: String,
}

/// Column groups used to dispatch the value normalizers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleAssignment {
    pub name_columns: Vec<String>,
    #[serde(alias = "cpf_columns")]
    pub identifier_columns: Vec<String>,
    pub value_columns: Vec<String>,
}

impl RoleAssignment {
    /// Role of every listed column. A column listed under several roles keeps
    /// the first one in identifier, name, monetary order.
    pub fn roles(&self) -> HashMap<&str, ColumnRole> {
        let mut roles = HashMap::new();
        let groups = [
            (&self.identifier_columns, ColumnRole::Identifier),
            (&self.name_columns, ColumnRole::Name),
            (&self.value_columns, ColumnRole::MonetaryAmount),
        ];
        for (columns, role) in groups {
            for column in columns {
                roles.entry(column.as_str()).or_insert(role);
            }
        }
        roles
    }

    pub fn is_empty(&self) -> bool {
        self.name_columns.is_empty()
            && self.identifier_columns.is_empty()
            && self.value_columns.is_empty()
    }
}

/// Pluggable oracle mapping headers and sample rows to column roles.
pub trait ColumnClassifier {
    /// Picks the identifier and cost columns of a raw cost spreadsheet.
    fn cost_columns(&self, request: &ClassificationRequest) -> Result<CostColumns>;

    /// Groups columns by the normalizer that should clean them.
    fn roles(&self, request: &ClassificationRequest) -> Result<RoleAssignment>;
}

/// Asks `classifier` for the cost columns and rejects answers that do not
/// match the request.
pub fn classify_cost_columns(
    classifier: &dyn ColumnClassifier,
    request: &ClassificationRequest,
) -> Result<CostColumns> {
    let assignment = classifier.cost_columns(request)?;
    if assignment.identifier_column.trim().is_empty() || assignment.cost_column.trim().is_empty() {
        return Err(request.reject("identifier and cost columns are both required"));
    }
    if assignment.identifier_column == assignment.cost_column {
        return Err(request.reject(format!(
            "column '{}' assigned as both identifier and cost",
            assignment.identifier_column
        )));
    }
    request.ensure_known([&assignment.identifier_column, &assignment.cost_column])?;
    Ok(assignment)
}

/// Asks `classifier` for the role groups and rejects unknown columns.
pub fn classify_roles(
    classifier: &dyn ColumnClassifier,
    request: &ClassificationRequest,
) -> Result<RoleAssignment> {
    let assignment = classifier.roles(request)?;
    request.ensure_known(
        assignment
            .name_columns
            .iter()
            .chain(&assignment.identifier_columns)
            .chain(&assignment.value_columns),
    )?;
    Ok(assignment)
}
