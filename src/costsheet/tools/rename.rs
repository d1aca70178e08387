use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::costsheet::tools::config::PipelineConfig;
use crate::costsheet::tools::error::{Result, ToolError};
use crate::costsheet::tools::io::{discover, excel_read, excel_write};
use crate::costsheet::tools::model::{CPF_COLUMN, FATURA_COLUMN, Spreadsheet};

/// Result of a successful rename: where it was written and which columns
/// were mapped.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameOutcome {
    pub output: PathBuf,
    pub renamed: Vec<(String, String)>,
}

impl RenameOutcome {
    /// Renders the mapping as `'old' → 'new'` pairs.
    pub fn describe(&self) -> String {
        self.renamed
            .iter()
            .map(|(old, new)| format!("'{old}' → '{new}'"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Renames the identifier column to `CPF` and the cost column to `Fatura`,
/// leaving every other column and all data untouched.
pub fn rename_columns(
    sheet: &Spreadsheet,
    identifier_column: &str,
    cost_column: &str,
) -> Result<Spreadsheet> {
    if identifier_column == cost_column {
        return Err(ToolError::InvalidRequest(format!(
            "The CPF and cost columns must be different, got '{identifier_column}' for both."
        )));
    }
    sheet.require_columns(&[identifier_column, cost_column])?;

    let mut renamed = sheet.clone();
    renamed.rename_column(identifier_column, CPF_COLUMN)?;
    renamed.rename_column(cost_column, FATURA_COLUMN)?;
    Ok(renamed)
}

/// Reads `input`, renames its columns, and persists the result as
/// `normalized_<file name>` in the configured output directory. The input
/// file is never modified.
#[instrument(level = "info", skip(config, input), fields(input = %input.display()))]
pub fn rename_and_persist(
    config: &PipelineConfig,
    input: &Path,
    identifier_column: &str,
    cost_column: &str,
) -> Result<RenameOutcome> {
    let sheet = excel_read::read_spreadsheet(input)?;
    let renamed = rename_columns(&sheet, identifier_column, cost_column)?;

    let output = config.normalized_path(&discover::base_name(input));
    excel_write::write_spreadsheet(&output, &renamed)?;
    info!(output = %output.display(), "normalized spreadsheet written");

    Ok(RenameOutcome {
        output,
        renamed: vec![
            (identifier_column.to_string(), CPF_COLUMN.to_string()),
            (cost_column.to_string(), FATURA_COLUMN.to_string()),
        ],
    })
}

/// Locates `file_name` under the input directory and renames it.
pub fn rename_file(
    config: &PipelineConfig,
    file_name: &str,
    identifier_column: &str,
    cost_column: &str,
) -> Result<RenameOutcome> {
    let input = discover::find_by_file_name(&config.input_directory, file_name)?;
    rename_and_persist(config, &input, identifier_column, cost_column)
}
