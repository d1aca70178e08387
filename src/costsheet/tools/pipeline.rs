use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::costsheet::tools::classify::{
    self, ClassificationRequest, ColumnClassifier, RoleAssignment,
};
use crate::costsheet::tools::config::PipelineConfig;
use crate::costsheet::tools::error::Result;
use crate::costsheet::tools::io::{discover, excel_read, excel_write};
use crate::costsheet::tools::merge::{self, MergeOutcome};
use crate::costsheet::tools::model::Spreadsheet;
use crate::costsheet::tools::normalize::{self, ValueKind};
use crate::costsheet::tools::rename;

/// Status of one input file after the per-file stages.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub file: PathBuf,
    pub status: String,
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub files: Vec<FileReport>,
    /// Merge outcome, or the rendered error that aborted the merge.
    pub merge: std::result::Result<MergeOutcome, String>,
}

impl PipelineReport {
    /// Status line of the merge stage.
    pub fn merge_status(&self) -> String {
        match &self.merge {
            Ok(outcome) => outcome.describe(),
            Err(err) => format!("Error: {err}"),
        }
    }
}

/// Runs discovery, renaming, value normalization, and the merge.
///
/// Per-file failures are recorded in the report and never stop the batch.
/// The merge starts only after every file went through its stages.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %config.input_directory.display(), output = %config.output_directory.display())
)]
pub fn run(config: &PipelineConfig, classifier: &dyn ColumnClassifier) -> Result<PipelineReport> {
    fs::create_dir_all(&config.output_directory)?;

    let inputs = discover::list_spreadsheets(&config.input_directory);
    info!(file_count = inputs.len(), "spreadsheets discovered");

    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        let status = match process_file(config, classifier, &input) {
            Ok(message) => message,
            Err(err) => {
                warn!(file = %input.display(), error = %err, "file excluded from the batch");
                format!("Error: {err}")
            }
        };
        files.push(FileReport {
            file: input,
            status,
        });
    }

    let merge = merge::merge_normalized_spreadsheets(config).map_err(|err| err.to_string());
    let report = PipelineReport { files, merge };
    info!(result = %report.merge_status(), "merge finished");

    Ok(report)
}

/// Stages one input file into the output directory with its values cleaned.
///
/// Renaming and cleaning happen in memory; the staged file is written only
/// when both succeed. On failure any staged file left by an earlier run is
/// removed so the merge cannot pick it up.
fn process_file(
    config: &PipelineConfig,
    classifier: &dyn ColumnClassifier,
    input: &Path,
) -> Result<String> {
    let file_name = discover::base_name(input);
    let is_base = file_name == config.base_file_name;
    let staged = if is_base {
        config.base_path()
    } else {
        config.normalized_path(&file_name)
    };

    match stage_file(classifier, input, &staged, is_base) {
        Ok(assignment) => Ok(format!(
            "Success. '{}' staged as '{}' ({} column(s) cleaned)",
            file_name,
            staged.display(),
            assignment.roles().len()
        )),
        Err(err) => {
            discard_stale(&staged);
            Err(err)
        }
    }
}

fn stage_file(
    classifier: &dyn ColumnClassifier,
    input: &Path,
    staged: &Path,
    is_base: bool,
) -> Result<RoleAssignment> {
    let sheet = excel_read::read_spreadsheet(input)?;

    let sheet = if is_base {
        sheet
    } else {
        let request = ClassificationRequest::from_sheet(discover::base_name(input), &sheet);
        let columns = classify::classify_cost_columns(classifier, &request)?;
        rename::rename_columns(&sheet, &columns.identifier_column, &columns.cost_column)?
    };

    let (cleaned, assignment) = clean_sheet(classifier, &discover::base_name(staged), &sheet)?;
    excel_write::write_spreadsheet(staged, &cleaned)?;
    info!(output = %staged.display(), "spreadsheet staged");
    Ok(assignment)
}

fn discard_stale(staged: &Path) {
    if !staged.is_file() {
        return;
    }
    match fs::remove_file(staged) {
        Ok(()) => warn!(path = %staged.display(), "stale staged file removed"),
        Err(err) => {
            warn!(path = %staged.display(), error = %err, "could not remove stale staged file")
        }
    }
}

/// Classifies the columns of `sheet` and applies the matching normalizers.
#[instrument(level = "info", skip(classifier, sheet))]
pub fn clean_sheet(
    classifier: &dyn ColumnClassifier,
    file_name: &str,
    sheet: &Spreadsheet,
) -> Result<(Spreadsheet, RoleAssignment)> {
    let request = ClassificationRequest::from_sheet(file_name, sheet);
    let assignment = classify::classify_roles(classifier, &request)?;
    let cleaned = apply_roles(sheet, &assignment)?;
    Ok((cleaned, assignment))
}

/// Applies the identifier, name, and monetary normalizers selected by
/// `assignment`. A column listed under several roles gets the first one.
pub fn apply_roles(sheet: &Spreadsheet, assignment: &RoleAssignment) -> Result<Spreadsheet> {
    let roles = assignment.roles();
    let mut cleaned = sheet.clone();
    for column in &sheet.columns {
        let role = roles.get(column.as_str()).copied();
        let Some(kind) = role.and_then(ValueKind::for_role) else {
            continue;
        };
        cleaned = normalize::normalize_columns(&cleaned, kind, &[column])?;
    }
    Ok(cleaned)
}
