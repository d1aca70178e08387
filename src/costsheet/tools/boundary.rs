//! Tool-style entry points for an orchestration layer.
//!
//! Every call takes a [`ToolRequest`] and answers with a status string that
//! starts with `Success` when the call succeeded. Errors are rendered to text
//! here and nowhere else.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::costsheet::tools::config::PipelineConfig;
use crate::costsheet::tools::error::{Result, ToolError};
use crate::costsheet::tools::io::{excel_read, excel_write};
use crate::costsheet::tools::merge;
use crate::costsheet::tools::normalize::{self, ValueKind};
use crate::costsheet::tools::rename;

/// Prefix shared by every successful status string.
pub const SUCCESS_PREFIX: &str = "Success";

/// Arguments of a tool call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolRequest {
    pub file_name: String,
    pub columns: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestEnvelope {
    Wrapped { args: ToolRequest },
    Bare(ToolRequest),
}

impl ToolRequest {
    /// Parses a request given either bare or wrapped as `{"args": {...}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(match serde_json::from_str::<RequestEnvelope>(json)? {
            RequestEnvelope::Wrapped { args } => args,
            RequestEnvelope::Bare(request) => request,
        })
    }

    fn require_file_name(&self) -> Result<&str> {
        if self.file_name.trim().is_empty() {
            Err(ToolError::InvalidRequest(
                "Parameter 'file_name' is required.".into(),
            ))
        } else {
            Ok(&self.file_name)
        }
    }

    fn require_columns(&self) -> Result<&[String]> {
        if self.columns.is_empty() {
            Err(ToolError::InvalidRequest(
                "'columns' must be a non-empty list.".into(),
            ))
        } else {
            Ok(&self.columns)
        }
    }
}

/// Renders a call result for the orchestration layer.
pub fn render(result: Result<String>) -> String {
    match result {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "tool call failed");
            format!("Error: {err}")
        }
    }
}

/// Returns `true` when `status` reports success.
pub fn is_success(status: &str) -> bool {
    status.starts_with(SUCCESS_PREFIX)
}

/// Renames the CPF and cost columns of a file found in the input directory.
/// `columns` holds the identifier column followed by the cost column.
#[instrument(level = "info", skip(config))]
pub fn normalize_spreadsheets(config: &PipelineConfig, request: &ToolRequest) -> String {
    render(try_normalize_spreadsheets(config, request))
}

fn try_normalize_spreadsheets(config: &PipelineConfig, request: &ToolRequest) -> Result<String> {
    let file_name = request.require_file_name()?;
    let [identifier, cost, ..] = request.columns.as_slice() else {
        return Err(ToolError::InvalidRequest(
            "You must provide the columns for CPF and cost to rename.".into(),
        ));
    };

    let outcome = rename::rename_file(config, file_name, identifier, cost)?;
    Ok(format!(
        "{SUCCESS_PREFIX}. Columns renamed: {}",
        outcome.describe()
    ))
}

/// Strips `.`, `-`, and whitespace from identifier columns.
#[instrument(level = "info", skip(config))]
pub fn normalize_cpf(config: &PipelineConfig, request: &ToolRequest) -> String {
    render(normalize_file_columns(config, request, ValueKind::Identifier))
}

/// Trims, title-cases, and strips accents from text columns.
#[instrument(level = "info", skip(config))]
pub fn normalize_text(config: &PipelineConfig, request: &ToolRequest) -> String {
    render(normalize_file_columns(config, request, ValueKind::Name))
}

/// Re-formats monetary columns as two-decimal comma text.
#[instrument(level = "info", skip(config))]
pub fn normalize_monetary_values(config: &PipelineConfig, request: &ToolRequest) -> String {
    render(normalize_file_columns(config, request, ValueKind::Monetary))
}

/// Merges the normalized spreadsheets of the output directory.
#[instrument(level = "info", skip_all)]
pub fn merge(config: &PipelineConfig) -> String {
    render(merge::merge_normalized_spreadsheets(config).map(|outcome| outcome.describe()))
}

/// Applies one normalizer to the requested columns of a file and rewrites it
/// in place. Nothing is written when any column is missing.
pub fn normalize_file_columns(
    config: &PipelineConfig,
    request: &ToolRequest,
    kind: ValueKind,
) -> Result<String> {
    let file_name = request.require_file_name()?;
    let columns = request.require_columns()?;
    let path = resolve_path(config, file_name);

    let sheet = excel_read::read_spreadsheet(&path)?;
    let normalized = normalize::normalize_columns(&sheet, kind, columns)?;
    excel_write::write_spreadsheet(&path, &normalized)?;

    Ok(format!("{SUCCESS_PREFIX}. Columns normalized: {columns:?}"))
}

/// Uses `file_name` as a path; a relative path that does not exist is looked
/// up in the output directory.
fn resolve_path(config: &PipelineConfig, file_name: &str) -> PathBuf {
    let path = Path::new(file_name);
    if path.is_relative() && !path.exists() {
        config.output_directory.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_and_bare_requests_parse() {
        let wrapped = ToolRequest::from_json(
            r#"{"args": {"file_name": "vr.xlsx", "columns": ["Documento", "Valor"]}}"#,
        )
        .expect("wrapped request");
        let bare =
            ToolRequest::from_json(r#"{"file_name": "vr.xlsx", "columns": ["Documento", "Valor"]}"#)
                .expect("bare request");
        assert_eq!(wrapped, bare);
    }

    #[test]
    fn incomplete_requests_are_reported_as_text() {
        let config = PipelineConfig::default();
        let status = normalize_spreadsheets(&config, &ToolRequest::default());
        assert_eq!(status, "Error: Parameter 'file_name' is required.");

        let request = ToolRequest {
            file_name: "vr.xlsx".into(),
            columns: vec!["Documento".into()],
        };
        let status = normalize_spreadsheets(&config, &request);
        assert!(!is_success(&status));
        assert!(status.contains("CPF and cost"));

        let request = ToolRequest {
            file_name: "vr.xlsx".into(),
            columns: Vec::new(),
        };
        let status = normalize_cpf(&config, &request);
        assert_eq!(status, "Error: 'columns' must be a non-empty list.");
    }
}
