use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::costsheet::tools::error::Result;

/// Prefix given to every renamed spreadsheet written to the output directory.
pub const NORMALIZED_PREFIX: &str = "normalized_";

/// Locations and file names shared by the renamer, the normalizers and the
/// merge engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory scanned for raw cost spreadsheets.
    pub input_directory: PathBuf,
    /// Directory receiving normalized spreadsheets and the merged report.
    pub output_directory: PathBuf,
    /// File name of the authoritative employee spreadsheet.
    pub base_file_name: String,
    /// File name of the merged report.
    pub merged_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("data/costs"),
            output_directory: PathBuf::from("data/output"),
            base_file_name: "Dados Colaboradores.xlsx".to_string(),
            merged_file_name: "Custo Colaboradores Final.xlsx".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file. Missing keys keep their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn base_path(&self) -> PathBuf {
        self.output_directory.join(&self.base_file_name)
    }

    /// Path of the merged report. The report is always written as `.xlsx`.
    pub fn merged_path(&self) -> PathBuf {
        let path = self.output_directory.join(&self.merged_file_name);
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx")) {
            path
        } else {
            self.output_directory
                .join(format!("{}.xlsx", self.merged_file_name))
        }
    }

    /// Path under which the renamer persists `file_name`.
    pub fn normalized_path(&self, file_name: &str) -> PathBuf {
        self.output_directory
            .join(format!("{NORMALIZED_PREFIX}{file_name}"))
    }
}
