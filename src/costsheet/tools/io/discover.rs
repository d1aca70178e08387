use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::costsheet::tools::error::{Result, ToolError};

const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Recursively lists spreadsheet files below `directory`, sorted by path.
/// A missing directory yields an empty list.
pub fn list_spreadsheets(directory: &Path) -> Vec<PathBuf> {
    if !directory.is_dir() {
        debug!(directory = %directory.display(), "directory does not exist");
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(directory)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_spreadsheet(path))
        .collect();

    files.sort();
    files
}

/// Finds the first spreadsheet below `directory` whose base name equals
/// `file_name`.
pub fn find_by_file_name(directory: &Path, file_name: &str) -> Result<PathBuf> {
    list_spreadsheets(directory)
        .into_iter()
        .find(|path| base_name(path) == file_name)
        .ok_or_else(|| ToolError::FileNotFound {
            file_name: file_name.to_string(),
            directory: directory.to_path_buf(),
        })
}

/// File name component of `path`, or an empty string.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
}
