use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur while the
/// tool reads, normalizes, merges, or writes cost spreadsheets.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a spreadsheet is absent, corrupt, or has no worksheet.
    #[error("error opening file '{}': {reason}", path.display())]
    FileUnreadable { path: PathBuf, reason: String },

    /// Raised when a file name could not be located under a directory.
    #[error("File '{file_name}' not found in '{}'.", directory.display())]
    FileNotFound {
        file_name: String,
        directory: PathBuf,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when requested columns are absent from a spreadsheet.
    #[error("Specified columns not found in spreadsheet: {missing:?}; available columns: {available:?}")]
    MissingColumn {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// Raised when a column the merge relies on is absent at sum time.
    #[error("Expected column not found: '{column}'; available columns: {available:?}")]
    MissingExpectedColumn {
        column: String,
        available: Vec<String>,
    },

    /// Raised when a monetary cell cannot be coerced into a number.
    #[error("unparseable monetary value '{0}'")]
    UnparseableValue(String),

    /// Raised when a boundary call carries incomplete arguments.
    #[error("{0}")]
    InvalidRequest(String),

    /// Raised when the classifier returns an unusable role assignment.
    #[error("invalid column classification for '{file_name}': {reason}")]
    Classification { file_name: String, reason: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
