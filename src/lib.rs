//! Core library for the costsheet-tools command line application.
//!
//! The library normalizes employee benefit cost spreadsheets and merges them
//! into a single cost report. IO adapters live under
//! [`costsheet::tools::io`], the table representation inside
//! [`costsheet::tools::model`], cell cleaning in
//! [`costsheet::tools::normalize`], column renaming in
//! [`costsheet::tools::rename`], the join in [`costsheet::tools::merge`], and
//! the end-to-end run under [`costsheet::tools::pipeline`]. Column roles come
//! from a pluggable [`costsheet::tools::classify::ColumnClassifier`].

pub mod costsheet;

pub use costsheet::tools::{
    Result, ToolError, boundary, classify, config, error, io, merge, model, normalize, pipeline,
    rename,
};
