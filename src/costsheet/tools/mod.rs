pub mod boundary;
pub mod classify;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod rename;

pub use error::{Result, ToolError};
