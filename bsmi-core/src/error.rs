//! Error types for BSMI reporting
//!
//! Argument validation and model integrity failures are fatal and surface as
//! [`BsmiError`]. Per-requirement findings (conflicts, unallocated
//! requirements, malformed codes) are not errors; see
//! [`crate::allocation::AllocationWarning`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a model or generating a report
#[derive(Error, Debug)]
pub enum BsmiError {
    #[error("Input must be a 4-digit numeric string, got '{0}'")]
    InvalidCodeFormat(String),

    #[error("Malformed model: {0}")]
    MalformedModel(String),

    #[error("At least one specification/category partition is required")]
    EmptyPartitionList,

    #[error("No iteration was supplied")]
    NullIteration,

    #[error("No specification/category partitions were supplied")]
    NullPartitions,

    #[error("Specification input must contain at least a specification shortname, got '{0}'")]
    InvalidPartitionArgument(String),

    #[error("No output target was supplied")]
    NullOutputTarget,

    #[error("Engineering model not found: {0}")]
    ModelNotFound(String),

    #[error("Iteration {number} not found in engineering model {model}")]
    IterationNotFound { model: String, number: u32 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection to data source failed: {0}")]
    ConnectionFailed(String),

    #[error("Unsupported output file: {0}")]
    UnsupportedExtension(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Excel error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BsmiError>;
