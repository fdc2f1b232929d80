//! Unified error types for photospots
//!
//! Error strategy:
//! - Per-row errors (malformed record): Recoverable, skip and continue loading
//! - Configuration errors: Fatal, fail fast before any computation
//! - Output errors: Fatal, abort the run
//!
//! Degenerate data (too few points, a single cluster, flat series) is never an
//! error. Those conditions are reported through sentinel values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Input formats accepted for photo tables, for helpful error messages
pub const SUPPORTED_FORMATS: &str = "CSV, JSON";

/// Top-level error type for photospots operations
#[derive(Debug, Error)]
pub enum PhotospotsError {
    // =========================================================================
    // Recoverable errors - skip row, continue loading
    // =========================================================================
    #[error("Malformed record at line {line}: {reason}")]
    RecordError { line: usize, reason: String },

    // =========================================================================
    // Fatal errors - abort the run
    // =========================================================================
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Cannot read input '{path}': {reason}\n  Tip: The table needs at least id, lat, long, date_taken_year and date_taken_month columns")]
    InputError { path: PathBuf, reason: String },

    #[error("Unsupported input format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("{algorithm} clustering failed: {reason}")]
    ClusteringFailed {
        algorithm: &'static str,
        reason: String,
    },

    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for photospots operations
pub type Result<T> = std::result::Result<T, PhotospotsError>;

impl PhotospotsError {
    /// Returns true if this error is recoverable (skip the row, continue loading)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PhotospotsError::RecordError { .. })
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        PhotospotsError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Create an input error with context about the issue
    pub fn input_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PhotospotsError::InputError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!(
                    "Permission denied. Check that you have write access to {}",
                    path.display()
                )
            }
            std::io::ErrorKind::NotFound => {
                let parent = path
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                format!("Directory does not exist: {}", parent)
            }
            _ => err.to_string(),
        };
        PhotospotsError::OutputError { path, reason }
    }
}
