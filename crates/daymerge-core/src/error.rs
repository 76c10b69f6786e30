//! Error types and exit codes for daymerge
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (fatal output I/O)
//! - 2: Usage error (bad flags/args/config values)
//! - 3: Data error (`check` found problems)
//!
//! Per-note and per-image failures never surface here; they become
//! [`crate::diagnostics::Diagnostic`] entries on the run report.

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the daymerge binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data error - check found problems (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during daymerge operations
#[derive(Error, Debug)]
pub enum MergeError {
    // Usage errors (exit code 2)
    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    #[error("unsupported {context}: {value} (supported: {supported})")]
    Unsupported {
        context: String,
        value: String,
        supported: String,
    },

    #[error("invalid config in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    // Data errors (exit code 3)
    #[error("unrecognized note filename {filename:?}: {reason}")]
    InvalidFilename { filename: String, reason: String },

    #[error("check found {count} problem(s)")]
    CheckFailed { count: usize },

    // Generic failures (exit code 1)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to {operation} {target}: {reason}")]
    FailedOperation {
        operation: String,
        target: String,
        reason: String,
    },
}

impl MergeError {
    /// Create an error for a failed IO operation with context
    pub fn io_operation(
        operation: &str,
        path: impl std::fmt::Display,
        error: impl std::fmt::Display,
    ) -> Self {
        MergeError::FailedOperation {
            operation: operation.to_string(),
            target: path.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        MergeError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an unsupported value
    pub fn unsupported(
        context: &str,
        value: impl std::fmt::Display,
        supported: impl std::fmt::Display,
    ) -> Self {
        MergeError::Unsupported {
            context: context.to_string(),
            value: value.to_string(),
            supported: supported.to_string(),
        }
    }

    /// Create an error for a filename that does not follow the note convention
    pub fn invalid_filename(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        MergeError::InvalidFilename {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            MergeError::UsageError(_)
            | MergeError::InvalidValue { .. }
            | MergeError::Unsupported { .. }
            | MergeError::InvalidConfig { .. } => ExitCode::Usage,

            MergeError::InvalidFilename { .. } | MergeError::CheckFailed { .. } => ExitCode::Data,

            MergeError::Json(_) | MergeError::FailedOperation { .. } => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            MergeError::UsageError(_) => "usage_error",
            MergeError::InvalidValue { .. } => "invalid_value",
            MergeError::Unsupported { .. } => "unsupported",
            MergeError::InvalidConfig { .. } => "invalid_config",
            MergeError::InvalidFilename { .. } => "invalid_filename",
            MergeError::CheckFailed { .. } => "check_failed",
            MergeError::Json(_) => "json_error",
            MergeError::FailedOperation { .. } => "failed_operation",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for daymerge operations
pub type Result<T> = std::result::Result<T, MergeError>;
