//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown ids, empty bulk update, bad config)
//! - 3: Blocked by policy (edit permission denied)
//! - 4: Operation failed (storage, lock contention, write conflict)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Milestone not found: {0}")]
    MilestoneNotFound(String),

    #[error("Bulk update specifies no status, priority or milestone")]
    EmptyBulkUpdate,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Board not initialized at {0}")]
    NotInitialized(PathBuf),

    // Policy blocks (exit code 3)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Operation failures (exit code 4)
    #[error("Concurrent modification: duplicate position {position} in {scope}")]
    ConcurrentModification { scope: String, position: u64 },

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TaskNotFound(_)
            | Error::MilestoneNotFound(_)
            | Error::EmptyBulkUpdate
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::NotInitialized(_) => exit_codes::USER_ERROR,

            Error::PermissionDenied(_) => exit_codes::POLICY_BLOCKED,

            Error::ConcurrentModification { .. }
            | Error::Transaction(_)
            | Error::LockFailed(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Exit-code class as reported in JSON errors.
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::POLICY_BLOCKED => "policy_blocked",
            _ => "operation_failed",
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::ConcurrentModification { .. } | Error::LockFailed(_)
        )
    }

    /// Structured fields for JSON error output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task": id })),
            Error::MilestoneNotFound(id) => Some(serde_json::json!({ "milestone": id })),
            Error::ConcurrentModification { scope, position } => Some(serde_json::json!({
                "scope": scope,
                "position": position,
                "transient": true,
            })),
            Error::InvalidArgument(message) | Error::InvalidConfig(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            _ => None,
        }
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
