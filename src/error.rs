//! Error types for archive-dl
//!
//! This module provides the error handling for the library, including:
//! - The crate-wide [`Error`] and the task/archive specific [`TaskError`]
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for archive-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archive-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "archive.files_per_task")
        key: Option<String>,
    },

    /// Task or archive related error
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive (ZIP) stream error
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Task identifier could not be parsed
    #[error("invalid task id: {0}")]
    InvalidTaskId(String),

    /// Request body could not be read or parsed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),


    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Task, quota and archive errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task not registered
    #[error("task {id} not found")]
    NotFound {
        /// The task ID that was not found
        id: u64,
    },

    /// Task already holds its full quota of files
    #[error("task {id} is full ({quota} files)")]
    TaskFull {
        /// The task that is full
        id: u64,
        /// Files per task
        quota: usize,
    },

    /// Submission would push the task over its quota
    #[error("too many files for task {id}: {current} tracked + {requested} requested exceeds quota of {quota}")]
    QuotaExceeded {
        /// The task the files were submitted to
        id: u64,
        /// Files already tracked by the task
        current: usize,
        /// Files in the rejected submission
        requested: usize,
        /// Files per task
        quota: usize,
    },

    /// Too many tasks are still downloading to admit a new one
    #[error("server is busy: {busy} tasks still downloading (limit {limit})")]
    ServerBusy {
        /// Tasks currently not idle
        busy: usize,
        /// Configured busy threshold
        limit: usize,
    },

    /// Archive file for a new task could not be created
    #[error("failed to create archive {path} for task {id}: {reason}")]
    ArchiveCreation {
        /// The task whose archive could not be created
        id: u64,
        /// The archive path
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },

    /// Archive already finalized, no more entries can be written
    #[error("archive for task {id} is already finalized")]
    ArchiveFinalized {
        /// The task whose archive is closed
        id: u64,
    },

    /// URL does not end in an accepted extension
    #[error("unsupported file type for {url}: only {} are accepted", .allowed.join(", "))]
    UnsupportedExtension {
        /// The rejected URL
        url: String,
        /// Extensions accepted by the task
        allowed: Vec<String>,
    },

    /// URL already submitted to the task
    #[error("{url} was already submitted to task {id}")]
    DuplicateUrl {
        /// The task the URL was submitted to
        id: u64,
        /// The duplicated URL
        url: String,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task error: task 7 not found",
///     "details": {
///       "task_id": 7
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "quota_exceeded")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidTaskId(_) => 400,
            Error::InvalidRequest(_) => 400,
            Error::Task(TaskError::TaskFull { .. }) => 400,
            Error::Task(TaskError::QuotaExceeded { .. }) => 400,
            Error::Task(TaskError::UnsupportedExtension { .. }) => 400,

            // 404 Not Found
            Error::Task(TaskError::NotFound { .. }) => 404,

            // 409 Conflict
            Error::Task(TaskError::ArchiveFinalized { .. }) => 409,
            Error::Task(TaskError::DuplicateUrl { .. }) => 409,

            // 500 Internal Server Error - Server-side issues
            Error::Task(TaskError::ArchiveCreation { .. }) => 500,
            Error::Io(_) => 500,
            Error::Archive(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::Task(TaskError::ServerBusy { .. }) => 503,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::TaskFull { .. } => "task_full",
                TaskError::QuotaExceeded { .. } => "quota_exceeded",
                TaskError::ServerBusy { .. } => "server_busy",
                TaskError::ArchiveCreation { .. } => "archive_creation_failed",
                TaskError::ArchiveFinalized { .. } => "archive_finalized",
                TaskError::UnsupportedExtension { .. } => "unsupported_extension",
                TaskError::DuplicateUrl { .. } => "duplicate_url",
            },
            Error::Io(_) => "io_error",
            Error::Archive(_) => "archive_error",
            Error::InvalidTaskId(_) => "invalid_task_id",
            Error::InvalidRequest(_) => "invalid_request",
            Error::ShuttingDown => "shutting_down",
            Error::Network(_) => "network_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Task(TaskError::NotFound { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Task(TaskError::TaskFull { id, quota }) => Some(serde_json::json!({
                "task_id": id,
                "quota": quota,
            })),
            Error::Task(TaskError::QuotaExceeded {
                id,
                current,
                requested,
                quota,
            }) => Some(serde_json::json!({
                "task_id": id,
                "current": current,
                "requested": requested,
                "quota": quota,
            })),
            Error::Task(TaskError::ServerBusy { busy, limit }) => Some(serde_json::json!({
                "busy_tasks": busy,
                "limit": limit,
            })),
            Error::Task(TaskError::ArchiveCreation { id, path, .. }) => Some(serde_json::json!({
                "task_id": id,
                "path": path,
            })),
            Error::Task(TaskError::UnsupportedExtension { url, allowed }) => {
                Some(serde_json::json!({
                    "url": url,
                    "allowed_extensions": allowed,
                }))
            }
            Error::Task(TaskError::DuplicateUrl { id, url }) => Some(serde_json::json!({
                "task_id": id,
                "url": url,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
