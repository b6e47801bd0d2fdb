//! Core types for archive-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a task
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }

    /// File name of the archive belonging to this task
    pub fn archive_file_name(&self) -> String {
        format!("Archiv{}.zip", self.0)
    }

    /// Inverse of [`archive_file_name`](Self::archive_file_name)
    pub fn from_archive_file_name(name: &str) -> Option<Self> {
        let digits = name.strip_prefix("Archiv")?.strip_suffix(".zip")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Status of a single submitted file
///
/// `Downloading` is the only non-terminal state. Once a file reaches any
/// other state it never changes again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileStatus {
    /// Fetch in progress
    Downloading,
    /// Fetched and written into the archive
    Downloaded,
    /// Server answered with something other than 200 OK
    InvalidResource,
    /// Transport or archive failure, with a human-readable cause
    Error(String),
}

impl FileStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FileStatus::Downloading)
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Downloading => write!(f, "Downloading"),
            FileStatus::Downloaded => write!(f, "Downloaded"),
            FileStatus::InvalidResource => write!(f, "Invalid resource"),
            FileStatus::Error(detail) => write!(f, "Error: {}", detail),
        }
    }
}

/// Request body for POST /task/:id/download
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitUrlsRequest {
    /// URLs to download into the task's archive
    #[serde(rename = "URLs", default)]
    pub urls: Vec<String>,
}

/// A URL that was not handed to a download worker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RejectedUrl {
    /// The rejected URL
    pub url: String,
    /// Why it was rejected
    pub reason: String,
}

/// Per-URL result of a submission
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubmitOutcome {
    /// URLs now downloading
    pub accepted: Vec<String>,
    /// URLs refused individually (unsupported type, duplicate)
    pub rejected: Vec<RejectedUrl>,
}

impl SubmitOutcome {
    /// Whether at least one URL started downloading
    pub fn any_accepted(&self) -> bool {
        !self.accepted.is_empty()
    }
}

/// Response for GET /CreateTask
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskCreated {
    /// Identifier of the new task
    pub task_id: TaskId,
    /// Human-readable confirmation
    pub message: String,
    /// Name of the archive the task will produce
    pub archive: String,
    /// When the task was created
    pub created_at: DateTime<Utc>,
}
