//! A bounded batch of downloads packaged into one archive

use crate::archive::{ArchiveCoordinator, FileManager};
use crate::config::Config;
use crate::error::{Error, Result, TaskError};
use crate::fetch::Fetcher;
use crate::types::{RejectedUrl, SubmitOutcome, TaskId};
use crate::utils::has_allowed_extension;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Status text for a task that has not been given any URL yet
pub const NO_FILES_MESSAGE: &str = "Files not added";

/// One task: an id, its quota and the file manager owning its archive
pub struct Task {
    id: TaskId,
    quota: usize,
    allowed_extensions: Vec<String>,
    archive_link: String,
    file_manager: Arc<dyn FileManager>,
    /// Held across the quota check and the submits of one batch
    admission: Mutex<()>,
    created_at: DateTime<Utc>,
}

impl Task {
    /// Create the task's archive in the configured directory and wrap it in a task
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::ArchiveCreation`] if the archive file cannot be created.
    pub async fn create(id: TaskId, config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let path = config.archive_dir().join(id.archive_file_name());
        let coordinator =
            ArchiveCoordinator::create(id, &path, config.archive.files_per_task, fetcher).await?;

        Ok(Self::new(id, Arc::new(coordinator), config))
    }

    /// Wrap an existing file manager
    pub fn new(id: TaskId, file_manager: Arc<dyn FileManager>, config: &Config) -> Self {
        let archive_link = format!(
            "{}/archives/{}",
            config.server.api.public_base_url.trim_end_matches('/'),
            id.archive_file_name()
        );

        Self {
            id,
            quota: config.archive.files_per_task,
            allowed_extensions: config.archive.allowed_extensions.clone(),
            archive_link,
            file_manager,
            admission: Mutex::new(()),
            created_at: Utc::now(),
        }
    }

    /// Task identifier
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// When the task was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Name of the archive this task writes
    pub fn archive_file_name(&self) -> String {
        self.id.archive_file_name()
    }

    /// Where the finished archive can be retrieved
    pub fn archive_link(&self) -> &str {
        &self.archive_link
    }

    /// Whether the quota is reached and nothing is downloading
    pub async fn is_idle(&self) -> bool {
        self.file_manager.is_idle().await
    }

    /// Whether the archive has been finalized and may be handed out
    pub async fn is_closed(&self) -> bool {
        self.file_manager.is_closed().await
    }

    /// Hand a batch of URLs to the file manager
    ///
    /// The whole batch is refused if it would push the task over its quota.
    /// Otherwise every URL with an allowed extension starts downloading and
    /// every other URL is reported back as rejected without a status entry.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for an empty batch
    /// - [`TaskError::TaskFull`] when the task already holds its quota
    /// - [`TaskError::QuotaExceeded`] when the batch does not fit
    /// - any error from the file manager other than a duplicate URL
    pub async fn accept_urls(&self, urls: Vec<String>) -> Result<SubmitOutcome> {
        if urls.is_empty() {
            return Err(Error::InvalidRequest("no URLs submitted".to_string()));
        }

        let _admission = self.admission.lock().await;

        let current = self.file_manager.file_count().await;
        if current >= self.quota {
            return Err(TaskError::TaskFull {
                id: self.id.get(),
                quota: self.quota,
            }
            .into());
        }
        if current + urls.len() > self.quota {
            return Err(TaskError::QuotaExceeded {
                id: self.id.get(),
                current,
                requested: urls.len(),
                quota: self.quota,
            }
            .into());
        }

        let mut outcome = SubmitOutcome::default();
        for url in urls {
            if !has_allowed_extension(&url, &self.allowed_extensions) {
                let reason = TaskError::UnsupportedExtension {
                    url: url.clone(),
                    allowed: self.allowed_extensions.clone(),
                }
                .to_string();
                debug!(task_id = self.id.get(), url = %url, "unsupported file type");
                outcome.rejected.push(RejectedUrl { url, reason });
                continue;
            }

            match self.file_manager.submit(url.clone()).await {
                Ok(()) => outcome.accepted.push(url),
                Err(e @ Error::Task(TaskError::DuplicateUrl { .. })) => {
                    debug!(task_id = self.id.get(), url = %url, "duplicate URL");
                    outcome.rejected.push(RejectedUrl {
                        url,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            task_id = self.id.get(),
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "URLs submitted"
        );

        Ok(outcome)
    }

    /// Human-readable progress of the task
    ///
    /// Once the quota is reached and every file is terminal, the archive is
    /// finalized and the report gains a retrieval link. Later polls return the
    /// same text without finalizing again.
    ///
    /// # Errors
    ///
    /// Returns an error if finalizing the archive fails.
    pub async fn status(&self) -> Result<String> {
        let count = self.file_manager.file_count().await;
        if count == 0 {
            return Ok(NO_FILES_MESSAGE.to_string());
        }

        if count < self.quota || !self.file_manager.is_idle().await {
            return Ok(self.file_manager.status_report().await);
        }

        if self.file_manager.close().await? {
            info!(task_id = self.id.get(), link = %self.archive_link, "archive ready");
        }

        let report = self.file_manager.status_report().await;
        Ok(format!("{}\nArchive is ready: {}", report, self.archive_link))
    }

    /// Wait for in-flight downloads, then finalize the archive
    ///
    /// # Errors
    ///
    /// Returns an error if finalizing the archive fails.
    pub async fn shutdown(&self) -> Result<()> {
        self.file_manager.drain().await;
        self.file_manager.close().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("quota", &self.quota)
            .field("archive_link", &self.archive_link)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
