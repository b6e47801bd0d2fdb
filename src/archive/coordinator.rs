//! Per-task archive coordinator
//!
//! One [`ArchiveCoordinator`] owns one ZIP stream and the status table of the
//! URLs feeding it. Both live behind a single mutex: a worker that fetched its
//! bytes takes the lock once and, while holding it, creates the entry, writes
//! the bytes and records the terminal status. Entries from different URLs can
//! therefore never interleave in the stream.

use super::traits::FileManager;
use crate::error::{Error, Result, TaskError};
use crate::fetch::{FetchFailure, Fetcher};
use crate::types::{FileStatus, TaskId};
use crate::utils::entry_name_from_url;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// State guarded by the coordinator lock
struct ArchiveState<W: Write + Seek = File> {
    /// `None` once the archive has been finalized
    writer: Option<ZipWriter<W>>,
    /// Status per submitted URL, ordered for reproducible reports
    files: BTreeMap<String, FileStatus>,
    /// Entry names already present in the archive
    entries: HashSet<String>,
}

impl<W: Write + Seek> ArchiveState<W> {
    fn new(writer: ZipWriter<W>) -> Self {
        Self {
            writer: Some(writer),
            files: BTreeMap::new(),
            entries: HashSet::new(),
        }
    }

    /// Create entry `name` and write `bytes` into it
    ///
    /// A failed write drops the partial entry, so the name stays free.
    fn write_entry(&mut self, name: &str, bytes: &[u8]) -> std::result::Result<(), String> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| "archive already finalized".to_string())?;

        if self.entries.contains(name) {
            return Err(format!("archive already contains an entry named {}", name));
        }

        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer
            .start_file(name, options)
            .map_err(|e| format!("failed to create archive entry {}: {}", name, e))?;

        if let Err(e) = writer.write_all(bytes) {
            if let Err(abort) = writer.abort_file() {
                warn!(entry = name, error = %abort, "failed to drop partial archive entry");
            }
            return Err(format!("failed to write archive entry {}: {}", name, e));
        }

        self.entries.insert(name.to_string());
        Ok(())
    }

    /// Move `url` from `Downloading` to a terminal status
    fn finish(&mut self, task_id: TaskId, url: &str, status: FileStatus) {
        match self.files.get_mut(url) {
            Some(current) if !current.is_terminal() => {
                debug!(task_id = task_id.get(), url, status = %status, "file finished");
                *current = status;
            }
            Some(current) => {
                warn!(
                    task_id = task_id.get(),
                    url,
                    current = %current,
                    ignored = %status,
                    "file already in a terminal state"
                );
            }
            None => {
                warn!(task_id = task_id.get(), url, "finished a file that was never submitted");
            }
        }
    }
}

/// Owner of one task's archive stream and file status table
pub struct ArchiveCoordinator {
    task_id: TaskId,
    quota: usize,
    state: Arc<Mutex<ArchiveState>>,
    fetcher: Arc<dyn Fetcher>,
    workers: TaskTracker,
}

impl ArchiveCoordinator {
    /// Create the archive file at `path` and a coordinator writing into it
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::ArchiveCreation`] if the file cannot be created.
    pub async fn create(
        task_id: TaskId,
        path: &Path,
        quota: usize,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let file = tokio::fs::File::create(path).await.map_err(|e| {
            Error::Task(TaskError::ArchiveCreation {
                id: task_id.get(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;

        debug!(task_id = task_id.get(), path = %path.display(), "archive created");

        Ok(Self::from_writer(
            task_id,
            ZipWriter::new(file.into_std().await),
            quota,
            fetcher,
        ))
    }

    /// Build a coordinator around an already opened ZIP writer
    pub fn from_writer(
        task_id: TaskId,
        writer: ZipWriter<File>,
        quota: usize,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            task_id,
            quota,
            state: Arc::new(Mutex::new(ArchiveState::new(writer))),
            fetcher,
            workers: TaskTracker::new(),
        }
    }

    /// Task this coordinator belongs to
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Snapshot of every tracked URL and its status, ordered by URL
    pub async fn statuses(&self) -> Vec<(String, FileStatus)> {
        let state = self.state.lock().await;
        state
            .files
            .iter()
            .map(|(url, status)| (url.clone(), status.clone()))
            .collect()
    }

    /// Number of downloads that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.workers.len()
    }
}

#[async_trait]
impl FileManager for ArchiveCoordinator {
    async fn submit(&self, url: String) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.writer.is_none() {
                return Err(TaskError::ArchiveFinalized {
                    id: self.task_id.get(),
                }
                .into());
            }
            if state.files.contains_key(&url) {
                return Err(TaskError::DuplicateUrl {
                    id: self.task_id.get(),
                    url,
                }
                .into());
            }
            state.files.insert(url.clone(), FileStatus::Downloading);
        }

        info!(task_id = self.task_id.get(), url = %url, "download queued");

        self.workers.spawn(download_worker(
            self.task_id,
            Arc::clone(&self.state),
            Arc::clone(&self.fetcher),
            url,
        ));

        Ok(())
    }

    async fn file_count(&self) -> usize {
        self.state.lock().await.files.len()
    }

    async fn status_report(&self) -> String {
        let state = self.state.lock().await;
        let mut report = String::new();
        for (url, status) in &state.files {
            report.push_str(url);
            report.push_str(": ");
            report.push_str(&status.to_string());
            report.push('\n');
        }
        report
    }

    async fn is_idle(&self) -> bool {
        let state = self.state.lock().await;
        state.files.len() >= self.quota && state.files.values().all(FileStatus::is_terminal)
    }

    async fn close(&self) -> Result<bool> {
        let state = Arc::clone(&self.state);

        let finalized = tokio::task::spawn_blocking(move || -> Result<bool> {
            let mut guard = state.blocking_lock();
            let Some(writer) = guard.writer.take() else {
                return Ok(false);
            };
            let mut file = writer.finish()?;
            file.flush()?;
            Ok(true)
        })
        .await
        .map_err(|e| Error::Other(format!("archive finalization aborted: {}", e)))??;

        if finalized {
            info!(task_id = self.task_id.get(), "archive finalized");
        } else {
            debug!(task_id = self.task_id.get(), "archive already finalized");
        }

        Ok(finalized)
    }

    async fn is_closed(&self) -> bool {
        self.state.lock().await.writer.is_none()
    }

    async fn drain(&self) {
        self.workers.close();
        self.workers.wait().await;
    }
}

/// Fetch one URL and record its outcome
async fn download_worker(
    task_id: TaskId,
    state: Arc<Mutex<ArchiveState>>,
    fetcher: Arc<dyn Fetcher>,
    url: String,
) {
    debug!(task_id = task_id.get(), url = %url, fetcher = fetcher.name(), "download started");

    let status = match fetcher.fetch(&url).await {
        Ok(bytes) => match write_entry(task_id, Arc::clone(&state), url.clone(), bytes).await {
            Ok(()) => return,
            Err(e) => FileStatus::Error(e),
        },
        Err(FetchFailure::InvalidResource { status }) => {
            warn!(task_id = task_id.get(), url = %url, status, "invalid resource");
            FileStatus::InvalidResource
        }
        Err(FetchFailure::Transport(message)) => {
            warn!(task_id = task_id.get(), url = %url, error = %message, "download failed");
            FileStatus::Error(message)
        }
    };

    state.lock().await.finish(task_id, &url, status);
}

/// Write the fetched bytes and the resulting status under one lock acquisition
///
/// The ZIP writer does blocking file I/O, so the critical section runs on the
/// blocking pool. An `Err` means the blocking task itself did not complete and
/// the status still has to be recorded by the caller.
async fn write_entry(
    task_id: TaskId,
    state: Arc<Mutex<ArchiveState>>,
    url: String,
    bytes: Vec<u8>,
) -> std::result::Result<(), String> {
    let entry_name = entry_name_from_url(&url);

    tokio::task::spawn_blocking(move || {
        let mut guard = state.blocking_lock();
        let status = match guard.write_entry(&entry_name, &bytes) {
            Ok(()) => {
                info!(
                    task_id = task_id.get(),
                    url = %url,
                    entry = %entry_name,
                    bytes = bytes.len(),
                    "file added to archive"
                );
                FileStatus::Downloaded
            }
            Err(message) => {
                warn!(task_id = task_id.get(), url = %url, error = %message, "archive write failed");
                FileStatus::Error(message)
            }
        };
        guard.finish(task_id, &url, status);
    })
    .await
    .map_err(|e| format!("archive write aborted: {}", e))
}
