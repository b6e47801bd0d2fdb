//! Registry of all tasks created during the process lifetime

use crate::config::Config;
use crate::error::{Error, Result, TaskError};
use crate::fetch::Fetcher;
use crate::task::Task;
use crate::types::TaskId;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

struct RegistryInner {
    tasks: HashMap<TaskId, Arc<Task>>,
    /// Last id handed out; ids start at 1 and are never reused
    last_id: u64,
}

/// Owns every task and gates the creation of new ones
///
/// A new task is only admitted while fewer than `max_busy_tasks` tasks are
/// still busy (not idle). Tasks are never removed.
pub struct TaskRegistry {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    inner: Mutex<RegistryInner>,
    accepting_new: AtomicBool,
}

impl TaskRegistry {
    /// Create a registry, making sure the archive directory exists
    ///
    /// # Errors
    ///
    /// Returns an error if the archive directory cannot be created.
    pub async fn new(config: Arc<Config>, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        tokio::fs::create_dir_all(config.archive_dir()).await?;

        info!(
            archive_dir = %config.archive_dir().display(),
            files_per_task = config.archive.files_per_task,
            max_busy_tasks = config.archive.max_busy_tasks,
            fetcher = fetcher.name(),
            "task registry ready"
        );

        Ok(Self {
            config,
            fetcher,
            inner: Mutex::new(RegistryInner {
                tasks: HashMap::new(),
                last_id: 0,
            }),
            accepting_new: AtomicBool::new(true),
        })
    }

    /// Create and register a new task with its own archive
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has started
    /// - [`TaskError::ServerBusy`] when too many tasks are still downloading
    /// - [`TaskError::ArchiveCreation`] when the archive file cannot be
    ///   created; the drawn id is not handed out again
    pub async fn create_task(&self) -> Result<Arc<Task>> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let mut inner = self.inner.lock().await;

        let busy = count_busy(inner.tasks.values()).await;
        let limit = self.config.archive.max_busy_tasks;
        if busy >= limit {
            warn!(busy, limit, "task creation refused, server busy");
            return Err(TaskError::ServerBusy { busy, limit }.into());
        }

        inner.last_id += 1;
        let id = TaskId(inner.last_id);

        let task = match Task::create(id, &self.config, Arc::clone(&self.fetcher)).await {
            Ok(task) => Arc::new(task),
            Err(e) => {
                error!(task_id = id.get(), error = %e, "task creation failed");
                return Err(e);
            }
        };

        inner.tasks.insert(id, Arc::clone(&task));
        info!(task_id = id.get(), archive = %task.archive_file_name(), "task created");

        Ok(task)
    }

    /// Look up a task by id
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] for an unknown id.
    pub async fn get_task(&self, id: TaskId) -> Result<Arc<Task>> {
        self.inner
            .lock()
            .await
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound { id: id.get() }.into())
    }

    /// Number of tasks that are not idle yet
    pub async fn busy_count(&self) -> usize {
        let inner = self.inner.lock().await;
        count_busy(inner.tasks.values()).await
    }

    /// Number of tasks ever created
    pub async fn task_count(&self) -> usize {
        self.inner.lock().await.tasks.len()
    }

    /// Whether new tasks are still admitted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Stop admitting tasks, wait for every download and finalize every archive
    ///
    /// Archives that fail to finalize are logged and do not stop the others.
    pub async fn shutdown(&self) {
        self.accepting_new.store(false, Ordering::SeqCst);

        let tasks: Vec<Arc<Task>> = self.inner.lock().await.tasks.values().cloned().collect();
        info!(tasks = tasks.len(), "shutting down task registry");

        let results = join_all(tasks.iter().map(|task| task.shutdown())).await;
        for (task, result) in tasks.iter().zip(results) {
            if let Err(e) = result {
                error!(task_id = task.id().get(), error = %e, "failed to finalize archive");
            }
        }

        info!("task registry shut down");
    }
}

async fn count_busy<'a>(tasks: impl Iterator<Item = &'a Arc<Task>>) -> usize {
    join_all(tasks.map(|task| task.is_idle()))
        .await
        .into_iter()
        .filter(|idle| !idle)
        .count()
}
