//! # archive-dl
//!
//! HTTP service that downloads small batches of files and packages each
//! batch into a ZIP archive.
//!
//! A client creates a task, submits up to `files_per_task` URLs to it and
//! polls its status. Every URL is fetched concurrently and written into the
//! task's archive (`Archiv<id>.zip`) as soon as its body arrives. Once every
//! file of a full task has finished, the archive is finalized and the status
//! report carries a link to it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use archive_dl::{Config, HttpFetcher, TaskRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
//!     let registry = Arc::new(TaskRegistry::new(config.clone(), fetcher).await?);
//!
//!     let task = registry.create_task().await?;
//!     task.accept_urls(vec!["https://example.com/report.pdf".to_string()])
//!         .await?;
//!     println!("{}", task.status().await?);
//!
//!     // Serves until SIGTERM/SIGINT, then finalizes every archive
//!     archive_dl::run_with_shutdown(registry, config).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Per-task archive ownership and download workers
pub mod archive;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Fetching remote files
pub mod fetch;
/// Task registry and admission control
pub mod registry;
/// Tasks and their quota
pub mod task;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use archive::{ArchiveCoordinator, FileManager};
pub use config::{ApiConfig, ArchiveConfig, Config, FetchConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, TaskError, ToHttpStatus};
pub use fetch::{FetchFailure, Fetcher, HttpFetcher};
pub use registry::TaskRegistry;
pub use task::Task;
pub use types::{FileStatus, RejectedUrl, SubmitOutcome, SubmitUrlsRequest, TaskCreated, TaskId};

use std::sync::Arc;

/// Serve the API until a termination signal arrives, then shut the registry down.
///
/// After the server has stopped, every in-flight download is awaited and
/// every archive is finalized, so no `Archiv<id>.zip` is left without its
/// central directory.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
/// The registry is shut down in either case.
pub async fn run_with_shutdown(registry: Arc<TaskRegistry>, config: Arc<Config>) -> Result<()> {
    let served = api::start_api_server(registry.clone(), config, wait_for_signal()).await;
    registry.shutdown().await;
    served
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
