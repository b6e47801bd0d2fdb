//! The file manager capability consumed by tasks

use crate::error::Result;
use async_trait::async_trait;

/// Capability set a [`Task`](crate::task::Task) needs from its archive owner
///
/// [`ArchiveCoordinator`](super::ArchiveCoordinator) is the production
/// implementation. Tasks and the registry only talk to this trait, so tests
/// can drive readiness and admission logic with a scripted implementation.
#[async_trait]
pub trait FileManager: Send + Sync {
    /// Start tracking `url` as `Downloading` and fetch it in the background
    ///
    /// Returns once the status is registered; the fetch itself runs as a
    /// tracked unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is already tracked or the archive has been
    /// finalized.
    async fn submit(&self, url: String) -> Result<()>;

    /// Number of URLs ever submitted, including in-flight and failed ones
    async fn file_count(&self) -> usize;

    /// One `"<url>: <status>"` line per tracked URL, ordered by URL
    async fn status_report(&self) -> String;

    /// Quota reached and no URL still downloading
    async fn is_idle(&self) -> bool;

    /// Finalize the archive
    ///
    /// Returns `Ok(true)` for the call that finalized the archive and
    /// `Ok(false)` for every later call.
    async fn close(&self) -> Result<bool>;

    /// Whether [`close`](Self::close) has finalized the archive
    async fn is_closed(&self) -> bool;

    /// Wait for every in-flight download to reach a terminal status
    async fn drain(&self);
}
