//! Archive coordination
//!
//! Each task owns exactly one ZIP archive. The [`ArchiveCoordinator`] tracks
//! the status of every submitted URL, runs one download worker per URL and
//! serializes all writes into the archive stream. Tasks consume it through the
//! [`FileManager`] trait.

mod coordinator;
mod traits;

pub use coordinator::ArchiveCoordinator;
pub use traits::FileManager;
