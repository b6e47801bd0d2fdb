//! Custom test assertions for integration tests

use archive_dl::Task;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Result of waiting for a task to become ready
#[derive(Debug)]
pub enum WaitResult {
    /// Status carried the archive link; holds the full status text
    Ready(String),
    /// Timeout waiting; holds the last status text seen
    Timeout(String),
}

/// Poll `task.status()` until the archive link appears
pub async fn wait_for_ready(task: &Task, timeout: Duration) -> WaitResult {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let status = task.status().await.unwrap();
        if status.contains("Archive is ready") {
            return WaitResult::Ready(status);
        }
        if tokio::time::Instant::now() >= deadline {
            return WaitResult::Timeout(status);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Unwrap a ready status or fail with the last status seen
pub fn expect_ready(result: WaitResult) -> String {
    match result {
        WaitResult::Ready(status) => status,
        WaitResult::Timeout(status) => panic!("task never became ready, last status:\n{status}"),
    }
}

/// Every entry of a finished archive as (name, bytes), ordered by name
pub fn archive_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        entries.push((entry.name().to_string(), bytes));
    }

    entries.sort();
    entries
}
