//! Shared test helpers: in-memory fetchers and archive inspection.

use crate::archive::FileManager;
use crate::fetch::{FetchFailure, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Fetcher answering from a fixed table of responses
///
/// Unknown URLs answer with HTTP 404. When gated, every fetch waits for a
/// permit from [`ScriptedFetcher::release`] before answering, which keeps
/// downloads in flight for as long as a test needs.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchFailure>>,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hold every fetch until released
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub(crate) fn with_body(mut self, url: &str, body: &[u8]) -> Self {
        self.responses.insert(url.to_string(), Ok(body.to_vec()));
        self
    }

    pub(crate) fn with_failure(mut self, url: &str, failure: FetchFailure) -> Self {
        self.responses.insert(url.to_string(), Err(failure));
        self
    }

    /// Let `n` gated fetches complete
    pub(crate) fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchFailure::InvalidResource { status: 404 }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Poll `manager` until it reports idle, panicking after `timeout`
pub(crate) async fn wait_until_idle(manager: &dyn FileManager, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !manager.is_idle().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "file manager did not become idle within {:?}",
            timeout
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Read every entry of a finished ZIP archive as (name, bytes), ordered by name
pub(crate) fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        entries.push((entry.name().to_string(), bytes));
    }

    entries.sort();
    entries
}
