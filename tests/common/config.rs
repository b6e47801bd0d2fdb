//! Test configuration helpers for building registries backed by real HTTP

use archive_dl::{Config, HttpFetcher, TaskRegistry};
use std::sync::Arc;
use tempfile::TempDir;

/// Base URL that status links are built from in tests
pub const TEST_PUBLIC_BASE_URL: &str = "http://archives.test";

/// Default configuration writing archives into `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.archive.archive_dir = dir.path().to_path_buf();
    config.server.api.public_base_url = TEST_PUBLIC_BASE_URL.to_string();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    config
}

/// Registry using the real reqwest fetcher, archives in a fresh temp directory
pub async fn create_test_registry() -> (Arc<TaskRegistry>, Arc<Config>, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(&temp_dir));
    let registry = registry_for(config.clone()).await;
    (registry, config, temp_dir)
}

/// Registry for an already prepared configuration
pub async fn registry_for(config: Arc<Config>) -> Arc<TaskRegistry> {
    let fetcher = Arc::new(HttpFetcher::new(&config.fetch).unwrap());
    Arc::new(TaskRegistry::new(config, fetcher).await.unwrap())
}
