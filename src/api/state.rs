//! Application state for the API server

use crate::{Config, TaskRegistry};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Registry owning every task
    pub registry: Arc<TaskRegistry>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(registry: Arc<TaskRegistry>, config: Arc<Config>) -> Self {
        Self { registry, config }
    }
}
