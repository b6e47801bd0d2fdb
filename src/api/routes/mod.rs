//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`]: Task creation, URL submission and status
//! - [`system`]: Health and OpenAPI

mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` works
pub use system::*;
pub use tasks::*;
