//! Remote file fetching
//!
//! Download workers fetch through the [`Fetcher`] trait. [`HttpFetcher`] is the
//! production implementation; tests substitute in-memory fetchers.

mod http;
mod traits;

pub use http::HttpFetcher;
pub use traits::{FetchFailure, Fetcher};
