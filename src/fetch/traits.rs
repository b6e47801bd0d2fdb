//! Traits and types for fetching remote files

use async_trait::async_trait;

/// Why a fetch did not produce a usable body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered, but not with 200 OK
    InvalidResource {
        /// HTTP status code returned by the server
        status: u16,
    },
    /// Connecting, sending or reading the body failed
    Transport(String),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::InvalidResource { status } => {
                write!(f, "invalid resource (HTTP {})", status)
            }
            FetchFailure::Transport(message) => write!(f, "{}", message),
        }
    }
}

/// Trait for retrieving the bytes behind a URL
///
/// Download workers only depend on this trait, so tests can swap in an
/// in-memory implementation and never touch the network.
///
/// # Examples
///
/// ```no_run
/// use archive_dl::fetch::{Fetcher, HttpFetcher};
/// use archive_dl::config::FetchConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new(&FetchConfig::default())?;
/// match fetcher.fetch("https://example.com/report.pdf").await {
///     Ok(bytes) => println!("got {} bytes", bytes.len()),
///     Err(failure) => println!("fetch failed: {}", failure),
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full body of `url`
    ///
    /// # Errors
    ///
    /// Returns [`FetchFailure::InvalidResource`] for any non-200 response and
    /// [`FetchFailure::Transport`] when the request or body read fails.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchFailure>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
