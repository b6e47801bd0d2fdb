use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use archive_dl::{HttpFetcher, Result, TaskRegistry, config::load_config, run_with_shutdown};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("ARCHIVE_DL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!(path = %config_path.display(), "Loading configuration");
    let config = Arc::new(load_config(&config_path)?);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        archive_dir = %config.archive_dir().display(),
        files_per_task = config.archive.files_per_task,
        max_busy_tasks = config.archive.max_busy_tasks,
        allowed_extensions = ?config.archive.allowed_extensions,
        "Configuration loaded"
    );

    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let registry = Arc::new(TaskRegistry::new(Arc::clone(&config), fetcher).await?);

    run_with_shutdown(registry, config).await?;

    info!("Shutdown complete");
    Ok(())
}
