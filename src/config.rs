//! Configuration types for archive-dl

use crate::error::{Error, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Environment variable prefix for configuration overrides
///
/// Nested keys are separated by a double underscore, e.g.
/// `ARCHIVE_DL_ARCHIVE__FILES_PER_TASK=5`.
pub const ENV_PREFIX: &str = "ARCHIVE_DL_";

/// Archive and task admission settings
///
/// Groups settings related to where archives are written and how much work
/// a task (and the registry as a whole) may take on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory where `Archiv<id>.zip` files are written (default: ".")
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Maximum number of files a single task accepts (default: 3)
    #[serde(default = "default_files_per_task")]
    pub files_per_task: usize,

    /// Maximum number of tasks that may be downloading at the same time (default: 3)
    ///
    /// A task counts as busy until it holds `files_per_task` files and none of
    /// them is still downloading.
    #[serde(default = "default_max_busy_tasks")]
    pub max_busy_tasks: usize,

    /// URL suffixes accepted for download, without the leading dot (default: jpeg, pdf)
    ///
    /// Matching is case-sensitive.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            files_per_task: default_files_per_task(),
            max_busy_tasks: default_max_busy_tasks(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// HTTP fetch settings for download workers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// TCP connect timeout in seconds (default: 30)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Overall request timeout in seconds (default: none, downloads run to completion)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,

    /// User-Agent header sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Main configuration for archive-dl
///
/// Fields are organized into logical sub-configs:
/// - [`archive`](ArchiveConfig): archive directory, quotas, accepted file types
/// - [`fetch`](FetchConfig): HTTP client behavior of the download workers
/// - [`server`](ServerIntegrationConfig): REST API settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Archive and admission settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Archive directory
    pub fn archive_dir(&self) -> &PathBuf {
        &self.archive.archive_dir
    }

    /// Check the configuration for values the registry cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.archive.files_per_task == 0 {
            return Err(Error::Config {
                message: "files_per_task must be at least 1".to_string(),
                key: Some("archive.files_per_task".to_string()),
            });
        }

        if self.archive.max_busy_tasks == 0 {
            return Err(Error::Config {
                message: "max_busy_tasks must be at least 1".to_string(),
                key: Some("archive.max_busy_tasks".to_string()),
            });
        }

        if self.archive.allowed_extensions.is_empty() {
            return Err(Error::Config {
                message: "at least one allowed extension is required".to_string(),
                key: Some("archive.allowed_extensions".to_string()),
            });
        }

        if let Some(bad) = self
            .archive
            .allowed_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(Error::Config {
                message: format!(
                    "invalid extension '{}': use a non-empty suffix without the leading dot",
                    bad
                ),
                key: Some("archive.allowed_extensions".to_string()),
            });
        }

        Ok(())
    }
}

/// Server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Host (and optional scheme) used when rendering archive links (default: localhost:8080)
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Enable CORS for browser access (default: false)
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            public_base_url: default_public_base_url(),
            cors_enabled: false,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Load configuration from a TOML file with environment variable overrides
///
/// A missing file is not an error: the defaults are used and environment
/// overrides still apply. The result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
    }

    let config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| Error::Config {
            message: e.to_string(),
            key: e.path.first().cloned(),
        })?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from a TOML string (no environment overrides)
pub fn load_config_from_str(toml_str: &str) -> Result<Config> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_str))
        .extract()
        .map_err(|e| Error::Config {
            message: e.to_string(),
            key: e.path.first().cloned(),
        })?;

    config.validate()?;
    Ok(config)
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_files_per_task() -> usize {
    3
}

fn default_max_busy_tasks() -> usize {
    3
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["jpeg".into(), "pdf".into()]
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("archive-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_public_base_url() -> String {
    "localhost:8080".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_service_limits() {
        let config = Config::default();

        assert_eq!(config.archive.files_per_task, 3);
        assert_eq!(config.archive.max_busy_tasks, 3);
        assert_eq!(config.archive.allowed_extensions, vec!["jpeg", "pdf"]);
        assert_eq!(config.archive_dir(), &PathBuf::from("."));
        assert_eq!(config.server.api.bind_address.port(), 8080);
        assert_eq!(config.server.api.public_base_url, "localhost:8080");
        assert!(config.fetch.timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_str_overrides_selected_fields() {
        let toml = r#"
[archive]
archive_dir = "/var/lib/archive-dl"
files_per_task = 5

[fetch]
timeout = 120

[server.api]
public_base_url = "https://files.example.com"
"#;
        let config = load_config_from_str(toml).unwrap();

        assert_eq!(config.archive.archive_dir, PathBuf::from("/var/lib/archive-dl"));
        assert_eq!(config.archive.files_per_task, 5);
        // untouched fields keep their defaults
        assert_eq!(config.archive.max_busy_tasks, 3);
        assert_eq!(config.fetch.timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.fetch.connect_timeout, Duration::from_secs(30));
        assert_eq!(
            config.server.api.public_base_url,
            "https://files.example.com"
        );
    }

    #[test]
    fn load_from_str_rejects_zero_quota() {
        let toml = r#"
[archive]
files_per_task = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("archive.files_per_task"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn load_from_str_rejects_wrong_types() {
        let toml = r#"
[archive]
max_busy_tasks = "many"
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn validate_rejects_dotted_extension() {
        let mut config = Config::default();
        config.archive.allowed_extensions = vec![".pdf".into()];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(".pdf"));
    }

    #[test]
    fn validate_rejects_empty_extension_list() {
        let mut config = Config::default();
        config.archive.allowed_extensions.clear();

        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/archive-dl.toml")).unwrap();
        assert_eq!(config.archive.files_per_task, 3);
    }

    #[test]
    fn load_config_from_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[archive]
max_busy_tasks = 7

[server.api]
bind_address = "127.0.0.1:9090"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.archive.max_busy_tasks, 7);
        assert_eq!(config.server.api.bind_address.port(), 9090);
    }
}
