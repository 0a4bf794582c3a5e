//! Configuration types for archive-service

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for [`ArchiveService`](crate::ArchiveService)
///
/// Every field has a default, so `Config::default()` is a working setup that
/// stores archives under `./storage` and serves the API on `127.0.0.1:8080`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Where archives and scratch files live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Bound on simultaneously active tasks
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Probe and download limits for source URLs
    #[serde(default)]
    pub fetch: FetchConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Storage root
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage.storage_dir
    }

    /// Directory holding per-task scratch directories
    pub fn scratch_root(&self) -> PathBuf {
        self.storage.storage_dir.join("tmp")
    }

    /// Check limits that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.admission.max_active_tasks == 0 {
            return Err(config_error(
                "max_active_tasks must be at least 1",
                "max_active_tasks",
            ));
        }
        if self.fetch.probe_bytes == 0 {
            return Err(config_error("probe_bytes must be at least 1", "probe_bytes"));
        }
        if self.fetch.probe_timeout.is_zero() {
            return Err(config_error(
                "probe_timeout must be at least one second",
                "probe_timeout",
            ));
        }
        if self.fetch.download_timeout.is_zero() {
            return Err(config_error(
                "download_timeout must be at least one second",
                "download_timeout",
            ));
        }
        if self.fetch.max_download_bytes == 0 {
            return Err(config_error(
                "max_download_bytes must be at least 1",
                "max_download_bytes",
            ));
        }
        Ok(())
    }

    /// Build a [`Config`] from `ARCHIVE_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a [`Config`] from an arbitrary key lookup.
    ///
    /// Values that fail to parse keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup("ARCHIVE_STORAGE_DIR") {
            config.storage.storage_dir = PathBuf::from(dir);
        }
        config.admission.max_active_tasks = parse_or(
            &lookup,
            "ARCHIVE_MAX_ACTIVE_TASKS",
            config.admission.max_active_tasks,
        );
        config.server.api.bind_address =
            parse_or(&lookup, "ARCHIVE_BIND", config.server.api.bind_address);
        config.server.api.swagger_ui =
            parse_or(&lookup, "ARCHIVE_SWAGGER_UI", config.server.api.swagger_ui);
        config.fetch.probe_timeout = Duration::from_secs(parse_or(
            &lookup,
            "ARCHIVE_PROBE_TIMEOUT_SECS",
            config.fetch.probe_timeout.as_secs(),
        ));
        config.fetch.download_timeout = Duration::from_secs(parse_or(
            &lookup,
            "ARCHIVE_DOWNLOAD_TIMEOUT_SECS",
            config.fetch.download_timeout.as_secs(),
        ));
        config.fetch.max_download_bytes = parse_or(
            &lookup,
            "ARCHIVE_MAX_DOWNLOAD_BYTES",
            config.fetch.max_download_bytes,
        );

        config
    }
}

/// Storage locations
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Storage root (default: "./storage"); archives land at `{root}/{task_id}.zip`
    #[serde(default = "default_storage_dir")]
    #[schema(value_type = String)]
    pub storage_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
        }
    }
}

/// Admission control settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AdmissionConfig {
    /// Maximum number of tasks that may be non-terminal at once (default: 3)
    #[serde(default = "default_max_active_tasks")]
    pub max_active_tasks: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_active_tasks: default_max_active_tasks(),
        }
    }
}

/// Limits applied when talking to source servers
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Time bound for the content-type probe (default: 10 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub probe_timeout: Duration,

    /// How many leading bytes the probe reads (default: 512)
    #[serde(default = "default_probe_bytes")]
    pub probe_bytes: usize,

    /// Time bound for each full download in the pipeline (default: 300 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub download_timeout: Duration,

    /// Size bound for each downloaded file (default: 100 MiB)
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,

    /// User-Agent header sent to source servers
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            probe_timeout: default_probe_timeout(),
            probe_bytes: default_probe_bytes(),
            download_timeout: default_download_timeout(),
            max_download_bytes: default_max_download_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
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
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparsable configuration value");
                default
            }
        },
        None => default,
    }
}

// Default value functions
fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_max_active_tasks() -> usize {
    3
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_probe_bytes() -> usize {
    512
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_max_download_bytes() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

fn default_user_agent() -> String {
    concat!("archive-service/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
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

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.storage_dir(), &PathBuf::from("storage"));
        assert_eq!(config.scratch_root(), PathBuf::from("storage").join("tmp"));
        assert_eq!(config.admission.max_active_tasks, 3);
        assert_eq!(config.fetch.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.probe_bytes, 512);
        assert_eq!(
            config.server.api.bind_address,
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");
        assert_eq!(config.admission.max_active_tasks, 3);
        assert_eq!(config.fetch.download_timeout, Duration::from_secs(300));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["fetch"]["probe_timeout"], 10);
        assert_eq!(json["fetch"]["download_timeout"], 300);
    }

    #[test]
    fn validate_rejects_zero_admission_limit() {
        let mut config = Config::default();
        config.admission.max_active_tasks = 0;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("max_active_tasks")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_zero_download_timeout() {
        let mut config = Config::default();
        config.fetch.download_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("ARCHIVE_STORAGE_DIR", "/var/lib/archives"),
            ("ARCHIVE_MAX_ACTIVE_TASKS", "7"),
            ("ARCHIVE_BIND", "0.0.0.0:9000"),
            ("ARCHIVE_DOWNLOAD_TIMEOUT_SECS", "45"),
            ("ARCHIVE_SWAGGER_UI", "false"),
        ]));

        assert_eq!(config.storage_dir(), &PathBuf::from("/var/lib/archives"));
        assert_eq!(config.admission.max_active_tasks, 7);
        assert_eq!(config.server.api.bind_address.port(), 9000);
        assert_eq!(config.fetch.download_timeout, Duration::from_secs(45));
        assert!(!config.server.api.swagger_ui);
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("ARCHIVE_MAX_ACTIVE_TASKS", "lots"),
            ("ARCHIVE_BIND", "not-an-address"),
        ]));

        assert_eq!(config.admission.max_active_tasks, 3);
        assert_eq!(config.server.api.bind_address.port(), 8080);
    }
}
