//! Application configuration for the Nuru widget.
//!
//! User config lives at `~/.nuru/nuru.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NuruError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nuru.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nuru";

// ---------------------------------------------------------------------------
// Config structs (matching nuru.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Hand-off context sources, in probe priority order.
    #[serde(default)]
    pub handoff: HandoffConfig,

    /// Persisted widget state.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat backend (serves `/api/chat` and `/api/health`).
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Upper bound on a single chat round trip, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:5000".into()
}
fn default_request_timeout() -> u64 {
    30
}

/// `[handoff]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Upper bound on a single session probe, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Upstream tools probed for a hand-off session. First entry wins ties.
    #[serde(default = "default_sources")]
    pub sources: Vec<HandoffSourceConfig>,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            sources: default_sources(),
        }
    }
}

fn default_probe_timeout() -> u64 {
    10
}

/// Most recent tool first, oldest last.
fn default_sources() -> Vec<HandoffSourceConfig> {
    vec![
        HandoffSourceConfig {
            name: "roi-projector".into(),
            base_url: "http://localhost:5003".into(),
        },
        HandoffSourceConfig {
            name: "readiness-scanner".into(),
            base_url: "http://localhost:5002".into(),
        },
        HandoffSourceConfig {
            name: "intelligence-audit".into(),
            base_url: "http://localhost:5001".into(),
        },
    ]
}

/// `[[handoff.sources]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffSourceConfig {
    /// Short tool name used in logs.
    pub name: String,
    /// Base URL; probes hit `{base_url}/api/session/{id}`.
    pub base_url: String,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the session database. A leading `~` expands to the home dir.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "~/.nuru/widget.db".into()
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime chat transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl From<&AppConfig> for TransportConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.backend.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.backend.request_timeout_secs),
        }
    }
}

/// Runtime context resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Sources in probe priority order.
    pub sources: Vec<HandoffSourceConfig>,
    /// Per-probe timeout.
    pub timeout: Duration,
}

impl From<&AppConfig> for ResolverConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            sources: config.handoff.sources.clone(),
            timeout: Duration::from_secs(config.handoff.probe_timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nuru/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| NuruError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nuru/nuru.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NuruError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| NuruError::config(format!("failed to parse {}: {e}", path.display())))?;

    validate(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NuruError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| NuruError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NuruError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Reject configs whose URLs cannot be used.
fn validate(config: &AppConfig) -> Result<()> {
    url::Url::parse(&config.backend.base_url).map_err(|e| {
        NuruError::config(format!(
            "backend.base_url '{}' is not a valid URL: {e}",
            config.backend.base_url
        ))
    })?;

    for source in &config.handoff.sources {
        url::Url::parse(&source.base_url).map_err(|e| {
            NuruError::config(format!(
                "handoff source '{}' has an invalid base_url '{}': {e}",
                source.name, source.base_url
            ))
        })?;
    }

    Ok(())
}
