//! Remote Configuration
//!
//! Where the hosted backend lives. Read from `remote_config.json` in the
//! app data directory, falling back to `SUPABASE_URL` / `SUPABASE_ANON_KEY`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

pub const CONFIG_FILE_NAME: &str = "remote_config.json";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// Project URL + public (anon) key
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl RemoteConfig {
    pub fn new(url: &str, anon_key: &str) -> DomainResult<Self> {
        let config = Self {
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(DomainError::Config(format!(
                "URL must start with http:// or https://, got `{}`",
                self.url
            )));
        }
        if self.url.len() <= "https://".len() {
            return Err(DomainError::Config("URL has no host".to_string()));
        }
        if self.anon_key.is_empty() {
            return Err(DomainError::Config("anon key is empty".to_string()));
        }
        Ok(())
    }

    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.url, path)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    pub fn realtime_url(&self) -> String {
        let socket_base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            socket_base, self.anon_key
        )
    }

    /// Host only, for display
    pub fn masked_url(&self) -> String {
        let without_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        without_scheme
            .split('/')
            .next()
            .unwrap_or(without_scheme)
            .to_string()
    }
}

/// Which source produced the active config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    File,
    Environment,
    None,
}

/// Reported to the frontend for the "not configured" banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigStatus {
    pub source: ConfigSource,
    pub host: Option<String>,
    pub error: Option<String>,
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

/// Resolve the active config. File wins over environment.
pub fn load_config(data_dir: &Path) -> (DomainResult<Option<RemoteConfig>>, ConfigSource) {
    let path = config_path(data_dir);
    if path.exists() {
        return (read_config_file(&path).map(Some), ConfigSource::File);
    }

    match from_env_values(env_var_trimmed("SUPABASE_URL"), env_var_trimmed("SUPABASE_ANON_KEY")) {
        Some(result) => (result.map(Some), ConfigSource::Environment),
        None => (Ok(None), ConfigSource::None),
    }
}

fn read_config_file(path: &Path) -> DomainResult<RemoteConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DomainError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let config: RemoteConfig = serde_json::from_str(&raw)
        .map_err(|e| DomainError::Config(format!("malformed {}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Validate and persist a config
pub fn save_config(data_dir: &Path, config: &RemoteConfig) -> DomainResult<()> {
    config.validate()?;
    std::fs::create_dir_all(data_dir).map_err(|e| DomainError::Config(e.to_string()))?;
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    std::fs::write(config_path(data_dir), json).map_err(|e| DomainError::Config(e.to_string()))
}

fn from_env_values(
    url: Option<String>,
    anon_key: Option<String>,
) -> Option<DomainResult<RemoteConfig>> {
    match (url, anon_key) {
        (None, None) => None,
        (Some(url), Some(key)) => Some(RemoteConfig::new(&url, &key)),
        (Some(_), None) => Some(Err(DomainError::Config("SUPABASE_ANON_KEY is not set".to_string()))),
        (None, Some(_)) => Some(Err(DomainError::Config("SUPABASE_URL is not set".to_string()))),
    }
}

fn env_var_trimmed(name: &str) -> Option<String> {
    let value = std::env::var(name).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
