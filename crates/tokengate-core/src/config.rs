//! Client configuration.
//!
//! `AuthConfig` is a plain value handed to `AuthClient` and `RouteGuard` at
//! construction. Nothing in the library looks up ambient configuration on
//! its own; callers that want a config file use `AuthConfig::load`, which
//! reads `~/.config/tokengate/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "tokengate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend address used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Storage key the session token is persisted under
pub const DEFAULT_STORAGE_KEY: &str = "auth_token";

/// Route unauthenticated navigation is redirected to
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub api_base: String,
    pub storage_key: String,
    pub login_route: String,
    pub protected_prefixes: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            protected_prefixes: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AuthConfig {
    /// Config pointing at the given backend, defaults elsewhere
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.set_api_base(api_base);
        config
    }

    pub fn set_api_base(&mut self, api_base: impl Into<String>) {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
    }

    /// Build a full endpoint URL from a path like `/auth/login`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// Load from the default config location, falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        let base = std::mem::take(&mut config.api_base);
        config.set_api_base(base);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory used by file-backed token storage
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
