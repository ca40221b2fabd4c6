use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer};
use std::net::SocketAddr;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use super::rates::ApiKey;

pub const DEFAULT_PROVIDER_URL: &str = "https://v6.exchangerate-api.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

pub const ENV_API_KEY: &str = "EXCHANGE_RATE_API_KEY";
pub const ENV_PORT: &str = "PORT";
pub const ENV_CORS_ORIGINS: &str = "RATE_PROXY_CORS_ORIGINS";
pub const ENV_PROVIDER_URL: &str = "RATE_PROXY_PROVIDER_URL";
pub const ENV_TIMEOUT_SECS: &str = "RATE_PROXY_TIMEOUT_SECS";

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_provider_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Process-wide settings, read once at startup and never mutated afterwards.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Usually supplied through `EXCHANGE_RATE_API_KEY` rather than the file.
    #[serde(default, deserialize_with = "deserialize_api_key")]
    pub api_key: Option<ApiKey>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            listen_addr: default_listen_addr(),
            provider: ProviderConfig::default(),
            cors_origins: default_cors_origins(),
            api_key: None,
        }
    }
}

fn default_provider_url() -> String {
    DEFAULT_PROVIDER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<Option<ApiKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(ApiKey::new))
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file exists there, then applies environment overrides.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!(path = %config_path.display(), "No config file found, using defaults");
            Self::default()
        };
        config.with_process_env()
    }

    /// Loads the config from `path`, then applies environment overrides.
    pub fn load_with_env<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::load_from_path(path)?.with_process_env()
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "rateproxy", "rate-proxy")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn with_process_env(self) -> Result<Self> {
        // A missing .env file is the normal case in production
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded environment file");
        }
        self.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_API_KEY) {
            self.api_key = ApiKey::new(raw);
        }

        if let Some(raw) = lookup(ENV_PORT) {
            let port: u16 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_PORT}: {raw}"))?;
            self.listen_addr.set_port(port);
        }

        if let Some(raw) = lookup(ENV_CORS_ORIGINS) {
            self.cors_origins = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(raw) = lookup(ENV_PROVIDER_URL) {
            self.provider.base_url = raw.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.provider.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_TIMEOUT_SECS}: {raw}"))?;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.provider.timeout_secs == 0 {
            bail!("Provider timeout must be at least one second");
        }
        if self.provider.base_url.is_empty() {
            bail!("Provider base_url must not be empty");
        }
        Ok(())
    }
}
