use std::path::{Path, PathBuf};
use serde::Deserialize;
use shared::protocol::{
    CACHE_DIR_NAME, CACHE_FILE, CACHE_META_FILE, DEFAULT_REGISTRY_URL, ENV_CACHE_DIR,
    ENV_REGISTRY_URL,
};
use url::Url;
use crate::error::{RegistryError, Result};

/// Everything a client instance needs to know about where the registry
/// lives and where to cache it. Instances are independent of each other.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Use the cached registry when the live one cannot be fetched
    #[serde(default = "default_fallback")]
    pub fallback: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join(CACHE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{CACHE_DIR_NAME}")))
}

fn default_fallback() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            cache_dir: default_cache_dir(),
            fallback: default_fallback(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Defaults with any environment overrides applied
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| RegistryError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unset or empty values
    /// leave the current setting alone.
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_REGISTRY_URL) {
            self.registry_url = url;
        }
        if let Some(dir) = non_empty(ENV_CACHE_DIR) {
            self.cache_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    pub fn cache_meta_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_META_FILE)
    }

    /// The registry URL, checked to be an absolute http(s) URL
    pub fn parsed_registry_url(&self) -> Result<Url> {
        let url = Url::parse(&self.registry_url).map_err(|e| RegistryError::InvalidUrl {
            url: self.registry_url.clone(),
            detail: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(RegistryError::InvalidUrl {
                url: self.registry_url.clone(),
                detail: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}
