//! Error types for registry acquisition and lookup.

use std::path::PathBuf;

/// Boxed cause carried by network failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classified outcome of a failed registry fetch.
///
/// `Network` and `Status` are transient. `MalformedPayload` means the server
/// answered 2xx with a body that is not a registry document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to reach registry at {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("registry at {url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("registry at {url} returned a malformed document: {detail}")]
    MalformedPayload { url: String, detail: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::MalformedPayload { url, .. } => url,
        }
    }

    /// Connection, timeout and non-2xx failures.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. } | FetchError::Status { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedPayload { .. })
    }

    /// Whether the cache may stand in for the live registry after this
    /// failure. Unreachable, erroring and garbled sources all qualify.
    pub fn is_fallback_eligible(&self) -> bool {
        match self {
            FetchError::Network { .. }
            | FetchError::Status { .. }
            | FetchError::MalformedPayload { .. } => true,
        }
    }
}

/// Errors that can occur while acquiring or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid registry URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("node '{node}' is missing or has an invalid '{field}': {detail}")]
    MalformedNode {
        node: String,
        field: String,
        detail: String,
    },

    #[error("service '{service}' on node '{node}' is missing or has an invalid '{field}': {detail}")]
    MalformedService {
        node: String,
        service: String,
        field: String,
        detail: String,
    },

    #[error("no cached registry at {path}")]
    CacheNotFound { path: PathBuf },

    #[error("cached registry at {path} is corrupt: {detail}")]
    CacheCorrupt { path: PathBuf, detail: String },

    #[error("failed to read cache file {path}: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The live registry failed and so did the cache fallback.
    #[error("no usable registry: {live}; cache unusable: {cache}")]
    NoUsableRegistry {
        #[source]
        live: Box<RegistryError>,
        cache: Box<RegistryError>,
    },

    #[error("no node named '{node}' in the registry")]
    UnknownNode { node: String },

    #[error("service '{service}' is not available on node '{node}'")]
    ServiceNotAvailable { node: String, service: String },

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl RegistryError {
    /// True for either flavour of missing/invalid registry field.
    pub fn is_malformed_registry(&self) -> bool {
        matches!(
            self,
            RegistryError::MalformedNode { .. } | RegistryError::MalformedService { .. }
        )
    }

    /// Fallback was attempted but nothing had ever been cached.
    pub fn never_cached(&self) -> bool {
        matches!(
            self,
            RegistryError::NoUsableRegistry { cache, .. }
                if matches!(**cache, RegistryError::CacheNotFound { .. })
        )
    }

    /// Fallback was attempted but the cached record could not be used.
    pub fn cache_corrupt(&self) -> bool {
        matches!(self, RegistryError::NoUsableRegistry { .. }) && !self.never_cached()
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
