use std::time::Duration;
use url::Url;
use crate::acquire::{acquire, Acquisition, RegistryOrigin};
use crate::cache::{CacheStore, FileCache};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::fetch::{HttpFetcher, RegistrySource};
use crate::model::{Node, Registry};

/// Read-only client over the node registry.
///
/// Construction performs one acquisition cycle; the resulting entity graph
/// is immutable until [`RegistryClient::refresh`] replaces it wholesale.
pub struct RegistryClient {
    config: ClientConfig,
    url: Url,
    source: Box<dyn RegistrySource + Send + Sync>,
    cache: Box<dyn CacheStore + Send + Sync>,
    registry: Registry,
    origin: RegistryOrigin,
}

impl RegistryClient {
    /// HTTP source and file cache as described by `config`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let source = HttpFetcher::new(Duration::from_secs(config.timeout_secs))?;
        let cache = FileCache::new(config.cache_path(), config.cache_meta_path());
        Self::with_parts(config, source, cache)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn with_parts<S, C>(config: ClientConfig, source: S, cache: C) -> Result<Self>
    where
        S: RegistrySource + Send + Sync + 'static,
        C: CacheStore + Send + Sync + 'static,
    {
        let url = config.parsed_registry_url()?;
        let Acquisition { registry, origin } = acquire(&source, &cache, &url, config.fallback)?;

        Ok(Self {
            config,
            url,
            source: Box::new(source),
            cache: Box::new(cache),
            registry,
            origin,
        })
    }

    /// Run another acquisition cycle. On failure the current registry is kept.
    pub fn refresh(&mut self) -> Result<RegistryOrigin> {
        let Acquisition { registry, origin } = acquire(
            self.source.as_ref(),
            self.cache.as_ref(),
            &self.url,
            self.config.fallback,
        )?;
        self.registry = registry;
        self.origin = origin;
        Ok(origin)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn origin(&self) -> RegistryOrigin {
        self.origin
    }

    pub fn using_cache(&self) -> bool {
        matches!(self.origin, RegistryOrigin::Cache { .. })
    }

    pub fn node(&self, id: &str) -> Result<&Node> {
        self.registry.node(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.registry.contains_node(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.registry.nodes()
    }
}
