/// Default registry document location, used when no override is configured
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/DACCS-Climate/DACCS-node-registry/main/doc/node_registry.example.json";

/// Environment variable overriding the registry URL
pub const ENV_REGISTRY_URL: &str = "NODE_REGISTRY_URL";

/// Environment variable overriding the cache directory
pub const ENV_CACHE_DIR: &str = "NODE_REGISTRY_CACHE_DIR";

/// Directory name used under the user cache dir
pub const CACHE_DIR_NAME: &str = "node_registry_client";

/// Cached registry document, stored verbatim
pub const CACHE_FILE: &str = "registry.cached.json";

/// Cache metadata, `{ "last_cache_date": ... }`
pub const CACHE_META_FILE: &str = "cache_metadata.json";

/// Suffix appended to primary cache paths while a save is in flight
pub const BACKUP_SUFFIX: &str = ".backup";

/// Metadata keys
pub const META_LAST_CACHE_DATE: &str = "last_cache_date";
pub const META_DOCUMENT_SHA256: &str = "document_sha256";

/// Link relation names understood by the entity model.
/// Anything else is kept and reachable by name.
pub mod rel {
    pub const SERVICE: &str = "service";
    pub const COLLECTION: &str = "collection";
    pub const VERSION: &str = "version";
    pub const SERVICE_DOC: &str = "service-doc";
    pub const SERVICE_DESC: &str = "service-desc";
    pub const CONFORMANCE: &str = "conformance";
}
