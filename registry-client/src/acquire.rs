//! One acquisition cycle: fetch the live registry, or fall back to the cache.
//!
//! ```text
//! Fetching ──ok──────────────────────────▶ UsingLive   (cache refreshed, best effort)
//!    │
//!    └─err──▶ fallback? ──no──────────────▶ Failed      (fetch error re-raised)
//!                 │
//!                 └─yes──▶ cache.load() ──▶ UsingCache  (age surfaced)
//!                                 │
//!                                 └─err──▶ Failed      (NoUsableRegistry)
//! ```
//!
//! There is no retry loop: one cycle is one fetch plus at most one cache read.

use url::Url;
use crate::cache::{CacheAge, CacheStore};
use crate::error::{RegistryError, Result};
use crate::fetch::RegistrySource;
use crate::model::Registry;

/// Which source the current registry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOrigin {
    Live,
    Cache { age: CacheAge },
}

/// Outcome of a successful acquisition cycle.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub registry: Registry,
    pub origin: RegistryOrigin,
}

/// Run one acquisition cycle against `url`.
///
/// A live document that fails to parse is treated like a malformed payload:
/// it is never cached, and with `fallback` the cache is consulted instead.
pub fn acquire<S, C>(source: &S, cache: &C, url: &Url, fallback: bool) -> Result<Acquisition>
where
    S: RegistrySource + ?Sized,
    C: CacheStore + ?Sized,
{
    let live_error = match source.fetch(url) {
        Ok(raw) => match Registry::from_document(raw.document().clone()) {
            Ok(registry) => {
                if let Err(e) = cache.save(&raw) {
                    tracing::warn!("Failed to cache registry from {}: {}", url, e);
                }
                tracing::info!("Registry loaded from {} ({} nodes)", url, registry.len());
                return Ok(Acquisition {
                    registry,
                    origin: RegistryOrigin::Live,
                });
            }
            Err(e) => e,
        },
        Err(e) if !e.is_fallback_eligible() => return Err(e.into()),
        Err(e) => RegistryError::from(e),
    };

    if !fallback {
        return Err(live_error);
    }

    tracing::warn!(
        "Cannot use registry from {}: {}. Falling back to cached version",
        url,
        live_error
    );

    let unusable = |cache_error: RegistryError, live_error: RegistryError| RegistryError::NoUsableRegistry {
        live: Box::new(live_error),
        cache: Box::new(cache_error),
    };

    let record = match cache.load() {
        Ok(record) => record,
        Err(e) => return Err(unusable(e, live_error)),
    };
    let age = record.retrieved_at;
    let registry = match Registry::from_document(record.document) {
        Ok(registry) => registry,
        Err(e) => return Err(unusable(e, live_error)),
    };

    tracing::info!("Registry loaded from cache dating: {}", age);
    Ok(Acquisition {
        registry,
        origin: RegistryOrigin::Cache { age },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use shared::types::{RawDocument, RegistryDocument};
    use crate::cache::CacheRecord;
    use crate::error::FetchError;

    enum Reply {
        Document(RegistryDocument),
        Status(u16),
        Malformed,
        Unreachable,
    }

    struct FakeSource {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RegistrySource for FakeSource {
        fn fetch(&self, url: &Url) -> std::result::Result<RawDocument, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Document(doc) => Ok(RawDocument::from_document(doc.clone()).unwrap()),
                Reply::Status(status) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                Reply::Malformed => Err(FetchError::MalformedPayload {
                    url: url.to_string(),
                    detail: "expected value at line 1 column 1".to_string(),
                }),
                Reply::Unreachable => Err(FetchError::Network {
                    url: url.to_string(),
                    source: "connection refused".into(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct FakeCache {
        record: Mutex<Option<CacheRecord>>,
        corrupt: bool,
        fail_saves: bool,
        loads: AtomicUsize,
        saves: AtomicUsize,
    }

    impl FakeCache {
        fn holding(document: RegistryDocument, age: CacheAge) -> Self {
            Self {
                record: Mutex::new(Some(CacheRecord {
                    document,
                    retrieved_at: age,
                })),
                ..Default::default()
            }
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    impl CacheStore for FakeCache {
        fn load(&self) -> Result<CacheRecord> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.corrupt {
                return Err(RegistryError::CacheCorrupt {
                    path: PathBuf::from("registry.cached.json"),
                    detail: "EOF while parsing".to_string(),
                });
            }
            self.record
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| RegistryError::CacheNotFound {
                    path: PathBuf::from("registry.cached.json"),
                })
        }

        fn save(&self, raw: &RawDocument) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves {
                return Err(RegistryError::CacheWrite {
                    path: PathBuf::from("registry.cached.json"),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            *self.record.lock().unwrap() = Some(CacheRecord {
                document: raw.document().clone(),
                retrieved_at: CacheAge::Known(Utc::now()),
            });
            Ok(())
        }
    }

    fn node(services: &[&str]) -> Value {
        let services: Vec<Value> = services
            .iter()
            .map(|name| json!({"name": name, "keywords": [], "description": "", "links": []}))
            .collect();
        json!({
            "description": "",
            "affiliation": "",
            "location": {"latitude": 1.0, "longitude": 2.0},
            "contact": "",
            "date_added": "2023-01-01T00:00:00Z",
            "last_updated": "2023-01-01T00:00:00Z",
            "version": "1.0.0",
            "status": "online",
            "links": [],
            "services": services,
        })
    }

    fn document(ids: &[&str]) -> RegistryDocument {
        ids.iter().map(|id| (id.to_string(), node(&["wps"]))).collect()
    }

    fn url() -> Url {
        Url::parse("https://registry.example.org/registry.json").unwrap()
    }

    fn old_age() -> CacheAge {
        CacheAge::Known(Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_live_fetch_refreshes_cache_without_reading_it() {
        let source = FakeSource::new(Reply::Document(document(&["live"])));
        let cache = FakeCache::holding(document(&["cached"]), old_age());

        let acquisition = acquire(&source, &cache, &url(), true).unwrap();

        assert_eq!(acquisition.origin, RegistryOrigin::Live);
        assert!(acquisition.registry.contains_node("live"));
        assert_eq!(cache.loads(), 0);
        assert_eq!(cache.saves(), 1);
        assert_eq!(
            cache.record.lock().unwrap().as_ref().unwrap().document,
            document(&["live"])
        );
    }

    #[test]
    fn test_failed_cache_write_is_not_fatal() {
        let source = FakeSource::new(Reply::Document(document(&["live"])));
        let cache = FakeCache {
            fail_saves: true,
            ..Default::default()
        };

        let acquisition = acquire(&source, &cache, &url(), false).unwrap();
        assert_eq!(acquisition.origin, RegistryOrigin::Live);
        assert_eq!(cache.saves(), 1);
    }

    #[test]
    fn test_fallback_to_cache_on_http_error() {
        let source = FakeSource::new(Reply::Status(500));
        let cache = FakeCache::holding(document(&["cached"]), old_age());

        let acquisition = acquire(&source, &cache, &url(), true).unwrap();

        assert_eq!(acquisition.origin, RegistryOrigin::Cache { age: old_age() });
        assert!(acquisition.registry.contains_node("cached"));
        assert_eq!(cache.loads(), 1);
        assert_eq!(cache.saves(), 0);
    }

    #[test]
    fn test_fallback_on_malformed_payload() {
        let source = FakeSource::new(Reply::Malformed);
        let cache = FakeCache::holding(document(&["cached"]), CacheAge::Unknown);

        let acquisition = acquire(&source, &cache, &url(), true).unwrap();
        assert_eq!(acquisition.origin, RegistryOrigin::Cache { age: CacheAge::Unknown });
    }

    #[test]
    fn test_fallback_on_unreachable_source() {
        let source = FakeSource::new(Reply::Unreachable);
        let cache = FakeCache::holding(document(&["cached"]), old_age());

        let acquisition = acquire(&source, &cache, &url(), true).unwrap();
        assert_eq!(acquisition.origin, RegistryOrigin::Cache { age: old_age() });
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn test_no_fallback_never_touches_cache() {
        let source = FakeSource::new(Reply::Status(503));
        let cache = FakeCache::holding(document(&["cached"]), old_age());

        let err = acquire(&source, &cache, &url(), false).unwrap_err();

        assert!(matches!(err, RegistryError::Fetch(FetchError::Status { status: 503, .. })));
        assert_eq!(cache.loads(), 0);
        assert_eq!(cache.saves(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_never_cached() {
        let source = FakeSource::new(Reply::Status(500));
        let cache = FakeCache::default();

        let err = acquire(&source, &cache, &url(), true).unwrap_err();
        assert!(err.never_cached());
        assert!(!err.cache_corrupt());
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_corrupt_cache() {
        let source = FakeSource::new(Reply::Status(500));
        let cache = FakeCache {
            corrupt: true,
            ..Default::default()
        };

        let err = acquire(&source, &cache, &url(), true).unwrap_err();
        assert!(err.cache_corrupt());
        assert!(!err.never_cached());
    }

    #[test]
    fn test_invalid_live_document_is_not_cached() {
        let mut invalid = document(&["live"]);
        invalid["live"].as_object_mut().unwrap().remove("status");
        let source = FakeSource::new(Reply::Document(invalid));
        let cache = FakeCache::holding(document(&["cached"]), old_age());

        let acquisition = acquire(&source, &cache, &url(), true).unwrap();
        assert!(matches!(acquisition.origin, RegistryOrigin::Cache { .. }));
        assert!(acquisition.registry.contains_node("cached"));
        assert_eq!(cache.saves(), 0);
    }

    #[test]
    fn test_invalid_live_document_without_fallback() {
        let mut invalid = document(&["live"]);
        invalid["live"]["services"][0]
            .as_object_mut()
            .unwrap()
            .remove("keywords");
        let source = FakeSource::new(Reply::Document(invalid));
        let cache = FakeCache::default();

        let err = acquire(&source, &cache, &url(), false).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MalformedService { ref node, ref service, ref field, .. }
                if node == "live" && service == "wps" && field == "keywords"
        ));
        assert_eq!(cache.saves(), 0);
        assert_eq!(cache.loads(), 0);
    }

    #[test]
    fn test_invalid_cached_document_is_unusable() {
        let mut invalid = document(&["cached"]);
        invalid["cached"].as_object_mut().unwrap().remove("links");
        let source = FakeSource::new(Reply::Status(502));
        let cache = FakeCache::holding(invalid, old_age());

        let err = acquire(&source, &cache, &url(), true).unwrap_err();
        assert!(err.cache_corrupt());
        assert!(err.to_string().contains("links"));
    }
}
