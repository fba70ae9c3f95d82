use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use shared::protocol::{BACKUP_SUFFIX, META_DOCUMENT_SHA256, META_LAST_CACHE_DATE};
use shared::types::{RawDocument, RegistryDocument};
use crate::cache::digest::document_digest;
use crate::cache::io::{CacheIo, StdIo};
use crate::error::{RegistryError, Result};
use crate::model::timestamp::parse_iso8601;

/// When a cached document was retrieved.
///
/// Metadata that is missing, unreadable or describes a different document
/// yields `Unknown`; only the document body itself is load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAge {
    Known(DateTime<Utc>),
    Unknown,
}

impl CacheAge {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CacheAge::Known(ts) => Some(*ts),
            CacheAge::Unknown => None,
        }
    }
}

impl fmt::Display for CacheAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheAge::Known(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            CacheAge::Unknown => f.write_str("unknown age"),
        }
    }
}

/// A cached registry document and its retrieval time, read as a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    pub document: RegistryDocument,
    pub retrieved_at: CacheAge,
}

/// Persistence of the last known good registry document.
pub trait CacheStore {
    fn load(&self) -> Result<CacheRecord>;

    /// Persist `raw` byte for byte, stamped with the current UTC time.
    fn save(&self, raw: &RawDocument) -> Result<()>;
}

/// Two-file cache: the document verbatim plus a small metadata record.
///
/// A save first backs up the current pair, then writes metadata and
/// document. Any failure restores the backed up pair, so the files on disk
/// always hold either the previous record or the new one. The document
/// backup is written last and removed first; its presence means the backup
/// pair is complete and the primaries may be mid-write.
pub struct FileCache<I: CacheIo = StdIo> {
    doc_path: PathBuf,
    meta_path: PathBuf,
    io: I,
}

impl FileCache<StdIo> {
    pub fn new(doc_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Self {
        Self::with_io(doc_path, meta_path, StdIo)
    }
}

impl<I: CacheIo> FileCache<I> {
    pub fn with_io(doc_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>, io: I) -> Self {
        Self {
            doc_path: doc_path.into(),
            meta_path: meta_path.into(),
            io,
        }
    }

    pub fn doc_path(&self) -> &Path {
        &self.doc_path
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    fn doc_backup(&self) -> PathBuf {
        backup_path(&self.doc_path)
    }

    fn meta_backup(&self) -> PathBuf {
        backup_path(&self.meta_path)
    }

    /// Finish off whatever an interrupted save left behind.
    fn recover(&self) -> Result<()> {
        if self.io.exists(&self.doc_backup()) {
            tracing::warn!(
                "Found backups from an interrupted cache write, restoring {}",
                self.doc_path.display()
            );
            self.restore_backups()
        } else {
            // Interrupted while taking backups: primaries were never touched
            self.remove(&self.meta_backup())
        }
    }

    /// Step 1. Returns false when there is no previous record to protect.
    fn backup(&self) -> Result<bool> {
        if !self.io.exists(&self.doc_path) {
            return Ok(false);
        }

        if self.io.exists(&self.meta_path) {
            self.copy(&self.meta_path, &self.meta_backup())?;
        }
        if let Err(e) = self.copy(&self.doc_path, &self.doc_backup()) {
            let _ = self.remove(&self.meta_backup());
            return Err(e);
        }
        tracing::debug!("Backed up cache record at {}", self.doc_path.display());
        Ok(true)
    }

    /// Step 2.
    fn write_primaries(&self, meta: &[u8], body: &[u8]) -> Result<()> {
        self.write(&self.meta_path, meta)?;
        self.write(&self.doc_path, body)
    }

    /// Step 3. Backups are only dropped once both primaries are back.
    fn restore_backups(&self) -> Result<()> {
        let meta_backup = self.meta_backup();
        self.copy(&self.doc_backup(), &self.doc_path)?;
        if self.io.exists(&meta_backup) {
            self.copy(&meta_backup, &self.meta_path)?;
        } else {
            self.remove(&self.meta_path)?;
        }
        self.discard_backups()
    }

    /// Step 4. Document backup first: it marks the backup pair as live.
    fn discard_backups(&self) -> Result<()> {
        self.remove(&self.doc_backup())?;
        self.remove(&self.meta_backup())
    }

    fn discard_primaries(&self) -> Result<()> {
        self.remove(&self.doc_path)?;
        self.remove(&self.meta_path)
    }

    /// Metadata is advisory: every failure here degrades to `Unknown`.
    fn read_age(&self, meta_path: &Path, body: &[u8]) -> CacheAge {
        let raw = match self.io.read(meta_path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Cache metadata {} unreadable: {}", meta_path.display(), e);
                return CacheAge::Unknown;
            }
        };

        let meta: Value = match serde_json::from_slice(&raw) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!("Cache metadata {} is not valid JSON: {}", meta_path.display(), e);
                return CacheAge::Unknown;
            }
        };

        if let Some(expected) = meta.get(META_DOCUMENT_SHA256).and_then(Value::as_str) {
            if expected != document_digest(body) {
                tracing::warn!(
                    "Cache metadata {} describes a different document",
                    meta_path.display()
                );
                return CacheAge::Unknown;
            }
        }

        match meta
            .get(META_LAST_CACHE_DATE)
            .and_then(Value::as_str)
            .and_then(parse_iso8601)
        {
            Some(ts) => CacheAge::Known(ts),
            None => {
                tracing::warn!(
                    "Cache metadata {} has no usable {}",
                    meta_path.display(),
                    META_LAST_CACHE_DATE
                );
                CacheAge::Unknown
            }
        }
    }

    fn load_pair(&self, doc_path: &Path, meta_path: &Path) -> Result<CacheRecord> {
        let body = self.io.read(doc_path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => RegistryError::CacheNotFound {
                path: doc_path.to_path_buf(),
            },
            _ => RegistryError::CacheRead {
                path: doc_path.to_path_buf(),
                source,
            },
        })?;

        let document: RegistryDocument =
            serde_json::from_slice(&body).map_err(|e| RegistryError::CacheCorrupt {
                path: doc_path.to_path_buf(),
                detail: e.to_string(),
            })?;

        Ok(CacheRecord {
            document,
            retrieved_at: self.read_age(meta_path, &body),
        })
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        self.io.copy(from, to).map_err(|source| RegistryError::CacheWrite {
            path: to.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.io
            .write_atomic(path, data)
            .map_err(|source| RegistryError::CacheWrite {
                path: path.to_path_buf(),
                source,
            })
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.io.remove(path).map_err(|source| RegistryError::CacheWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<I: CacheIo> CacheStore for FileCache<I> {
    /// Read-only: while backups exist a save is in flight (or died), so the
    /// backed up pair is the consistent one.
    fn load(&self) -> Result<CacheRecord> {
        let doc_backup = self.doc_backup();
        if self.io.exists(&doc_backup) {
            match self.load_pair(&doc_backup, &self.meta_backup()) {
                // The writer finished between our check and our read
                Err(RegistryError::CacheNotFound { .. }) => {}
                other => return other,
            }
        }
        self.load_pair(&self.doc_path, &self.meta_path)
    }

    fn save(&self, raw: &RawDocument) -> Result<()> {
        self.recover()?;

        let body = raw.bytes();
        let mut meta = Map::new();
        meta.insert(
            META_LAST_CACHE_DATE.to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
        meta.insert(META_DOCUMENT_SHA256.to_string(), Value::from(document_digest(body)));
        let meta = serde_json::to_vec(&meta).map_err(|e| RegistryError::CacheWrite {
            path: self.meta_path.clone(),
            source: e.into(),
        })?;

        let had_previous = self.backup()?;

        if let Err(err) = self.write_primaries(&meta, body) {
            let rollback = if had_previous {
                self.restore_backups()
            } else {
                self.discard_primaries()
            };
            if let Err(e) = rollback {
                // Backups stay on disk: load serves them, the next save recovers them
                tracing::error!("Failed to roll back cache write: {}", e);
            }
            return Err(err);
        }

        self.discard_backups()?;
        tracing::debug!("Cached registry at {}", self.doc_path.display());
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}
