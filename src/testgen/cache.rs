// src/testgen/cache.rs
//
// Fingerprint cache: which callable units of a source file already have
// tests. One JSON record per source path, named by the SHA-256 of the path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::detectors::ast::catalog::CallableUnit;
use crate::error::{Result, SyncError};

pub const DEFAULT_CACHE_DIR: &str = ".testgen_cache";

/// Last accepted state of one source file.
///
/// The zero value (no units, empty hash, no timestamp) is what a path that
/// was never written reads as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    #[serde(default)]
    pub hash: String,
    #[serde(default, alias = "functions")]
    pub units: Vec<CallableUnit>,
    /// Epoch milliseconds of the write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl FileFingerprint {
    pub fn is_initial(&self) -> bool {
        self.units.is_empty()
    }

    pub fn knows(&self, unit: &CallableUnit) -> bool {
        self.units.iter().any(|u| u.same_unit(unit))
    }
}

/// Directory-backed store. No locking: the last writer for a path wins.
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    dir: PathBuf,
}

impl FingerprintStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the record for `source_path` lives. Keyed by the path as given,
    /// not its content, so a renamed file starts without history.
    pub fn record_path(&self, source_path: impl AsRef<Path>) -> PathBuf {
        self.dir.join(format!("{}.json", path_key(source_path.as_ref())))
    }

    pub fn read(&self, source_path: impl AsRef<Path>) -> Result<FileFingerprint> {
        let path = self.record_path(source_path);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(FileFingerprint::default());
            }
            Err(source) => return Err(SyncError::CacheIo { path, source }),
        };

        serde_json::from_str(&raw).map_err(|source| SyncError::CacheCorrupt { path, source })
    }

    /// Replace the record for `source_path` and return what was stored.
    ///
    /// `units` is persisted as given; callers dedupe by `(name, kind)`.
    pub fn write(
        &self,
        source_path: impl AsRef<Path>,
        content: &str,
        units: Vec<CallableUnit>,
    ) -> Result<FileFingerprint> {
        let source_path = source_path.as_ref();
        let record = FileFingerprint {
            hash: content_hash(content),
            units,
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        };

        fs::create_dir_all(&self.dir).map_err(|source| SyncError::CacheIo {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.record_path(source_path);
        let body = serde_json::to_string(&record).map_err(|source| SyncError::CacheCorrupt {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| SyncError::CacheIo {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            source = %source_path.display(),
            units = record.units.len(),
            record = %path.display(),
            "fingerprint written"
        );

        Ok(record)
    }

    /// Drop the record for `source_path`. Returns whether one existed.
    pub fn remove(&self, source_path: impl AsRef<Path>) -> Result<bool> {
        let path = self.record_path(source_path);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SyncError::CacheIo { path, source }),
        }
    }

    /// Keys of all stored records, sorted.
    pub fn entries(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SyncError::CacheIo {
                path: self.dir.clone(),
                source: e.into(),
            })?;

            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()) == Some("json")
            {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

impl Default for FingerprintStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

/// SHA-256 hex of `content`.
pub fn content_hash(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

fn path_key(source_path: &Path) -> String {
    content_hash(&source_path.to_string_lossy())
}
