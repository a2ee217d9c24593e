//! Read-only document repository.
//!
//! A narrow view over a fixed root directory — either the `current/`
//! snapshot directory (remote sources) or the configured `ordDirectory`
//! (local sources). Generalizes the storage-backend shape of reading,
//! checking existence, and listing a root into a repository specialized
//! for ORD documents and their sibling resource files.

mod fingerprint;
mod validator;

pub use fingerprint::NO_CONTENT;
pub use validator::{DocumentValidator, MinimalOrdValidator};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::snapshot::SnapshotManager;

/// Where the repository's directory fingerprint comes from.
pub enum FingerprintSource {
    /// Snapshot-backed: use the commit hash recorded at the last swap.
    Snapshot(Arc<SnapshotManager>),
    /// Local-backed: compute SHA-256 over sorted `(path, mtime)` pairs.
    Local,
}

const FINGERPRINT_THROTTLE: Duration = Duration::from_secs(10);

struct FingerprintCache {
    computed_at: Instant,
    value: String,
}

pub struct DocumentRepository {
    root: PathBuf,
    fingerprint_source: FingerprintSource,
    validator: Arc<dyn DocumentValidator>,
    fingerprint_cache: Mutex<Option<FingerprintCache>>,
}

impl DocumentRepository {
    pub fn new(root: impl Into<PathBuf>, fingerprint_source: FingerprintSource) -> Self {
        Self {
            root: root.into(),
            fingerprint_source,
            validator: Arc::new(MinimalOrdValidator),
            fingerprint_cache: Mutex::new(None),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn DocumentValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads and validates a single document. Any failure (missing file,
    /// invalid JSON, failed validation) is logged and returns `None`
    /// rather than propagating — a single bad document must not take down
    /// a listing of the rest.
    pub fn get_document(&self, rel_path: &str) -> Option<Value> {
        let path = self.resolve(rel_path)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(err) => {
                crate::observability::Logger::warn(
                    "document_read_failed",
                    &[("path", rel_path), ("error", &err.to_string())],
                );
                return None;
            }
        };
        let document: Value = match serde_json::from_str(&contents) {
            Ok(v) => v,
            Err(err) => {
                crate::observability::Logger::warn(
                    "document_parse_failed",
                    &[("path", rel_path), ("error", &err.to_string())],
                );
                return None;
            }
        };
        if let Err(reason) = self.validator.validate(&document) {
            crate::observability::Logger::warn(
                "document_validation_failed",
                &[("path", rel_path), ("reason", &reason)],
            );
            return None;
        }
        Some(document)
    }

    /// Recursive enumeration of `*.json` files under `dir_rel`.
    pub fn get_documents(&self, dir_rel: &str) -> std::collections::HashMap<String, Value> {
        let mut out = std::collections::HashMap::new();
        for rel_path in self.list_files(dir_rel, true) {
            if !rel_path.ends_with(".json") {
                continue;
            }
            if let Some(document) = self.get_document(&rel_path) {
                out.insert(rel_path, document);
            }
        }
        out
    }

    /// Posix-style paths relative to the repository root.
    pub fn list_files(&self, dir_rel: &str, recursive: bool) -> Vec<String> {
        let Some(start) = self.resolve(dir_rel) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        list_files_impl(&self.root, &start, recursive, &mut out);
        out.sort();
        out
    }

    pub fn get_file_content(&self, rel_path: &str) -> Option<Vec<u8>> {
        let path = self.resolve(rel_path)?;
        std::fs::read(&path).ok()
    }

    pub fn file_exists(&self, rel_path: &str) -> bool {
        self.resolve(rel_path).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Fingerprint for `dir_rel`'s tree, throttled to one recompute per 10
    /// seconds for the repository's root. Returns `"no-content"` if the
    /// root does not exist.
    pub fn get_directory_hash(&self, dir_rel: &str) -> String {
        if !self.root.is_dir() {
            return NO_CONTENT.to_string();
        }
        let Some(dir) = self.resolve(dir_rel) else {
            return NO_CONTENT.to_string();
        };
        if !dir.is_dir() {
            return NO_CONTENT.to_string();
        }

        {
            let cache = self.fingerprint_cache.lock().unwrap();
            if let Some(cached) = cache.as_ref() {
                if cached.computed_at.elapsed() < FINGERPRINT_THROTTLE {
                    return cached.value.clone();
                }
            }
        }

        let value = match &self.fingerprint_source {
            FingerprintSource::Snapshot(manager) => manager
                .get_current_fingerprint()
                .unwrap_or_else(|| NO_CONTENT.to_string()),
            FingerprintSource::Local => {
                fingerprint::compute_local_fingerprint(&dir).unwrap_or_else(|| NO_CONTENT.to_string())
            }
        };

        let mut cache = self.fingerprint_cache.lock().unwrap();
        *cache = Some(FingerprintCache {
            computed_at: Instant::now(),
            value: value.clone(),
        });
        value
    }

    fn resolve(&self, rel_path: &str) -> Option<PathBuf> {
        let rel_path = rel_path.trim_start_matches('/');
        if rel_path.split('/').any(|segment| segment == "..") {
            return None;
        }
        Some(self.root.join(rel_path))
    }
}

fn list_files_impl(root: &Path, dir: &Path, recursive: bool, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if recursive {
                list_files_impl(root, &path, recursive, out);
            }
            continue;
        }
        let rel = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        out.push(rel);
    }
}
