//! Filesystem snapshot manager.
//!
//! Owns `dataDir` exclusively: `current/` holds the live, fully-written
//! snapshot; `temp/` is scratch space for the next one. A swap replaces
//! `current/` with `temp/`'s contents as a single observable step, so a
//! concurrent reader always sees either the whole previous tree or the
//! whole new one, never a mix.

mod errors;
mod metadata;
mod swap;

pub use errors::{SnapshotError, SnapshotErrorCode, SnapshotResult};
pub use metadata::ContentMetadata;

use std::path::{Path, PathBuf};

const CURRENT_DIR_NAME: &str = "current";
const TEMP_DIR_NAME: &str = "temp";

pub struct SnapshotManager {
    data_dir: PathBuf,
    documents_subdir: String,
}

impl SnapshotManager {
    pub fn new(data_dir: impl Into<PathBuf>, documents_subdir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            documents_subdir: documents_subdir.into(),
        }
    }

    pub fn current_path(&self) -> PathBuf {
        self.data_dir.join(CURRENT_DIR_NAME)
    }

    fn temp_path(&self) -> PathBuf {
        self.data_dir.join(TEMP_DIR_NAME)
    }

    fn backup_path(&self, timestamp_ms: u128) -> PathBuf {
        self.data_dir.join(format!("backup_{timestamp_ms}"))
    }

    /// Creates `dataDir`, `dataDir/current/<documentsSubdir>/`, `dataDir/temp/`.
    pub fn initialize(&self) -> SnapshotResult<()> {
        std::fs::create_dir_all(self.current_path().join(&self.documents_subdir))
            .map_err(|e| SnapshotError::io("initializing current/ directory", e))?;
        std::fs::create_dir_all(self.temp_path())
            .map_err(|e| SnapshotError::io("initializing temp/ directory", e))?;
        Ok(())
    }

    /// Clears and returns `dataDir/temp/`, ready to receive a new fetch.
    pub fn staging_directory(&self) -> SnapshotResult<PathBuf> {
        let temp = self.temp_path();
        if temp.exists() {
            std::fs::remove_dir_all(&temp).map_err(|e| SnapshotError::io("clearing temp/", e))?;
        }
        std::fs::create_dir_all(&temp).map_err(|e| SnapshotError::io("recreating temp/", e))?;
        Ok(temp)
    }

    /// `true` iff `dir/<documentsSubdir>/` exists and is a directory.
    pub fn validate(&self, dir: &Path) -> bool {
        dir.join(&self.documents_subdir).is_dir()
    }

    /// Makes `staging` the new `current/`. On failure the previous snapshot
    /// remains in place, best effort.
    pub fn swap(&self, staging: &Path, now_millis: u128) -> SnapshotResult<()> {
        if !self.validate(staging) {
            return Err(SnapshotError::swap_failed(format!(
                "staging directory {} is missing its documents subdirectory",
                staging.display()
            )));
        }
        let backup = self.backup_path(now_millis);
        swap::swap(&self.current_path(), staging, &backup)
    }

    pub fn cleanup_staging(&self) -> SnapshotResult<()> {
        let temp = self.temp_path();
        if temp.exists() {
            std::fs::remove_dir_all(&temp).map_err(|e| SnapshotError::io("cleaning up temp/", e))?;
        }
        Ok(())
    }

    pub fn has_current_content(&self) -> bool {
        self.validate(&self.current_path())
    }

    pub fn save_metadata(&self, metadata: &ContentMetadata) {
        if let Err(err) = metadata.save(&self.data_dir) {
            crate::observability::Logger::warn(
                "metadata_save_failed",
                &[("error", &err.to_string())],
            );
        }
    }

    pub fn load_metadata(&self) -> Option<ContentMetadata> {
        ContentMetadata::load(&self.data_dir)
    }

    /// The commit hash recorded at the last successful swap, if any.
    pub fn get_current_fingerprint(&self) -> Option<String> {
        self.load_metadata().map(|m| m.commit_hash)
    }
}
