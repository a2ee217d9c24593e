//! Persisted content metadata: `<dataDir>/.metadata.json`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::SnapshotError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub commit_hash: String,
    pub fetch_time: DateTime<Utc>,
    pub branch: String,
    pub repository: String,
    pub total_files: u64,
}

const METADATA_FILE_NAME: &str = ".metadata.json";

impl ContentMetadata {
    pub fn path_for(data_dir: &Path) -> std::path::PathBuf {
        data_dir.join(METADATA_FILE_NAME)
    }

    /// Written only after a successful snapshot swap.
    pub fn save(&self, data_dir: &Path) -> Result<(), SnapshotError> {
        let path = Self::path_for(data_dir);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::metadata_corrupt(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| SnapshotError::io(format!("writing {}", path.display()), e))
    }

    /// Corruption (missing file, invalid JSON, schema mismatch) is treated
    /// as absent rather than as an error.
    pub fn load(data_dir: &Path) -> Option<Self> {
        let path = Self::path_for(data_dir);
        let contents = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }
}
