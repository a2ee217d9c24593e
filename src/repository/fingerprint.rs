//! Directory fingerprint computation for local-source repositories.
//!
//! Remote (git-backed) repositories use the commit hash recorded at swap
//! time instead; see `DocumentRepository::get_directory_hash`.

use std::path::Path;

use sha2::{Digest, Sha256};

pub const NO_CONTENT: &str = "no-content";

/// SHA-256 over sorted `(relative_path, mtime_ns)` pairs, posix-separated.
pub fn compute_local_fingerprint(root: &Path) -> Option<String> {
    if !root.is_dir() {
        return None;
    }

    let mut entries = Vec::new();
    collect(root, root, &mut entries);
    entries.sort();

    let mut hasher = Sha256::new();
    for (path, mtime_ns) in &entries {
        hasher.update(path.as_bytes());
        hasher.update(b"\0");
        hasher.update(mtime_ns.to_le_bytes());
        hasher.update(b"\n");
    }
    Some(format!("{:x}", hasher.finalize()))
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<(String, u128)>) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            collect(root, &path, out);
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let mtime_ns = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let rel = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        out.push((rel, mtime_ns));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_root_has_no_fingerprint() {
        let dir = TempDir::new().unwrap();
        assert_eq!(compute_local_fingerprint(&dir.path().join("missing")), None);
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        let first = compute_local_fingerprint(dir.path());
        let second = compute_local_fingerprint(dir.path());
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn fingerprint_changes_when_a_file_is_added() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        let before = compute_local_fingerprint(dir.path());

        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        let after = compute_local_fingerprint(dir.path());

        assert_ne!(before, after);
    }
}
