//! Git-backed `ContentFetcher`.
//!
//! `git2` is synchronous; every call here runs inside
//! `tokio::task::spawn_blocking` so it never stalls the async runtime.
//! Cancellation is a shared flag checked from git2's transfer-progress
//! callback, the same polling-cancellation shape `git2` itself documents
//! for long-running network operations.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::errors::{FetchError, FetchResult};
use super::progress::{FetchProgress, ProgressCallback};
use super::ContentFetcher;
use crate::snapshot::ContentMetadata;

#[derive(Clone)]
pub struct GitFetcher {
    repository_url: String,
    repository_name: String,
    branch: String,
    token: Option<String>,
    cancelled: Arc<AtomicBool>,
}

impl GitFetcher {
    pub fn new(
        repository_url: impl Into<String>,
        repository_name: impl Into<String>,
        branch: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            repository_url: repository_url.into(),
            repository_name: repository_name.into(),
            branch: branch.into(),
            token,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fetch_options(&self) -> git2::FetchOptions<'_> {
        let mut callbacks = git2::RemoteCallbacks::new();
        let token = self.token.clone();
        callbacks.credentials(move |_url, username_from_url, _allowed| {
            if let Some(token) = &token {
                git2::Cred::userpass_plaintext(username_from_url.unwrap_or("x-access-token"), token)
            } else {
                git2::Cred::default()
            }
        });

        let cancelled = Arc::clone(&self.cancelled);
        callbacks.transfer_progress(move |_stats| !cancelled.load(Ordering::SeqCst));

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(callbacks);
        options
    }

    fn clone_blocking(
        &self,
        target_dir: &Path,
        mut progress: ProgressCallback,
    ) -> FetchResult<ContentMetadata> {
        let started = FetchProgress {
            total_files: 0,
            fetched_files: 0,
            current_file: None,
            start_time: Some(std::time::SystemTime::now()),
            errors: vec![],
        };
        progress(&started);

        let mut builder = git2::build::RepoBuilder::new();
        builder.branch(&self.branch);
        builder.fetch_options(self.fetch_options());

        let repo = builder.clone(&self.repository_url, target_dir).map_err(|e| {
            if self.cancelled.load(Ordering::SeqCst) {
                FetchError::Cancelled
            } else {
                classify_git_error(&e)
            }
        })?;

        let head = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| FetchError::Network(e.message().to_string()))?;
        let commit_hash = head.id().to_string();

        let total_files = count_files(target_dir);
        progress(&FetchProgress {
            total_files,
            fetched_files: total_files,
            current_file: None,
            start_time: started.start_time,
            errors: vec![],
        });

        Ok(ContentMetadata {
            commit_hash,
            fetch_time: Utc::now(),
            branch: self.branch.clone(),
            repository: self.repository_name.clone(),
            total_files,
        })
    }

    fn latest_commit_sha_blocking(&self) -> FetchResult<String> {
        let mut remote = git2::Remote::create_detached(self.repository_url.as_str())
            .map_err(|e| classify_git_error(&e))?;
        let token = self.token.clone();
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, _allowed| {
            if let Some(token) = &token {
                git2::Cred::userpass_plaintext(username_from_url.unwrap_or("x-access-token"), token)
            } else {
                git2::Cred::default()
            }
        });
        remote
            .connect_auth(git2::Direction::Fetch, Some(callbacks), None)
            .map_err(|e| classify_git_error(&e))?;

        let refname = format!("refs/heads/{}", self.branch);
        let heads = remote.list().map_err(|e| classify_git_error(&e))?;
        let found = heads
            .iter()
            .find(|h| h.name() == refname)
            .map(|h| h.oid().to_string());
        let _ = remote.disconnect();

        found.ok_or_else(|| FetchError::NotFound(format!("branch {} not found", self.branch)))
    }
}

fn classify_git_error(err: &git2::Error) -> FetchError {
    match err.class() {
        git2::ErrorClass::Net => FetchError::Network(err.message().to_string()),
        git2::ErrorClass::Http => FetchError::Network(err.message().to_string()),
        _ if matches!(err.code(), git2::ErrorCode::Auth) => FetchError::Auth(err.message().to_string()),
        _ if matches!(err.code(), git2::ErrorCode::NotFound) => {
            FetchError::NotFound(err.message().to_string())
        }
        _ => FetchError::Network(err.message().to_string()),
    }
}

fn count_files(root: &Path) -> u64 {
    fn walk(dir: &Path, count: &mut u64) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            if entry.file_name() == ".git" {
                continue;
            }
            if let Ok(file_type) = entry.file_type() {
                if file_type.is_dir() {
                    walk(&entry.path(), count);
                } else {
                    *count += 1;
                }
            }
        }
    }
    let mut count = 0;
    walk(root, &mut count);
    count
}

#[async_trait]
impl ContentFetcher for GitFetcher {
    async fn fetch_all_content(
        &self,
        target_dir: &Path,
        progress: ProgressCallback,
    ) -> FetchResult<ContentMetadata> {
        self.cancelled.store(false, Ordering::SeqCst);
        let target_dir: PathBuf = target_dir.to_path_buf();
        let fetcher = self.clone();
        tokio::task::spawn_blocking(move || fetcher.clone_blocking(&target_dir, progress))
            .await
            .map_err(|e| FetchError::Network(format!("fetch task panicked: {e}")))?
    }

    async fn fetch_latest_changes(
        &self,
        target_dir: &Path,
        _since: &str,
        progress: ProgressCallback,
    ) -> FetchResult<ContentMetadata> {
        // The gateway retains only one snapshot (spec.md §1 non-goals), so
        // an incremental fetch is a full re-clone into a fresh staging dir.
        self.fetch_all_content(target_dir, progress).await
    }

    fn abort_fetch(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    async fn get_latest_commit_sha(&self) -> FetchResult<String> {
        let fetcher = self.clone();
        tokio::task::spawn_blocking(move || fetcher.latest_commit_sha_blocking())
            .await
            .map_err(|e| FetchError::Network(format!("lookup task panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_sets_cancelled_flag() {
        let fetcher = GitFetcher::new("https://example.com/org/repo.git", "org/repo", "main", None);
        assert!(!fetcher.cancelled.load(Ordering::SeqCst));
        fetcher.abort_fetch();
        assert!(fetcher.cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn count_files_ignores_git_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config"), "x").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::create_dir_all(dir.path().join("documents")).unwrap();
        std::fs::write(dir.path().join("documents/b.json"), "{}").unwrap();

        assert_eq!(count_files(dir.path()), 2);
    }
}
