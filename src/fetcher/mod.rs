//! Content fetcher: populates a target directory from a remote source.
//!
//! `ContentFetcher` is the seam between the update scheduler and the
//! transport that actually moves bytes. The gateway ships one
//! implementation, `GitFetcher`, backed by `git2`; the trait exists so the
//! scheduler and snapshot manager never depend on `git2` directly.

mod errors;
mod git;
mod progress;

pub use errors::{FetchError, FetchResult};
pub use git::GitFetcher;
pub use progress::{FetchProgress, ProgressCallback};

use std::path::Path;

use async_trait::async_trait;

use crate::snapshot::ContentMetadata;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Populates a freshly empty `target_dir` with exactly the branch
    /// contents at the resolved commit, or fails leaving `target_dir` in
    /// an undefined but cleanable state.
    async fn fetch_all_content(
        &self,
        target_dir: &Path,
        progress: ProgressCallback,
    ) -> FetchResult<ContentMetadata>;

    /// Incremental fetch since a known commit. Implementations that cannot
    /// diff cheaply may fall back to a full fetch.
    async fn fetch_latest_changes(
        &self,
        target_dir: &Path,
        since: &str,
        progress: ProgressCallback,
    ) -> FetchResult<ContentMetadata>;

    /// Signals an in-progress fetch to stop. Safe to call from another
    /// task; the in-progress call then resolves with `FetchError::Cancelled`.
    fn abort_fetch(&self);

    /// Resolves the branch HEAD without fetching content, used by the
    /// scheduler to decide whether an update is actually needed.
    async fn get_latest_commit_sha(&self) -> FetchResult<String>;
}
