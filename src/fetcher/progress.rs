//! Progress reporting for in-flight fetches.

use std::time::SystemTime;

#[derive(Debug, Clone, Default)]
pub struct FetchProgress {
    pub total_files: u64,
    pub fetched_files: u64,
    pub current_file: Option<String>,
    pub start_time: Option<SystemTime>,
    pub errors: Vec<String>,
}

/// Called as a fetch makes progress. Boxed so callers can close over
/// channel senders or broadcast handles without a generic parameter
/// threading through the fetcher trait. `'static` because fetches run
/// inside `spawn_blocking`, which cannot borrow from its caller's stack.
pub type ProgressCallback = Box<dyn FnMut(&FetchProgress) + Send + 'static>;
