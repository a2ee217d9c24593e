//! Background cache warmer.
//!
//! At most one warmer runs per fingerprint. A warm request for the
//! fingerprint already warming joins it implicitly (no new task spawned);
//! a warm request for a different fingerprint aborts the current warmer
//! before starting its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct ActiveWarm {
    fingerprint: String,
    cancel: Arc<AtomicBool>,
}

#[derive(Default)]
pub struct Warmer {
    active: Mutex<Option<ActiveWarm>>,
}

impl Warmer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `work` on the current tokio runtime unless a warmer for
    /// `fingerprint` is already running. `work` receives a cancellation
    /// flag it should check periodically and stop early if set.
    pub fn warm<F>(self: &Arc<Self>, fingerprint: &str, work: F)
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let mut active = self.active.lock().unwrap();
        if let Some(current) = active.as_ref() {
            if current.fingerprint == fingerprint {
                return;
            }
            current.cancel.store(true, Ordering::SeqCst);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        *active = Some(ActiveWarm {
            fingerprint: fingerprint.to_string(),
            cancel: Arc::clone(&cancel),
        });
        drop(active);

        let self_for_task = Arc::clone(self);
        let fingerprint = fingerprint.to_string();
        let cancel_for_task = Arc::clone(&cancel);
        tokio::spawn(async move {
            tokio::task::spawn_blocking(move || work(cancel_for_task)).await.ok();
            let mut active = self_for_task.active.lock().unwrap();
            if matches!(active.as_ref(), Some(a) if a.fingerprint == fingerprint) {
                *active = None;
            }
        });
    }

    pub fn is_warming(&self, fingerprint: &str) -> bool {
        matches!(self.active.lock().unwrap().as_ref(), Some(a) if a.fingerprint == fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn second_warm_for_same_fingerprint_does_not_spawn_again() {
        let warmer = Arc::new(Warmer::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let r1 = Arc::clone(&runs);
        warmer.warm("fp1", move |_cancel| {
            std::thread::sleep(Duration::from_millis(50));
            r1.fetch_add(1, Ordering::SeqCst);
        });
        assert!(warmer.is_warming("fp1"));

        let r2 = Arc::clone(&runs);
        warmer.warm("fp1", move |_cancel| {
            r2.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn warm_for_new_fingerprint_cancels_previous() {
        let warmer = Arc::new(Warmer::new());
        let cancelled = Arc::new(AtomicBool::new(false));

        let c1 = Arc::clone(&cancelled);
        warmer.warm("fp1", move |cancel| {
            std::thread::sleep(Duration::from_millis(100));
            c1.store(cancel.load(Ordering::SeqCst), Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        warmer.warm("fp2", |_cancel| {});

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cancelled.load(Ordering::SeqCst));
    }
}
