//! Completion tracking for dispatched downloads
//!
//! Every download registers with the tracker before it is spawned and holds a
//! [`TaskGuard`] for its whole lifetime. Dropping the guard releases the slot, so
//! a task is counted out exactly once whether it saved its image, failed, or
//! panicked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct TrackerInner {
    outstanding: AtomicUsize,
    idle: Notify,
}

/// Counts outstanding download tasks and lets the crawl wait for them
#[derive(Clone)]
pub struct CompletionTracker {
    inner: Arc<TrackerInner>,
}

impl CompletionTracker {
    /// Creates a tracker with no outstanding tasks
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                outstanding: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Registers one task; must be called before the task is dispatched
    pub fn register(&self) -> TaskGuard {
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of registered tasks that have not finished
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    /// Waits until every registered task has released its guard
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn wait(&self) {
        loop {
            // Registered before the check so a release in between is not missed
            let idle = self.inner.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of registration held by a running download
///
/// Dropping it decrements the tracker.
pub struct TaskGuard {
    inner: Arc<TrackerInner>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let remaining = self.inner.outstanding.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            self.inner.idle.notify_waiters();
        }
    }
}
