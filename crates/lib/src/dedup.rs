//! At-most-once guard for inbound events.
//!
//! Membership check and insert happen in one critical section, before any
//! side-effecting work: two concurrent deliveries of the same event id must
//! not both observe "absent". The set is size-bounded; once full, the oldest
//! ids are evicted in insertion order. Platform redeliveries arrive within
//! seconds of the original, so a bounded window is enough.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default number of event ids remembered before eviction starts.
const DEFAULT_CAPACITY: usize = 4096;

struct DedupInner {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

/// Bounded set of already-processed event ids.
pub struct DedupGuard {
    capacity: usize,
    inner: Arc<Mutex<DedupInner>>,
}

impl Default for DedupGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Arc::new(Mutex::new(DedupInner {
                seen: HashSet::new(),
                order: VecDeque::new(),
            })),
        }
    }

    /// Atomically check-then-insert. Returns true when the event is fresh
    /// (and is now marked processed), false when it was already seen.
    pub async fn mark(&self, event_id: &str) -> bool {
        let mut g = self.inner.lock().await;
        if !g.seen.insert(event_id.to_string()) {
            return false;
        }
        g.order.push_back(event_id.to_string());
        while g.order.len() > self.capacity {
            if let Some(oldest) = g.order.pop_front() {
                g.seen.remove(&oldest);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_mark_is_fresh_second_is_not() {
        let guard = DedupGuard::new();
        assert!(guard.mark("ev-1").await);
        assert!(!guard.mark("ev-1").await);
        assert!(guard.mark("ev-2").await);
    }

    #[tokio::test]
    async fn oldest_ids_are_evicted_at_capacity() {
        let guard = DedupGuard::with_capacity(2);
        assert!(guard.mark("ev-1").await);
        assert!(guard.mark("ev-2").await);
        assert!(guard.mark("ev-3").await);
        // ev-1 fell out of the window; ev-2 and ev-3 are still remembered.
        assert!(guard.mark("ev-1").await);
        assert!(!guard.mark("ev-3").await);
    }

    #[tokio::test]
    async fn concurrent_marks_admit_exactly_one() {
        let guard = Arc::new(DedupGuard::new());
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let guard = guard.clone();
            tasks.push(tokio::spawn(async move { guard.mark("ev-race").await }));
        }
        let mut fresh = 0;
        for t in tasks {
            if t.await.unwrap() {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
    }
}
