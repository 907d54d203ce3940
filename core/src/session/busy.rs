//! Single-flight guard for turns

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag marking a session as busy with a turn
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    inner: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag; `None` if another turn already holds it
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.inner
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                inner: Arc::clone(&self.inner),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}

/// Releases the busy flag when dropped
#[derive(Debug)]
pub struct BusyGuard {
    inner: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let flag = BusyFlag::new();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_has_one_winner() {
        let flag = BusyFlag::new();
        let barrier = Arc::new(tokio::sync::Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let flag = flag.clone();
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    flag.try_acquire()
                })
            })
            .collect();

        let mut guards = Vec::new();
        for handle in handles {
            guards.push(handle.await.unwrap());
        }

        assert_eq!(guards.iter().filter(|g| g.is_some()).count(), 1);
    }
}
