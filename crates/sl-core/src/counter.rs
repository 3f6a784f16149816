//! Per-stack count of completed operations.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Monotonic count of completed push/pop attempts.
///
/// The count is a benchmarking aid and carries no synchronization duty for
/// the stack itself, so all accesses are `Relaxed`. It sits on its own cache
/// line so that bumping it does not bounce the line holding the stack head.
#[derive(Debug, Default)]
pub struct OperationCounter {
    count: CachePadded<AtomicU64>,
}

impl OperationCounter {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Record one completed operation.
    #[inline]
    pub fn record(&self) {
        let previous = self.count.fetch_add(1, Ordering::Relaxed);
        debug_assert!(previous < u64::MAX, "operation counter overflow");
    }

    /// Current count.
    #[inline]
    #[must_use]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
