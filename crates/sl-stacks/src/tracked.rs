//! History-recording wrapper for property verification.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use sl_core::{ConcurrentStack, StackHistory, StackProperties};

use crate::Snapshot;

/// Wraps any stack of `u64` and records what went in and what came out.
///
/// Recording happens after the inner operation returns, under a separate
/// lock, so the history is in completion order. For a single driving
/// thread that is also the linearization order, which is what the LIFO
/// replay check needs. With several threads only the multiset checks are
/// meaningful.
pub struct TrackedStack<S> {
    inner: S,
    tracker: Mutex<StackTracker>,
}

/// Tracking state for property verification.
#[derive(Default)]
struct StackTracker {
    pushed: Vec<u64>,
    popped: Vec<u64>,
    history: StackHistory,
    step: u64,
}

static NEXT_THREAD_TAG: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_TAG: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Small stable id for the calling thread, assigned on first use.
fn thread_tag() -> u64 {
    THREAD_TAG.with(|tag| match tag.get() {
        Some(id) => id,
        None => {
            let id = NEXT_THREAD_TAG.fetch_add(1, Ordering::Relaxed);
            tag.set(Some(id));
            id
        }
    })
}

impl<S> TrackedStack<S>
where
    S: ConcurrentStack<u64>,
{
    /// Wrap `inner`, which should be freshly constructed so that its
    /// counter and the recorded history start together.
    #[must_use]
    pub fn new(inner: S) -> Self {
        debug_assert_eq!(inner.operation_count(), 0, "inner stack already used");
        Self {
            inner,
            tracker: Mutex::new(StackTracker::default()),
        }
    }

    /// The wrapped stack.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Push and record.
    pub fn push(&self, value: u64) {
        self.inner.push(value);

        let mut tracker = self.tracker.lock();
        tracker.pushed.push(value);
        tracker.step += 1;
        let step = tracker.step;
        tracker.history.record_push(thread_tag(), value, step);
    }

    /// Pop and record.
    pub fn pop(&self) -> Option<u64> {
        let value = self.inner.pop();

        let mut tracker = self.tracker.lock();
        if let Some(v) = value {
            tracker.popped.push(v);
        }
        tracker.step += 1;
        let step = tracker.step;
        tracker.history.record_pop(thread_tag(), value, step);

        value
    }

    /// Pop until empty, recording every pop. Returns the drained values.
    pub fn drain(&self) -> Vec<u64> {
        std::iter::from_fn(|| self.pop()).collect()
    }
}

impl<S> ConcurrentStack<u64> for TrackedStack<S>
where
    S: ConcurrentStack<u64>,
{
    fn push(&self, value: u64) {
        TrackedStack::push(self, value);
    }

    fn pop(&self) -> Option<u64> {
        TrackedStack::pop(self)
    }

    fn operation_count(&self) -> u64 {
        self.inner.operation_count()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn strategy(&self) -> &'static str {
        self.inner.strategy()
    }
}

impl<S> StackProperties for TrackedStack<S>
where
    S: ConcurrentStack<u64> + Snapshot<u64>,
{
    fn pushed_elements(&self) -> Vec<u64> {
        self.tracker.lock().pushed.clone()
    }

    fn popped_elements(&self) -> Vec<u64> {
        self.tracker.lock().popped.clone()
    }

    fn current_contents(&self) -> Vec<u64> {
        self.inner.snapshot()
    }

    fn history(&self) -> StackHistory {
        self.tracker.lock().history.clone()
    }

    fn operation_count(&self) -> u64 {
        self.inner.operation_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoarseLockedStack, FineLockedStack, LockFreeStack};
    use sl_core::{PropertyChecker, StackPropertyChecker};

    fn exercise<S>(inner: S)
    where
        S: ConcurrentStack<u64> + Snapshot<u64>,
    {
        let stack = TrackedStack::new(inner);
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.pop(), Some(2));
        stack.push(3);

        let checker = StackPropertyChecker::new(&stack);
        assert!(checker.all_hold(), "{:?}", checker.check_all());
        assert_eq!(stack.current_contents(), vec![3, 1]);

        assert_eq!(stack.drain(), vec![3, 1]);
        assert_eq!(stack.pop(), None);
        assert!(checker.all_hold(), "{:?}", checker.check_all());
        assert_eq!(stack.history().len(), 8);
    }

    #[test]
    fn test_invariants_hold_for_every_variant() {
        exercise(CoarseLockedStack::new());
        exercise(FineLockedStack::new());
        exercise(LockFreeStack::new());
    }

    #[test]
    fn test_concurrent_history_is_not_sequential() {
        let stack = TrackedStack::new(LockFreeStack::new());

        std::thread::scope(|s| {
            for t in 0..4u64 {
                let stack = &stack;
                s.spawn(move || {
                    for i in 0..250 {
                        stack.push(t * 250 + i);
                        stack.pop();
                    }
                });
            }
        });
        stack.drain();

        assert!(!stack.history().is_sequential());
        assert!(StackPropertyChecker::new(&stack).all_hold());
    }
}
