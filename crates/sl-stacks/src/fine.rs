//! Explicitly locked stack: manual acquire and release around each
//! critical section.
//!
//! Observable behavior is the same as [`CoarseLockedStack`]. The difference
//! is ergonomic: no guard object ties the lock to a scope, so the release
//! on every exit path, including unwinding out of the critical section,
//! is spelled out by hand.
//!
//! [`CoarseLockedStack`]: crate::CoarseLockedStack

use std::cell::UnsafeCell;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::lock_api::RawMutex as _;
use parking_lot::RawMutex;

use sl_core::{ConcurrentStack, OperationCounter};

use crate::node::NodeChain;
use crate::Snapshot;

/// Stack guarded by a raw lock that is acquired and released manually.
pub struct FineLockedStack<T> {
    lock: RawMutex,
    /// Only accessed between `acquire` and `release`.
    chain: UnsafeCell<NodeChain<T>>,
    counter: OperationCounter,
}

impl<T> FineLockedStack<T> {
    /// Create a new empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lock: RawMutex::INIT,
            chain: UnsafeCell::new(NodeChain::new()),
            counter: OperationCounter::new(),
        }
    }

    fn acquire(&self) {
        self.lock.lock();
    }

    /// # Safety
    ///
    /// The calling thread must hold the lock.
    unsafe fn release(&self) {
        self.lock.unlock();
    }

    /// Run `f` on the chain with the lock held. The lock is released
    /// before returning, whether `f` returns or unwinds.
    fn locked<R>(&self, f: impl FnOnce(&mut NodeChain<T>) -> R) -> R {
        self.acquire();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            // Safety: the lock is held, so this is the only live reference.
            let chain = unsafe { &mut *self.chain.get() };
            f(chain)
        }));

        // Safety: acquired above on this thread and not yet released.
        unsafe { self.release() };

        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Push a value onto the stack.
    pub fn push(&self, value: T) {
        let node = NodeChain::allocate(value);
        self.locked(|chain| {
            chain.link(node);
            self.counter.record();
        });
    }

    /// Pop a value from the stack.
    ///
    /// Returns `None` if the stack is empty.
    pub fn pop(&self) -> Option<T> {
        let node = self.locked(|chain| {
            let node = chain.unlink();
            self.counter.record();
            node
        });
        node.map(|n| n.into_value())
    }

    /// Completed push and pop attempts.
    #[must_use]
    pub fn operation_count(&self) -> u64 {
        self.counter.get()
    }

    /// Check if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked(|chain| chain.is_empty())
    }
}

impl<T: Clone> Snapshot<T> for FineLockedStack<T> {
    fn snapshot(&self) -> Vec<T> {
        self.locked(|chain| chain.values().cloned().collect())
    }
}

impl<T> Default for FineLockedStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Safety: the chain is only reached through `locked`, which serializes all
// access, so sharing the stack is as safe as sending its values.
unsafe impl<T: Send> Sync for FineLockedStack<T> {}

impl<T: Send> ConcurrentStack<T> for FineLockedStack<T> {
    fn push(&self, value: T) {
        FineLockedStack::push(self, value);
    }

    fn pop(&self) -> Option<T> {
        FineLockedStack::pop(self)
    }

    fn operation_count(&self) -> u64 {
        FineLockedStack::operation_count(self)
    }

    fn is_empty(&self) -> bool {
        FineLockedStack::is_empty(self)
    }

    fn strategy(&self) -> &'static str {
        "fine"
    }
}
