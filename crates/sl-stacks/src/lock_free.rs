//! Lock-free stack (Treiber, 1986).
//!
//! # Invariants
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | NoLostElements | push retries until its CAS on `head` commits |
//! | NoDuplicates | pop hands a node out only after its own CAS detached it |
//! | LIFO_Order | head is the only mutable pointer, `next` is frozen once linked |
//! | Linearizability | the successful CAS on `head` is the commit point |
//! | ABA_Safety | epoch GC: an address cannot be reused while a reader is pinned |
//!
//! # Memory Safety
//!
//! Every load of `head` or `next` happens under a pinned epoch guard from
//! crossbeam-epoch. A popped node is retired with `defer_destroy` and only
//! freed once every thread that was pinned when it was unlinked has
//! unpinned, so a stale `head` snapshot never points at freed memory.
//!
//! The value lives in a `ManuallyDrop` because ownership of it moves to the
//! popping thread at the commit point, while the node shell is freed later
//! by the collector.

use std::mem::ManuallyDrop;
use std::ptr;
use std::sync::atomic::Ordering;

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};
use crossbeam_utils::Backoff;

use sl_core::{ConcurrentStack, OperationCounter};

use crate::Snapshot;

/// A lock-free Treiber stack.
///
/// Operations are linearizable and lock-free: some thread always makes
/// progress, though a single thread may retry without bound under
/// adversarial contention. No operation ever blocks on another thread.
pub struct LockFreeStack<T> {
    /// Pointer to top node
    head: Atomic<Node<T>>,
    counter: OperationCounter,
}

/// Node in the stack.
struct Node<T> {
    value: ManuallyDrop<T>,
    /// Written only before the node is published.
    next: Atomic<Node<T>>,
}

impl<T> LockFreeStack<T> {
    /// Create a new empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: Atomic::null(),
            counter: OperationCounter::new(),
        }
    }

    /// Push a value onto the stack.
    ///
    /// Retries the CAS until it commits, backing off (spin, then yield)
    /// after each failure.
    pub fn push(&self, value: T) {
        let mut node = Owned::new(Node {
            value: ManuallyDrop::new(value),
            next: Atomic::null(),
        });
        let backoff = Backoff::new();
        let guard = epoch::pin();

        loop {
            let head = self.head.load(Ordering::Relaxed, &guard);

            // The node is still private, so a relaxed store is enough. The
            // release CAS below publishes it together with this link.
            node.next.store(head, Ordering::Relaxed);

            match self.head.compare_exchange(
                head,
                node,
                Ordering::Release,
                Ordering::Relaxed,
                &guard,
            ) {
                Ok(_) => break,
                Err(e) => {
                    // Lost the race: take the node back and relink.
                    node = e.new;
                    backoff.snooze();
                }
            }
        }

        self.counter.record();
    }

    /// Pop a value from the stack.
    ///
    /// Returns `None` if the stack is empty.
    pub fn pop(&self) -> Option<T> {
        let backoff = Backoff::new();
        let guard = epoch::pin();

        loop {
            let head = self.head.load(Ordering::Acquire, &guard);

            // Safety: the guard keeps any node reachable at load time alive.
            let Some(top) = (unsafe { head.as_ref() }) else {
                self.counter.record();
                return None;
            };

            let next = top.next.load(Ordering::Relaxed, &guard);

            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, &guard)
                .is_ok()
            {
                // Safety: our CAS detached `head`, so no other pop can return
                // this value. The shell is freed once all current pins drop,
                // and `ManuallyDrop` keeps the collector from dropping the
                // value a second time.
                let value = unsafe {
                    guard.defer_destroy(head);
                    ManuallyDrop::into_inner(ptr::read(&top.value))
                };
                self.counter.record();
                return Some(value);
            }

            backoff.snooze();
        }
    }

    /// Completed push and pop attempts.
    #[must_use]
    pub fn operation_count(&self) -> u64 {
        self.counter.get()
    }

    /// Check if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let guard = epoch::pin();
        self.head.load(Ordering::Acquire, &guard).is_null()
    }
}

/// Only for `Copy` values: a concurrent pop may already have moved the
/// value out of a node this walk still reaches, and only a plain bit copy
/// of it is safe to take.
///
/// ```compile_fail
/// use sl_stacks::{LockFreeStack, Snapshot};
///
/// let stack = LockFreeStack::<String>::new();
/// let _ = stack.snapshot();
/// ```
impl<T: Copy> Snapshot<T> for LockFreeStack<T> {
    /// Walks the chain under one guard. Memory-safe at any time, but only
    /// a consistent picture when no push or pop runs concurrently.
    fn snapshot(&self) -> Vec<T> {
        let guard = epoch::pin();
        let mut result = Vec::new();
        let mut current = self.head.load(Ordering::Acquire, &guard);

        // Safety: every node reachable under the guard stays allocated.
        while let Some(node) = unsafe { current.as_ref() } {
            result.push(*node.value);
            current = node.next.load(Ordering::Acquire, &guard);
        }

        result
    }
}

impl<T> Default for LockFreeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeStack<T> {
    fn drop(&mut self) {
        // `&mut self` means no other thread can reach the chain anymore.
        // Safety: nodes still linked were never retired, so we own them.
        unsafe {
            let guard = epoch::unprotected();
            let mut current: Shared<'_, Node<T>> = self.head.load(Ordering::Relaxed, guard);
            while !current.is_null() {
                let mut node = current.into_owned();
                current = node.next.load(Ordering::Relaxed, guard);
                ManuallyDrop::drop(&mut node.value);
            }
        }
    }
}

// Safety: values move between threads through push and pop, and the node
// graph is only touched via atomics under epoch protection.
unsafe impl<T: Send> Send for LockFreeStack<T> {}
unsafe impl<T: Send> Sync for LockFreeStack<T> {}

impl<T: Send> ConcurrentStack<T> for LockFreeStack<T> {
    fn push(&self, value: T) {
        LockFreeStack::push(self, value);
    }

    fn pop(&self) -> Option<T> {
        LockFreeStack::pop(self)
    }

    fn operation_count(&self) -> u64 {
        LockFreeStack::operation_count(self)
    }

    fn is_empty(&self) -> bool {
        LockFreeStack::is_empty(self)
    }

    fn strategy(&self) -> &'static str {
        "lock-free"
    }
}
