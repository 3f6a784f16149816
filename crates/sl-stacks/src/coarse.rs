//! Coarse-locked stack: one scoped lock around every operation.

use parking_lot::Mutex;

use sl_core::{ConcurrentStack, OperationCounter};

use crate::node::NodeChain;
use crate::Snapshot;

/// Stack serialized by a single mutex.
///
/// The lock guard's scope is the critical section. It covers the whole
/// operation including the counter update, so no two threads ever run a
/// method body at the same time. This is the throughput baseline.
pub struct CoarseLockedStack<T> {
    chain: Mutex<NodeChain<T>>,
    counter: OperationCounter,
}

impl<T> CoarseLockedStack<T> {
    /// Create a new empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain: Mutex::new(NodeChain::new()),
            counter: OperationCounter::new(),
        }
    }

    /// Push a value onto the stack.
    pub fn push(&self, value: T) {
        let node = NodeChain::allocate(value);
        let mut chain = self.chain.lock();
        chain.link(node);
        self.counter.record();
    }

    /// Pop a value from the stack.
    ///
    /// Returns `None` if the stack is empty.
    pub fn pop(&self) -> Option<T> {
        let node = {
            let mut chain = self.chain.lock();
            let node = chain.unlink();
            self.counter.record();
            node
        };
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
        self.chain.lock().is_empty()
    }
}

impl<T: Clone> Snapshot<T> for CoarseLockedStack<T> {
    fn snapshot(&self) -> Vec<T> {
        self.chain.lock().values().cloned().collect()
    }
}

impl<T> Default for CoarseLockedStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> ConcurrentStack<T> for CoarseLockedStack<T> {
    fn push(&self, value: T) {
        CoarseLockedStack::push(self, value);
    }

    fn pop(&self) -> Option<T> {
        CoarseLockedStack::pop(self)
    }

    fn operation_count(&self) -> u64 {
        CoarseLockedStack::operation_count(self)
    }

    fn is_empty(&self) -> bool {
        CoarseLockedStack::is_empty(self)
    }

    fn strategy(&self) -> &'static str {
        "coarse"
    }
}
