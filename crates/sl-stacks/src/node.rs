//! Singly-linked node chain shared by the lock-based stacks.
//!
//! A `NodeChain` has no synchronization of its own. The locked stacks wrap
//! it and only touch it while holding their lock, which is what makes
//! reassigning `next` safe there. The lock-free stack has its own node type
//! in `lock_free.rs` because its links must be atomic.

/// Owning link to the next node.
pub(crate) type Link<T> = Option<Box<Node<T>>>;

/// A value plus its successor.
pub(crate) struct Node<T> {
    value: T,
    next: Link<T>,
}

/// The node chain reachable from a stack's head, top first.
pub(crate) struct NodeChain<T> {
    head: Link<T>,
}

impl<T> NodeChain<T> {
    pub(crate) const fn new() -> Self {
        Self { head: None }
    }

    /// Allocate a detached node. Done outside the lock so the critical
    /// section never allocates.
    pub(crate) fn allocate(value: T) -> Box<Node<T>> {
        Box::new(Node { value, next: None })
    }

    /// Link a detached node in as the new head.
    pub(crate) fn link(&mut self, mut node: Box<Node<T>>) {
        debug_assert!(node.next.is_none(), "node already linked");
        node.next = self.head.take();
        self.head = Some(node);
    }

    /// Unlink the head node, handing it to the caller.
    pub(crate) fn unlink(&mut self) -> Option<Box<Node<T>>> {
        let mut node = self.head.take()?;
        self.head = node.next.take();
        Some(node)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Values from top to bottom.
    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        std::iter::successors(self.head.as_deref(), |node| node.next.as_deref())
            .map(|node| &node.value)
    }
}

impl<T> Node<T> {
    /// Consume a detached node, returning its value.
    pub(crate) fn into_value(self: Box<Self>) -> T {
        debug_assert!(self.next.is_none(), "node still linked");
        self.value
    }
}

impl<T> Drop for NodeChain<T> {
    // Unlink iteratively; the default recursive drop of a Box chain would
    // overflow the thread stack for long chains.
    fn drop(&mut self) {
        let mut current = self.head.take();
        while let Some(mut node) = current {
            current = node.next.take();
        }
    }
}
