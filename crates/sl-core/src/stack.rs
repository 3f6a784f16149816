//! The capability set shared by every stack variant.
//!
//! The benchmark harness and the DST runner only ever talk to a stack
//! through [`ConcurrentStack`], so any variant can be swapped in without
//! touching the driver.

/// A thread-safe LIFO stack.
///
/// # Contract
///
/// - `push` always succeeds. Allocation failure aborts the process.
/// - `pop` returns `None` on an empty stack. This is a normal outcome, not
///   an error, and it leaves the stack unchanged.
/// - Every completed `push` and every completed `pop` (hit or empty)
///   increments [`operation_count`](ConcurrentStack::operation_count) by
///   exactly one.
/// - Operations are linearizable: each takes effect at a single commit
///   point between invocation and return.
pub trait ConcurrentStack<T>: Send + Sync {
    /// Push a value onto the top of the stack.
    fn push(&self, value: T);

    /// Pop the most recently pushed value, or `None` if the stack is empty.
    fn pop(&self) -> Option<T>;

    /// Total completed push and pop attempts since construction.
    fn operation_count(&self) -> u64;

    /// Whether the stack currently holds no elements.
    ///
    /// Under concurrent mutation the answer may be stale by the time the
    /// caller acts on it.
    fn is_empty(&self) -> bool;

    /// Short human-readable name of the synchronization strategy.
    fn strategy(&self) -> &'static str;
}

impl<T, S> ConcurrentStack<T> for &S
where
    S: ConcurrentStack<T> + ?Sized,
{
    fn push(&self, value: T) {
        (**self).push(value);
    }

    fn pop(&self) -> Option<T> {
        (**self).pop()
    }

    fn operation_count(&self) -> u64 {
        (**self).operation_count()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn strategy(&self) -> &'static str {
        (**self).strategy()
    }
}

impl<T, S> ConcurrentStack<T> for std::sync::Arc<S>
where
    S: ConcurrentStack<T> + ?Sized,
{
    fn push(&self, value: T) {
        (**self).push(value);
    }

    fn pop(&self) -> Option<T> {
        (**self).pop()
    }

    fn operation_count(&self) -> u64 {
        (**self).operation_count()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn strategy(&self) -> &'static str {
        (**self).strategy()
    }
}

impl<T, S> ConcurrentStack<T> for Box<S>
where
    S: ConcurrentStack<T> + ?Sized,
{
    fn push(&self, value: T) {
        (**self).push(value);
    }

    fn pop(&self) -> Option<T> {
        (**self).pop()
    }

    fn operation_count(&self) -> u64 {
        (**self).operation_count()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn strategy(&self) -> &'static str {
        (**self).strategy()
    }
}
