//! # sl-stacks
//!
//! Three thread-safe LIFO stacks with the same contract and different
//! synchronization strategies.
//!
//! - `coarse`: one `parking_lot::Mutex`, critical section scoped by the guard
//! - `fine`: a raw lock acquired and released by hand on every exit path
//! - `lock_free`: Treiber stack, CAS on `head` with backoff, epoch-based GC
//! - `tracked`: wrapper that records history for invariant checking
//!
//! All three implement [`sl_core::ConcurrentStack`] and count every
//! completed push and pop, including pops that find the stack empty.

mod node;

pub mod coarse;
pub mod fine;
pub mod lock_free;
pub mod tracked;

pub use coarse::CoarseLockedStack;
pub use fine::FineLockedStack;
pub use lock_free::LockFreeStack;
pub use tracked::TrackedStack;

/// Copy of the current contents, top first.
///
/// Intended for verification at quiescent points. Under concurrent
/// mutation the result is memory-safe but may not match any single
/// linearization point.
pub trait Snapshot<T> {
    fn snapshot(&self) -> Vec<T>;
}
