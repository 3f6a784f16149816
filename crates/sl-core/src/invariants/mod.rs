//! Invariant traits for the stack variants.
//!
//! - `stack`: NoLostElements, NoDuplicates, LIFO_Order, CounterMatchesHistory

pub mod stack;

pub use stack::{StackHistory, StackOpType, StackOperation, StackProperties, StackPropertyChecker};
