//! # sl-core
//!
//! Core types shared by every stack variant and every driver.
//!
//! This crate provides:
//! - `ConcurrentStack`, the push/pop/count capability set the harness and
//!   the DST runner drive
//! - `OperationCounter` for counting completed operations
//! - `PropertyResult` and `PropertyChecker` for verifying invariants
//! - `StackProperties` and `StackPropertyChecker` for the stack invariants

pub mod counter;
pub mod invariants;
pub mod property;
pub mod stack;

pub use counter::OperationCounter;
pub use invariants::{StackHistory, StackOpType, StackOperation, StackProperties, StackPropertyChecker};
pub use property::{PropertyChecker, PropertyResult};
pub use stack::ConcurrentStack;
