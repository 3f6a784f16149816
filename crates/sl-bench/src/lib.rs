//! # sl-bench
//!
//! Throughput benchmark for the stack variants: dedicated pusher and popper
//! threads hammer one shared stack for a fixed window, then the harness
//! reports the operation count, elapsed time and throughput.
//!
//! ```rust,no_run
//! use sl_bench::{BenchConfig, StackKind};
//!
//! let report = StackKind::LockFree.run(&BenchConfig::quick())?;
//! println!("{report}");
//! # Ok::<(), sl_bench::BenchError>(())
//! ```
//!
//! Any [`sl_core::ConcurrentStack<u64>`] can be driven directly with
//! [`run`].

pub mod config;
pub mod error;
pub mod harness;
pub mod kind;
pub mod report;

pub use config::BenchConfig;
pub use error::BenchError;
pub use harness::{run, WorkerRole, WorkerTally};
pub use kind::{run_all, StackKind};
pub use report::{format_table, group_thousands, BenchReport};
