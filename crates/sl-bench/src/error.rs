//! Benchmark errors.

use thiserror::Error;

use crate::harness::WorkerRole;

/// Why a benchmark run could not produce a report.
///
/// Any worker failure aborts the whole run; there is no partial report.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid benchmark configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{role} worker {index} panicked")]
    WorkerPanicked { role: WorkerRole, index: usize },
}
