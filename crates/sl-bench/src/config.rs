//! Benchmark configuration.

use std::time::Duration;

use serde::Serialize;

use crate::error::BenchError;

/// Most workers of each role a single run will spawn.
const WORKERS_MAX: usize = 1024;

/// Parameters of one timed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchConfig {
    /// Threads pushing random values in a tight loop.
    pub pushers: usize,
    /// Threads popping in a tight loop.
    pub poppers: usize,
    /// Length of the timed window.
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Values pushed before the window opens, so poppers start with work.
    pub prefill: u64,
    /// Seed for the value generators. `None` draws one per run.
    pub seed: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            pushers: 2,
            poppers: 2,
            duration: Duration::from_secs(10),
            prefill: 100_000,
            seed: None,
        }
    }
}

impl BenchConfig {
    /// Configuration for quick testing.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            pushers: 2,
            poppers: 2,
            duration: Duration::from_millis(200),
            prefill: 1_000,
            seed: None,
        }
    }

    /// Configuration for stress testing.
    #[must_use]
    pub fn stress() -> Self {
        Self {
            pushers: 8,
            poppers: 8,
            duration: Duration::from_secs(30),
            prefill: 1_000_000,
            seed: None,
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.pushers == 0 && self.poppers == 0 {
            return Err(BenchError::InvalidConfig(
                "at least one pusher or popper is required".into(),
            ));
        }
        if self.pushers > WORKERS_MAX || self.poppers > WORKERS_MAX {
            return Err(BenchError::InvalidConfig(format!(
                "at most {WORKERS_MAX} workers per role (got {} pushers, {} poppers)",
                self.pushers, self.poppers
            )));
        }
        if self.duration.is_zero() {
            return Err(BenchError::InvalidConfig("duration must be positive".into()));
        }
        Ok(())
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}
