//! Benchmark results and their human-readable forms.

use std::fmt::{self, Write as _};
use std::time::Duration;

use serde::Serialize;

use crate::config::BenchConfig;
use crate::harness::WorkerTally;

/// Outcome of one timed run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub strategy: &'static str,
    pub pushers: usize,
    pub poppers: usize,
    pub prefill: u64,
    pub seed: u64,
    /// Wall time from opening the window until every worker was joined.
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Counter delta across the window, empty pops included.
    pub operations: u64,
    pub pushes: u64,
    pub pops: u64,
    pub empty_pops: u64,
    /// Elements left on the stack after the workers were joined.
    pub remaining: u64,
    pub ops_per_sec: f64,
    /// `prefill + pushes == pops + remaining`
    pub conserved: bool,
    /// `operations == pushes + pops + empty_pops`
    pub counter_consistent: bool,
}

impl BenchReport {
    pub(crate) fn new(
        strategy: &'static str,
        config: &BenchConfig,
        seed: u64,
        elapsed: Duration,
        operations: u64,
        tally: WorkerTally,
        remaining: u64,
    ) -> Self {
        let secs = elapsed.as_secs_f64();
        let ops_per_sec = if secs > 0.0 {
            operations as f64 / secs
        } else {
            0.0
        };

        Self {
            strategy,
            pushers: config.pushers,
            poppers: config.poppers,
            prefill: config.prefill,
            seed,
            elapsed,
            operations,
            pushes: tally.pushes,
            pops: tally.pops,
            empty_pops: tally.empty_pops,
            remaining,
            ops_per_sec,
            conserved: config.prefill + tally.pushes == tally.pops + remaining,
            counter_consistent: operations == tally.pushes + tally.pops + tally.empty_pops,
        }
    }

    /// True when both post-run checks held.
    pub fn passed(&self) -> bool {
        self.conserved && self.counter_consistent
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} operations were performed in {:.2} seconds",
            group_thousands(self.operations),
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "  {}: {} ops/sec ({} pushers, {} poppers)",
            self.strategy,
            group_thousands(self.ops_per_sec as u64),
            self.pushers,
            self.poppers
        )?;
        writeln!(
            f,
            "  pushes {}, pops {}, empty pops {}, remaining {}",
            group_thousands(self.pushes),
            group_thousands(self.pops),
            group_thousands(self.empty_pops),
            group_thousands(self.remaining)
        )?;
        write!(
            f,
            "  conserved: {}, counter consistent: {}",
            self.conserved, self.counter_consistent
        )
    }
}

/// Side-by-side comparison of several runs.
pub fn format_table(reports: &[BenchReport]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:>16} {:>14} {:>9} {:>6}",
        "strategy", "operations", "ops/sec", "secs", "ok"
    );
    let _ = writeln!(out, "{}", "-".repeat(59));
    for r in reports {
        let _ = writeln!(
            out,
            "{:<10} {:>16} {:>14} {:>9.2} {:>6}",
            r.strategy,
            group_thousands(r.operations),
            group_thousands(r.ops_per_sec as u64),
            r.elapsed.as_secs_f64(),
            if r.passed() { "yes" } else { "NO" }
        );
    }
    out
}

/// `1234567` -> `"1,234,567"`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
