//! DST test harness for running reproducible interleavings.
//!
//! The harness provides a structured way to run DST tests with:
//! - Configurable number of simulated threads
//! - Deterministic scheduling
//! - Invariant checking at a fixed interval
//!
//! Simulated threads are scripts executed on the calling OS thread. The
//! scheduler picks which script advances next, so a given seed always
//! produces the same interleaving and the recorded history is a valid
//! linearization.

use sl_core::{ConcurrentStack, PropertyChecker, StackPropertyChecker};
use sl_stacks::{Snapshot, TrackedStack};

use crate::random::DeterministicRng;

/// Configuration for DST test harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Number of threads to simulate
    pub threads_count: usize,
    /// Number of operations per thread
    pub operations_per_thread: u64,
    /// Probability of a context switch after each operation
    pub yield_probability: f64,
    /// Probability that a given operation is a push
    pub push_probability: f64,
    /// Check invariants after every N operations (0 = only at the end)
    pub invariant_check_interval: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            threads_count: 4,
            operations_per_thread: 100,
            yield_probability: 0.2,
            push_probability: 0.5,
            invariant_check_interval: 10,
        }
    }
}

impl HarnessConfig {
    /// Configuration for stress testing.
    #[must_use]
    pub fn stress() -> Self {
        Self {
            threads_count: 8,
            operations_per_thread: 1000,
            yield_probability: 0.3,
            push_probability: 0.55,
            invariant_check_interval: 100,
        }
    }

    /// Configuration for quick testing.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            threads_count: 2,
            operations_per_thread: 50,
            yield_probability: 0.1,
            push_probability: 0.5,
            invariant_check_interval: 10,
        }
    }
}

/// Result of running the harness.
#[derive(Debug, Clone)]
pub struct HarnessResult {
    /// Seed used for reproduction
    pub seed: u64,
    /// Stack strategy under test
    pub strategy: &'static str,
    /// Total operations executed
    pub operations_count: u64,
    /// Value of the stack's own counter at the end
    pub stack_operation_count: u64,
    /// Context switches that occurred
    pub context_switches_count: u64,
    /// Invariant checks performed
    pub invariant_checks_count: u64,
    /// Whether all invariants held
    pub all_invariants_held: bool,
    /// First violation (if any)
    pub first_violation: Option<String>,
}

/// DST test harness.
///
/// Given the same seed, the same interleaving is produced.
pub struct DstHarness {
    rng: DeterministicRng,
    config: HarnessConfig,
    current: usize,
    next_value: u64,
    operations_count: u64,
    context_switches_count: u64,
    invariant_checks_count: u64,
}

impl DstHarness {
    /// Create a new harness with the given seed and config.
    pub fn new(seed: u64, config: HarnessConfig) -> Self {
        debug_assert!(config.threads_count > 0, "Must have at least one thread");
        debug_assert!(
            config.threads_count <= 64,
            "Too many threads for DST: {}",
            config.threads_count
        );

        Self {
            rng: DeterministicRng::new(seed),
            config,
            current: 0,
            next_value: 1,
            operations_count: 0,
            context_switches_count: 0,
            invariant_checks_count: 0,
        }
    }

    /// Get the seed for reproduction.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Maybe switch to another unfinished thread.
    fn yield_point(&mut self, steps: &[u64]) {
        let ops_per_thread = self.config.operations_per_thread;
        let current_done = steps[self.current] >= ops_per_thread;

        if !current_done && !self.rng.gen_bool(self.config.yield_probability) {
            return;
        }

        let runnable: Vec<usize> = (0..steps.len())
            .filter(|&t| t != self.current && steps[t] < ops_per_thread)
            .collect();

        if runnable.is_empty() {
            return;
        }

        let pick = self.rng.gen_range(0..runnable.len());
        self.current = runnable[pick];
        self.context_switches_count += 1;
    }

    fn should_check_invariants(&self) -> bool {
        let interval = self.config.invariant_check_interval;
        interval != 0 && self.operations_count % interval == 0
    }

    /// Rewind to the state `new` left: same schedule, same values, zeroed
    /// counts.
    fn reset(&mut self) {
        self.rng = DeterministicRng::new(self.rng.seed());
        self.current = 0;
        self.next_value = 1;
        self.operations_count = 0;
        self.context_switches_count = 0;
        self.invariant_checks_count = 0;
    }

    /// Run the simulated threads against `stack`.
    ///
    /// Each step the current thread pushes a fresh value or pops, then the
    /// scheduler may switch threads. When every thread has finished, the
    /// stack is drained and the invariants are checked one last time.
    pub fn run<S>(&mut self, stack: S) -> HarnessResult
    where
        S: ConcurrentStack<u64> + Snapshot<u64>,
    {
        let tracked = TrackedStack::new(stack);
        let seed = self.seed();
        self.reset();
        let threads_count = self.config.threads_count;
        let ops_per_thread = self.config.operations_per_thread;

        let mut thread_steps: Vec<u64> = vec![0; threads_count];
        let mut violation: Option<String> = None;

        while thread_steps.iter().any(|&s| s < ops_per_thread) {
            let current = self.current;

            if thread_steps[current] < ops_per_thread {
                if self.rng.gen_bool(self.config.push_probability) {
                    tracked.push(self.next_value);
                    self.next_value += 1;
                } else {
                    tracked.pop();
                }
                thread_steps[current] += 1;
                self.operations_count += 1;

                if self.should_check_invariants() {
                    self.invariant_checks_count += 1;
                    let checker = StackPropertyChecker::new(&tracked).with_seed(seed);
                    if let Some(failed) = checker.first_violation() {
                        violation = Some(format!("Thread {}: {}", current, failed));
                        break;
                    }
                }
            }

            self.yield_point(&thread_steps);
        }

        if violation.is_none() {
            self.operations_count += tracked.drain().len() as u64 + 1;
            self.invariant_checks_count += 1;
            violation = StackPropertyChecker::new(&tracked)
                .with_seed(seed)
                .first_violation()
                .map(|failed| failed.to_string());
        }

        HarnessResult {
            seed,
            strategy: tracked.strategy(),
            operations_count: self.operations_count,
            stack_operation_count: tracked.operation_count(),
            context_switches_count: self.context_switches_count,
            invariant_checks_count: self.invariant_checks_count,
            all_invariants_held: violation.is_none(),
            first_violation: violation,
        }
    }
}

impl HarnessResult {
    /// Format for display.
    pub fn format(&self) -> String {
        let status = if self.all_invariants_held {
            "PASS"
        } else {
            "FAIL"
        };

        let mut result = format!(
            "[{}] {} DST_SEED={} ops={} switches={} checks={}",
            status,
            self.strategy,
            self.seed,
            self.operations_count,
            self.context_switches_count,
            self.invariant_checks_count
        );

        if let Some(ref violation) = self.first_violation {
            result.push_str(&format!("\n  Violation: {}", violation));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_stacks::{CoarseLockedStack, FineLockedStack, LockFreeStack};

    #[test]
    fn test_harness_quick_all_variants() {
        for result in [
            DstHarness::new(12345, HarnessConfig::quick()).run(CoarseLockedStack::new()),
            DstHarness::new(12345, HarnessConfig::quick()).run(FineLockedStack::new()),
            DstHarness::new(12345, HarnessConfig::quick()).run(LockFreeStack::new()),
        ] {
            assert!(result.all_invariants_held, "{}", result.format());
            assert_eq!(result.operations_count, result.stack_operation_count);
        }
    }

    #[test]
    fn test_harness_switches_threads() {
        let config = HarnessConfig {
            threads_count: 3,
            operations_per_thread: 20,
            yield_probability: 0.5,
            ..HarnessConfig::quick()
        };
        let result = DstHarness::new(99, config).run(LockFreeStack::new());

        assert!(result.all_invariants_held, "{}", result.format());
        assert!(result.context_switches_count > 0);
        assert!(result.invariant_checks_count >= 6);
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = DstHarness::new(4242, HarnessConfig::default()).run(CoarseLockedStack::new());
        let b = DstHarness::new(4242, HarnessConfig::default()).run(LockFreeStack::new());

        assert_eq!(a.operations_count, b.operations_count);
        assert_eq!(a.context_switches_count, b.context_switches_count);
    }

    #[test]
    fn test_reused_harness_starts_fresh() {
        let mut harness = DstHarness::new(777, HarnessConfig::quick());
        let first = harness.run(CoarseLockedStack::new());
        let second = harness.run(LockFreeStack::new());

        assert_eq!(second.operations_count, second.stack_operation_count);
        assert_eq!(first.operations_count, second.operations_count);
        assert_eq!(first.context_switches_count, second.context_switches_count);
        assert_eq!(first.invariant_checks_count, second.invariant_checks_count);
        assert!(second.all_invariants_held, "{}", second.format());
    }
}
