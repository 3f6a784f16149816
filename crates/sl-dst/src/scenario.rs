//! Scripted scenarios and cross-variant equivalence.
//!
//! A scenario is a fixed list of pushes and pops replayed on one thread.
//! Because nothing races, every variant must produce exactly the same pop
//! results and the same operation count; any divergence is a bug in one of
//! them.

use sl_core::{ConcurrentStack, PropertyChecker, PropertyResult, StackPropertyChecker};
use sl_stacks::{CoarseLockedStack, FineLockedStack, LockFreeStack, Snapshot, TrackedStack};

use crate::random::DeterministicRng;

/// DST operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstOp {
    Push(u64),
    Pop,
}

/// Generate `count` operations, each a push with probability
/// `push_probability`. Pushed values are distinct and nonzero.
#[must_use]
pub fn generate_ops(rng: &mut DeterministicRng, count: usize, push_probability: f64) -> Vec<DstOp> {
    let mut values: Vec<u64> = (1..=count as u64).collect();
    rng.shuffle(&mut values);
    let mut values = values.into_iter();

    (0..count)
        .map(|_| {
            if rng.gen_bool(push_probability) {
                // At most `count` pushes, so the supply never runs out.
                values.next().map_or(DstOp::Pop, DstOp::Push)
            } else {
                DstOp::Pop
            }
        })
        .collect()
}

/// Outcome of replaying a scenario on one variant.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub strategy: &'static str,
    pub seed: u64,
    /// Result of every pop, in order.
    pub observations: Vec<Option<u64>>,
    pub operations_count: u64,
    pub properties: Vec<PropertyResult>,
}

impl ScenarioResult {
    /// Whether every invariant held.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.properties.iter().all(|p| p.holds)
    }

    pub fn format(&self) -> String {
        let status = if self.passed() { "PASS" } else { "FAIL" };
        let mut result = format!(
            "[{}] {} DST_SEED={} ops={} pops={}",
            status,
            self.strategy,
            self.seed,
            self.operations_count,
            self.observations.len()
        );

        for violated in self.properties.iter().filter(|p| !p.holds) {
            result.push_str(&format!("\n  VIOLATION: {violated}"));
        }

        result
    }
}

/// Replay `ops` on `stack` and check its invariants at the end.
pub fn run_scenario<S>(seed: u64, stack: S, ops: &[DstOp]) -> ScenarioResult
where
    S: ConcurrentStack<u64> + Snapshot<u64>,
{
    let tracked = TrackedStack::new(stack);
    let mut observations = Vec::new();

    for op in ops {
        match *op {
            DstOp::Push(v) => tracked.push(v),
            DstOp::Pop => observations.push(tracked.pop()),
        }
    }

    let properties = StackPropertyChecker::new(&tracked).with_seed(seed).check_all();

    ScenarioResult {
        strategy: tracked.strategy(),
        seed,
        observations,
        operations_count: tracked.operation_count(),
        properties,
    }
}

/// Outcome of replaying one scenario on all three variants.
#[derive(Debug, Clone)]
pub struct EquivalenceResult {
    pub results: Vec<ScenarioResult>,
    /// First pair of variants whose observations differ.
    pub divergence: Option<String>,
}

impl EquivalenceResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.divergence.is_none() && self.results.iter().all(ScenarioResult::passed)
    }

    pub fn format(&self) -> String {
        let mut lines: Vec<String> = self.results.iter().map(ScenarioResult::format).collect();
        if let Some(ref divergence) = self.divergence {
            lines.push(format!("  DIVERGENCE: {divergence}"));
        }
        lines.join("\n")
    }
}

/// Replay `ops` on every variant and compare what they observed.
#[must_use]
pub fn run_equivalence(seed: u64, ops: &[DstOp]) -> EquivalenceResult {
    let results = vec![
        run_scenario(seed, CoarseLockedStack::new(), ops),
        run_scenario(seed, FineLockedStack::new(), ops),
        run_scenario(seed, LockFreeStack::new(), ops),
    ];

    let reference = &results[0];
    let divergence = results[1..].iter().find_map(|other| {
        if other.operations_count != reference.operations_count {
            return Some(format!(
                "{} counted {} operations, {} counted {}",
                reference.strategy, reference.operations_count, other.strategy, other.operations_count
            ));
        }
        reference
            .observations
            .iter()
            .zip(&other.observations)
            .position(|(a, b)| a != b)
            .map(|i| {
                format!(
                    "pop #{}: {} returned {:?}, {} returned {:?}",
                    i, reference.strategy, reference.observations[i], other.strategy, other.observations[i]
                )
            })
    });

    EquivalenceResult { results, divergence }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_scenario() {
        let ops = vec![
            DstOp::Push(100),
            DstOp::Push(200),
            DstOp::Pop,
            DstOp::Push(300),
            DstOp::Pop,
            DstOp::Pop,
            DstOp::Pop,
        ];

        let result = run_scenario(12345, LockFreeStack::new(), &ops);

        assert!(result.passed(), "DST failed: {}", result.format());
        assert_eq!(result.observations, vec![Some(200), Some(300), Some(100), None]);
        assert_eq!(result.operations_count, 7);
    }

    #[test]
    fn test_generated_ops_are_deterministic() {
        let a = generate_ops(&mut DeterministicRng::new(42), 200, 0.5);
        let b = generate_ops(&mut DeterministicRng::new(42), 200, 0.5);
        assert_eq!(a, b);

        let mut pushed: Vec<u64> = a
            .iter()
            .filter_map(|op| match op {
                DstOp::Push(v) => Some(*v),
                DstOp::Pop => None,
            })
            .collect();
        let pushes = pushed.len();
        pushed.sort_unstable();
        pushed.dedup();
        assert_eq!(pushed.len(), pushes, "pushed values must be distinct");
        assert!(pushed.iter().all(|&v| v != 0));
    }

    #[test]
    fn test_equivalence_on_generated_ops() {
        let mut rng = DeterministicRng::new(7);
        let ops = generate_ops(&mut rng, 1000, 0.55);

        let result = run_equivalence(7, &ops);
        assert!(result.passed(), "{}", result.format());
        assert_eq!(result.results.len(), 3);
    }
}
