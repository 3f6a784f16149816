//! Timed concurrent push/pop benchmark.
//!
//! One run looks like this:
//!
//! ```text
//!   prefill ──> spawn pushers + poppers ──> open window ──> sleep(duration)
//!                                                               │
//!   report <── drain + checks <── join all workers <── raise stop flag
//! ```
//!
//! The harness only sees the stack through [`ConcurrentStack`], so the same
//! code drives every strategy.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use sl_core::ConcurrentStack;

use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::report::BenchReport;

/// What a worker thread does in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerRole {
    Pusher,
    Popper,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Pusher => f.write_str("pusher"),
            WorkerRole::Popper => f.write_str("popper"),
        }
    }
}

/// Operations completed by one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTally {
    pub pushes: u64,
    pub pops: u64,
    pub empty_pops: u64,
}

impl WorkerTally {
    fn total(&self) -> u64 {
        self.pushes + self.pops + self.empty_pops
    }
}

impl std::ops::AddAssign for WorkerTally {
    fn add_assign(&mut self, rhs: Self) {
        self.pushes += rhs.pushes;
        self.pops += rhs.pops;
        self.empty_pops += rhs.empty_pops;
    }
}

/// Flags shared by the driver and every worker.
struct Signals {
    /// Raised once all workers exist, so they start together.
    go: AtomicBool,
    stop: AtomicBool,
}

impl Signals {
    fn wait_for_go(&self) {
        while !self.go.load(Ordering::Acquire) {
            thread::yield_now();
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Per-worker value stream. Derived from the run seed so a seeded run
/// pushes the same values in each worker.
fn worker_rng(seed: u64, role: WorkerRole, index: usize) -> StdRng {
    let salt: u64 = match role {
        WorkerRole::Pusher => 0x9E37_79B9_7F4A_7C15,
        WorkerRole::Popper => 0xC2B2_AE3D_27D4_EB4F,
    };
    StdRng::seed_from_u64(seed ^ salt.wrapping_mul(index as u64 + 1))
}

fn push_loop<S>(stack: &S, signals: &Signals, mut rng: StdRng) -> WorkerTally
where
    S: ConcurrentStack<u64> + ?Sized,
{
    let mut tally = WorkerTally::default();
    signals.wait_for_go();
    while !signals.stopped() {
        stack.push(rng.gen());
        tally.pushes += 1;
    }
    tally
}

fn pop_loop<S>(stack: &S, signals: &Signals) -> WorkerTally
where
    S: ConcurrentStack<u64> + ?Sized,
{
    let mut tally = WorkerTally::default();
    signals.wait_for_go();
    while !signals.stopped() {
        match stack.pop() {
            Some(_) => tally.pops += 1,
            None => tally.empty_pops += 1,
        }
    }
    tally
}

type Worker<'scope> = (WorkerRole, usize, ScopedJoinHandle<'scope, WorkerTally>);

fn spawn_workers<'scope, 'env, S>(
    scope: &'scope Scope<'scope, 'env>,
    stack: &'env S,
    signals: &'env Signals,
    config: &BenchConfig,
    seed: u64,
    workers: &mut Vec<Worker<'scope>>,
) -> Result<(), BenchError>
where
    S: ConcurrentStack<u64> + ?Sized,
{
    for index in 0..config.pushers {
        let rng = worker_rng(seed, WorkerRole::Pusher, index);
        let handle = thread::Builder::new()
            .name(format!("pusher-{index}"))
            .spawn_scoped(scope, move || push_loop(stack, signals, rng))?;
        workers.push((WorkerRole::Pusher, index, handle));
    }

    for index in 0..config.poppers {
        let handle = thread::Builder::new()
            .name(format!("popper-{index}"))
            .spawn_scoped(scope, move || pop_loop(stack, signals))?;
        workers.push((WorkerRole::Popper, index, handle));
    }

    Ok(())
}

/// Join every worker, summing tallies. All handles are joined even after
/// a failure so the scope never has to re-raise a worker panic.
fn join_workers(workers: Vec<Worker<'_>>) -> Result<WorkerTally, BenchError> {
    let mut total = WorkerTally::default();
    let mut failure = None;

    for (role, index, handle) in workers {
        match handle.join() {
            Ok(tally) => {
                debug!(%role, index, operations = tally.total(), "worker finished");
                total += tally;
            }
            Err(_) => {
                warn!(%role, index, "worker panicked");
                failure.get_or_insert(BenchError::WorkerPanicked { role, index });
            }
        }
    }

    match failure {
        Some(error) => Err(error),
        None => Ok(total),
    }
}

/// Drive `stack` with `config.pushers` pushers and `config.poppers`
/// poppers for `config.duration`, then report.
///
/// The reported operation count covers the timed window only: the prefill
/// is excluded and so is the final drain.
pub fn run<S>(stack: &S, config: &BenchConfig) -> Result<BenchReport, BenchError>
where
    S: ConcurrentStack<u64> + ?Sized,
{
    config.validate()?;

    let strategy = stack.strategy();
    let seed = config.seed.unwrap_or_else(rand::random);

    let mut prefill_rng = StdRng::seed_from_u64(seed);
    for _ in 0..config.prefill {
        stack.push(prefill_rng.gen());
    }
    let baseline = stack.operation_count();

    debug!(
        strategy,
        seed,
        pushers = config.pushers,
        poppers = config.poppers,
        prefill = config.prefill,
        duration_ms = config.duration.as_millis() as u64,
        "starting benchmark"
    );

    let signals = Signals {
        go: AtomicBool::new(false),
        stop: AtomicBool::new(false),
    };

    let (tally, elapsed) = thread::scope(|scope| {
        let mut workers = Vec::with_capacity(config.pushers + config.poppers);
        let spawned = spawn_workers(scope, stack, &signals, config, seed, &mut workers);

        let started = Instant::now();
        signals.go.store(true, Ordering::Release);
        if spawned.is_ok() {
            thread::sleep(config.duration);
        }
        signals.stop.store(true, Ordering::Relaxed);

        let joined = join_workers(workers);
        let elapsed = started.elapsed();
        debug!(strategy, elapsed_ms = elapsed.as_millis() as u64, "all workers joined");

        spawned?;
        Ok::<_, BenchError>((joined?, elapsed))
    })?;

    let operations = stack.operation_count() - baseline;
    let remaining = std::iter::from_fn(|| stack.pop()).count() as u64;

    let report = BenchReport::new(strategy, config, seed, elapsed, operations, tally, remaining);

    if !report.counter_consistent {
        warn!(
            strategy,
            counted = report.operations,
            tallied = tally.total(),
            "operation counter disagrees with worker tallies"
        );
    }
    if !report.conserved {
        warn!(
            strategy,
            prefill = config.prefill,
            pushes = tally.pushes,
            pops = tally.pops,
            remaining,
            "elements were lost or duplicated"
        );
    }

    info!(
        strategy,
        operations = report.operations,
        ops_per_sec = report.ops_per_sec,
        conserved = report.conserved,
        "benchmark finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use sl_stacks::{CoarseLockedStack, FineLockedStack, LockFreeStack};

    fn tiny() -> BenchConfig {
        BenchConfig {
            duration: Duration::from_millis(50),
            prefill: 100,
            seed: Some(7),
            ..BenchConfig::quick()
        }
    }

    #[test]
    fn test_run_reports_consistent_counts() {
        let stack = LockFreeStack::<u64>::new();
        let report = run(&stack, &tiny()).unwrap();

        assert_eq!(report.strategy, "lock-free");
        assert!(report.operations > 0);
        assert!(report.counter_consistent, "{report}");
        assert!(report.conserved, "{report}");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_same_harness_drives_every_variant() {
        let config = tiny();
        let stacks: [Box<dyn ConcurrentStack<u64>>; 3] = [
            Box::new(CoarseLockedStack::<u64>::new()),
            Box::new(FineLockedStack::<u64>::new()),
            Box::new(LockFreeStack::<u64>::new()),
        ];

        for stack in &stacks {
            let report = run(stack.as_ref(), &config).unwrap();
            assert!(report.counter_consistent && report.conserved, "{report}");
        }
    }

    #[test]
    fn test_prefill_excluded_from_window() {
        let config = BenchConfig {
            pushers: 0,
            poppers: 1,
            prefill: 10_000,
            ..tiny()
        };
        let stack = CoarseLockedStack::<u64>::new();
        let report = run(&stack, &config).unwrap();

        assert_eq!(report.pushes, 0);
        assert_eq!(report.operations, report.pops + report.empty_pops);
        assert_eq!(report.pops + report.remaining, 10_000);
        assert!(report.conserved);
    }

    #[test]
    fn test_worker_streams_are_seeded_and_distinct() {
        let mut a = worker_rng(7, WorkerRole::Pusher, 0);
        let mut again = worker_rng(7, WorkerRole::Pusher, 0);
        let mut b = worker_rng(7, WorkerRole::Pusher, 1);

        let first: u64 = a.gen();
        assert_eq!(first, again.gen::<u64>());
        assert_ne!(first, b.gen::<u64>());
    }

    #[test]
    fn test_invalid_config_rejected_before_touching_stack() {
        let stack = LockFreeStack::<u64>::new();
        let config = BenchConfig {
            duration: Duration::ZERO,
            ..tiny()
        };

        assert!(matches!(run(&stack, &config), Err(BenchError::InvalidConfig(_))));
        assert_eq!(stack.operation_count(), 0);
    }

    /// A stack whose pop panics, to exercise the fatal-abort path.
    struct PanickingStack(LockFreeStack<u64>);

    impl ConcurrentStack<u64> for PanickingStack {
        fn push(&self, value: u64) {
            self.0.push(value);
        }

        fn pop(&self) -> Option<u64> {
            panic!("pop is broken");
        }

        fn operation_count(&self) -> u64 {
            self.0.operation_count()
        }

        fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        fn strategy(&self) -> &'static str {
            "panicking"
        }
    }

    #[test]
    fn test_worker_panic_aborts_run() {
        let stack = PanickingStack(LockFreeStack::new());
        let config = BenchConfig {
            pushers: 1,
            poppers: 1,
            prefill: 0,
            ..tiny()
        };

        match run(&stack, &config) {
            Err(BenchError::WorkerPanicked { role, index }) => {
                assert_eq!(role, WorkerRole::Popper);
                assert_eq!(index, 0);
            }
            other => panic!("expected worker panic, got {other:?}"),
        }
    }
}
