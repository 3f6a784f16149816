//! # sl-dst
//!
//! Deterministic Simulation Testing for the stack variants.
//!
//! All behavior is reproducible via a seed: the same seed yields the same
//! operation script and the same simulated interleaving.
//!
//! ## Pieces
//!
//! - `random`: `DeterministicRng`, a seeded generator
//! - `scenario`: scripted push/pop sequences and cross-variant equivalence
//! - `harness`: simulated threads interleaved by a seeded scheduler, with
//!   invariant checks at a fixed interval
//!
//! ## Usage
//!
//! ```rust
//! use sl_dst::{DstHarness, HarnessConfig};
//! use sl_stacks::LockFreeStack;
//!
//! let mut harness = DstHarness::new(12345, HarnessConfig::quick());
//! let result = harness.run(LockFreeStack::new());
//! assert!(result.all_invariants_held, "{}", result.format());
//! ```
//!
//! ## Reproducibility
//!
//! To reproduce a failing test:
//! ```bash
//! DST_SEED=12345 cargo test -p sl-dst
//! ```

pub mod harness;
pub mod random;
pub mod scenario;

pub use harness::{DstHarness, HarnessConfig, HarnessResult};
pub use random::DeterministicRng;
pub use scenario::{generate_ops, run_equivalence, run_scenario, DstOp, EquivalenceResult, ScenarioResult};

/// Default number of iterations when `DST_ITERATIONS` is unset.
const ITERATIONS_DEFAULT: u64 = 1000;

/// Get DST seed from environment or generate random one.
///
/// Prints the seed for reproduction. Use `DST_SEED=<seed>` to reproduce.
/// An unparsable `DST_SEED` is reported and replaced by a random seed.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    match std::env::var("DST_SEED").map(|s| s.parse::<u64>()) {
        Ok(Ok(seed)) => {
            println!("DST_SEED={} (from environment)", seed);
            seed
        }
        Ok(Err(e)) => {
            let seed = rand::random::<u64>();
            println!("DST_SEED ignored ({e}); DST_SEED={} (randomly generated)", seed);
            seed
        }
        Err(_) => {
            let seed = rand::random::<u64>();
            println!("DST_SEED={} (randomly generated)", seed);
            seed
        }
    }
}

/// Iteration budget from `DST_ITERATIONS`, defaulting to 1000.
#[must_use]
pub fn dst_iterations() -> u64 {
    std::env::var("DST_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(ITERATIONS_DEFAULT)
}
