//! Selecting a stack strategy by name.

use clap::ValueEnum;
use serde::Serialize;

use sl_stacks::{CoarseLockedStack, FineLockedStack, LockFreeStack};

use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::harness;
use crate::report::BenchReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StackKind {
    /// One mutex guarding the whole stack.
    Coarse,
    /// A raw lock taken and released around each operation.
    Fine,
    /// Treiber stack with epoch-based reclamation.
    LockFree,
}

impl StackKind {
    pub const ALL: [StackKind; 3] = [StackKind::Coarse, StackKind::Fine, StackKind::LockFree];

    /// Run the benchmark on a fresh, empty stack of this kind.
    pub fn run(self, config: &BenchConfig) -> Result<BenchReport, BenchError> {
        match self {
            StackKind::Coarse => harness::run(&CoarseLockedStack::<u64>::new(), config),
            StackKind::Fine => harness::run(&FineLockedStack::<u64>::new(), config),
            StackKind::LockFree => harness::run(&LockFreeStack::<u64>::new(), config),
        }
    }
}

/// Run each kind in turn with the same configuration. Stops at the first
/// failed run.
pub fn run_all(config: &BenchConfig) -> Result<Vec<BenchReport>, BenchError> {
    StackKind::ALL.iter().map(|kind| kind.run(config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_strategy_name() {
        let config = BenchConfig {
            duration: std::time::Duration::from_millis(20),
            ..BenchConfig::quick()
        };

        for kind in StackKind::ALL {
            let report = kind.run(&config).unwrap();
            let name = kind.to_possible_value().unwrap();
            assert_eq!(report.strategy, name.get_name());
        }
    }
}
