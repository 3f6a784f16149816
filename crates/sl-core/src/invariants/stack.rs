//! Stack invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | NoLostElements | Every pushed element is still in the stack or was popped |
//! | NoDuplicates | No element is observed more often than it was pushed |
//! | LIFO_Order | Replaying a sequential history against a model stack matches |
//! | CounterMatchesHistory | The operation counter equals the number of recorded operations |
//!
//! Elements are compared as multisets so that workloads which push the same
//! value twice are still checked exactly.

use std::collections::HashMap;

use crate::property::{PropertyChecker, PropertyResult};

/// State a stack exposes so its invariants can be checked.
pub trait StackProperties {
    /// Every element pushed so far, with repetition.
    fn pushed_elements(&self) -> Vec<u64>;

    /// Every element popped so far, with repetition.
    fn popped_elements(&self) -> Vec<u64>;

    /// Elements still held by the stack (top to bottom).
    fn current_contents(&self) -> Vec<u64>;

    /// Operation history for LIFO order checking.
    /// Returns owned data to avoid lifetime issues with internal mutexes.
    fn history(&self) -> StackHistory;

    /// Value of the stack's own operation counter.
    fn operation_count(&self) -> u64;
}

/// History of stack operations in completion order.
#[derive(Debug, Clone, Default)]
pub struct StackHistory {
    /// Recorded operations, ordered by `step`.
    pub operations: Vec<StackOperation>,
}

/// A single stack operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOperation {
    /// Thread that performed the operation
    pub thread_id: u64,
    /// Type of operation
    pub op_type: StackOpType,
    /// Element involved (pushed value, or pop result)
    pub element: Option<u64>,
    /// Step number for ordering
    pub step: u64,
}

/// Type of stack operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOpType {
    Push,
    Pop,
    PopEmpty,
}

impl StackHistory {
    /// Create a new empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Record a push operation.
    pub fn record_push(&mut self, thread_id: u64, element: u64, step: u64) {
        debug_assert!(step > 0, "Step must be positive");
        self.operations.push(StackOperation {
            thread_id,
            op_type: StackOpType::Push,
            element: Some(element),
            step,
        });
    }

    /// Record a pop operation.
    pub fn record_pop(&mut self, thread_id: u64, element: Option<u64>, step: u64) {
        debug_assert!(step > 0, "Step must be positive");
        self.operations.push(StackOperation {
            thread_id,
            op_type: if element.is_some() {
                StackOpType::Pop
            } else {
                StackOpType::PopEmpty
            },
            element,
            step,
        });
    }

    /// Number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// True when every operation came from the same thread.
    ///
    /// Only a sequential history has a completion order that is also its
    /// linearization order.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        match self.operations.first() {
            None => true,
            Some(first) => self
                .operations
                .iter()
                .all(|op| op.thread_id == first.thread_id),
        }
    }
}

/// Property checker for stack implementations.
pub struct StackPropertyChecker<'a, T: StackProperties> {
    stack: &'a T,
    dst_seed: Option<u64>,
}

impl<'a, T: StackProperties> StackPropertyChecker<'a, T> {
    /// Create a new checker for the given stack.
    #[must_use]
    pub fn new(stack: &'a T) -> Self {
        Self {
            stack,
            dst_seed: None,
        }
    }

    /// Set DST seed for counterexample reproduction.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.dst_seed = Some(seed);
        self
    }

    fn describe(&self, message: String) -> String {
        match self.dst_seed {
            Some(seed) => format!("{message} (DST_SEED={seed})"),
            None => message,
        }
    }

    /// Per-element balance: pushed count minus (popped + still held) count.
    fn balance(&self) -> HashMap<u64, i64> {
        let mut balance: HashMap<u64, i64> = HashMap::new();
        for element in self.stack.pushed_elements() {
            *balance.entry(element).or_default() += 1;
        }
        for element in self
            .stack
            .popped_elements()
            .into_iter()
            .chain(self.stack.current_contents())
        {
            *balance.entry(element).or_default() -= 1;
        }
        balance
    }

    /// Every element that was pushed must either be in the stack
    /// or have been popped. No elements can be lost.
    fn check_no_lost_elements(&self) -> PropertyResult {
        let mut lost: Vec<u64> = self
            .balance()
            .into_iter()
            .filter(|&(_, b)| b > 0)
            .map(|(element, _)| element)
            .collect();

        if lost.is_empty() {
            return PropertyResult::pass("NoLostElements");
        }

        lost.sort_unstable();
        PropertyResult::fail(
            "NoLostElements",
            self.describe(format!(
                "{} element(s) pushed but neither in stack nor popped, first: {}",
                lost.len(),
                lost[0]
            )),
        )
    }

    /// No element is popped or held more times than it was pushed.
    fn check_no_duplicates(&self) -> PropertyResult {
        let mut extra: Vec<u64> = self
            .balance()
            .into_iter()
            .filter(|&(_, b)| b < 0)
            .map(|(element, _)| element)
            .collect();

        if extra.is_empty() {
            return PropertyResult::pass("NoDuplicates");
        }

        extra.sort_unstable();
        PropertyResult::fail(
            "NoDuplicates",
            self.describe(format!(
                "element {} observed more often than it was pushed",
                extra[0]
            )),
        )
    }

    /// The stack maintains last-in-first-out ordering.
    /// This is verified by replaying the operation history against
    /// a model stack and checking that pop results match.
    ///
    /// A history recorded by several threads is ordered by completion,
    /// not by commit, so it is skipped here. Concurrent runs rely on the
    /// multiset checks instead.
    fn check_lifo_order(&self) -> PropertyResult {
        let history = self.stack.history();

        if history.is_empty() || !history.is_sequential() {
            return PropertyResult::pass("LIFO_Order");
        }

        let mut model_stack: Vec<u64> = Vec::new();

        for op in &history.operations {
            match op.op_type {
                StackOpType::Push => {
                    if let Some(e) = op.element {
                        model_stack.push(e);
                    }
                }
                StackOpType::Pop => {
                    let Some(expected) = op.element else { continue };
                    match model_stack.pop() {
                        Some(actual) if actual != expected => {
                            return PropertyResult::fail(
                                "LIFO_Order",
                                self.describe(format!(
                                    "pop returned {} but model expected {} (step {})",
                                    expected, actual, op.step
                                )),
                            );
                        }
                        None => {
                            return PropertyResult::fail(
                                "LIFO_Order",
                                self.describe(format!(
                                    "pop returned {} but model stack was empty (step {})",
                                    expected, op.step
                                )),
                            );
                        }
                        _ => {}
                    }
                }
                StackOpType::PopEmpty => {
                    if !model_stack.is_empty() {
                        return PropertyResult::fail(
                            "LIFO_Order",
                            self.describe(format!(
                                "pop returned None but model has {} elements (step {})",
                                model_stack.len(),
                                op.step
                            )),
                        );
                    }
                }
            }
        }

        PropertyResult::pass("LIFO_Order")
    }

    /// Every recorded push and pop bumped the counter exactly once.
    fn check_counter_matches_history(&self) -> PropertyResult {
        let recorded = self.stack.history().len() as u64;
        let counted = self.stack.operation_count();

        if recorded == counted {
            PropertyResult::pass("CounterMatchesHistory")
        } else {
            PropertyResult::fail(
                "CounterMatchesHistory",
                self.describe(format!(
                    "counter reports {counted} operations but {recorded} were recorded"
                )),
            )
        }
    }
}

impl<T: StackProperties> PropertyChecker for StackPropertyChecker<'_, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        vec![
            self.check_no_lost_elements(),
            self.check_no_duplicates(),
            self.check_lifo_order(),
            self.check_counter_matches_history(),
        ]
    }
}
