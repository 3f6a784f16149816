//! Contract tests run against every stack variant.
//!
//! Each test body is written once against `ConcurrentStack` and instantiated
//! for the three strategies by `for_each_variant!`.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sl_core::ConcurrentStack;
use sl_stacks::{CoarseLockedStack, FineLockedStack, LockFreeStack};

macro_rules! for_each_variant {
    ($test:ident) => {
        mod $test {
            use super::*;

            #[test]
            fn coarse() {
                super::$test(CoarseLockedStack::new());
            }

            #[test]
            fn fine() {
                super::$test(FineLockedStack::new());
            }

            #[test]
            fn lock_free() {
                super::$test(LockFreeStack::new());
            }
        }
    };
}

fn sequential_lifo<S: ConcurrentStack<u64>>(stack: S) {
    stack.push(1);
    stack.push(2);
    stack.push(3);

    assert_eq!(stack.pop(), Some(3));
    assert_eq!(stack.pop(), Some(2));
    assert_eq!(stack.pop(), Some(1));
    assert_eq!(stack.pop(), None);
}
for_each_variant!(sequential_lifo);

fn empty_pop_is_idempotent<S: ConcurrentStack<u64>>(stack: S) {
    for _ in 0..100 {
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }
    assert_eq!(stack.operation_count(), 100);

    // Nothing was disturbed by the empty pops.
    stack.push(9);
    assert_eq!(stack.pop(), Some(9));
    assert_eq!(stack.pop(), None);
}
for_each_variant!(empty_pop_is_idempotent);

fn counter_counts_every_attempt<S: ConcurrentStack<u64>>(stack: S) {
    const THREADS: u64 = 6;
    const PUSHES: u64 = 500;
    const POPS: u64 = 700;

    thread::scope(|s| {
        for t in 0..THREADS {
            let stack = &stack;
            s.spawn(move || {
                for i in 0..PUSHES.max(POPS) {
                    if i < PUSHES {
                        stack.push(t * PUSHES + i);
                    }
                    if i < POPS {
                        stack.pop();
                    }
                }
            });
        }
    });

    assert_eq!(stack.operation_count(), THREADS * (PUSHES + POPS));
}
for_each_variant!(counter_counts_every_attempt);

/// 4 pushers × 1000 distinct values, poppers running until all are seen.
fn concurrent_conservation<S: ConcurrentStack<u64>>(stack: S) {
    const PUSHERS: u64 = 4;
    const PER_PUSHER: u64 = 1000;
    const POPPERS: usize = 4;
    const TOTAL: u64 = PUSHERS * PER_PUSHER;

    let seen = std::sync::atomic::AtomicU64::new(0);

    let popped: Vec<u64> = thread::scope(|s| {
        for p in 0..PUSHERS {
            let stack = &stack;
            s.spawn(move || {
                for i in 0..PER_PUSHER {
                    stack.push(p * PER_PUSHER + i);
                }
            });
        }

        let poppers: Vec<_> = (0..POPPERS)
            .map(|_| {
                let stack = &stack;
                let seen = &seen;
                s.spawn(move || {
                    let mut mine = Vec::new();
                    while seen.load(std::sync::atomic::Ordering::Relaxed) < TOTAL {
                        match stack.pop() {
                            Some(v) => {
                                mine.push(v);
                                seen.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                            }
                            None => thread::yield_now(),
                        }
                    }
                    mine
                })
            })
            .collect();

        poppers
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(popped.len() as u64, TOTAL, "lost or duplicated elements");
    let unique: HashSet<u64> = popped.iter().copied().collect();
    assert_eq!(unique.len() as u64, TOTAL, "duplicate pops");
    assert_eq!(unique, (0..TOTAL).collect::<HashSet<_>>());
    assert!(stack.is_empty());
}
for_each_variant!(concurrent_conservation);

fn interleaved_sequence<S: ConcurrentStack<u64>>(stack: S) {
    stack.push(10);
    stack.push(20);
    assert_eq!(stack.pop(), Some(20));
    stack.push(30);
    assert_eq!(stack.pop(), Some(30));
    assert_eq!(stack.pop(), Some(10));
    assert_eq!(stack.pop(), None);
    assert_eq!(stack.operation_count(), 7);
}
for_each_variant!(interleaved_sequence);

#[test]
fn lock_free_operations_return_under_contention() {
    const WORKERS: usize = 8;
    const OPS: u64 = 20_000;
    // Regression detector only; a healthy run finishes far sooner.
    const DEADLINE: Duration = Duration::from_secs(60);

    let stack = Arc::new(LockFreeStack::<u64>::new());
    let (done_tx, done_rx) = mpsc::channel();

    for w in 0..WORKERS {
        let stack = Arc::clone(&stack);
        let done_tx = done_tx.clone();
        thread::spawn(move || {
            for i in 0..OPS {
                if (w as u64 + i) % 2 == 0 {
                    stack.push(i);
                } else {
                    stack.pop();
                }
            }
            let _ = done_tx.send(w);
        });
    }
    drop(done_tx);

    let mut finished = HashSet::new();
    while finished.len() < WORKERS {
        match done_rx.recv_timeout(DEADLINE) {
            Ok(w) => {
                finished.insert(w);
            }
            Err(e) => panic!(
                "only {} of {} workers returned: {e}",
                finished.len(),
                WORKERS
            ),
        }
    }

    assert_eq!(stack.operation_count(), WORKERS as u64 * OPS);
}

#[test]
fn lock_free_stalled_thread_does_not_block_others() {
    use std::sync::Barrier;

    const CYCLES: u64 = 10_000;
    const DEADLINE: Duration = Duration::from_secs(60);

    let stack = Arc::new(LockFreeStack::<u64>::new());
    let pinned = Arc::new(Barrier::new(2));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    // Parks while pinned, as a thread suspended inside `pop` would be.
    let stalled = {
        let stack = Arc::clone(&stack);
        let pinned = Arc::clone(&pinned);
        thread::spawn(move || {
            stack.push(u64::MAX);
            let guard = crossbeam_epoch::pin();
            pinned.wait();
            let _ = release_rx.recv();
            drop(guard);
            stack.pop()
        })
    };
    pinned.wait();

    let (done_tx, done_rx) = mpsc::channel();
    let worker = {
        let stack = Arc::clone(&stack);
        thread::spawn(move || {
            for i in 0..CYCLES {
                stack.push(i);
                assert_eq!(stack.pop(), Some(i));
            }
            let _ = done_tx.send(());
        })
    };

    let finished = done_rx.recv_timeout(DEADLINE);
    release_tx.send(()).unwrap();
    finished.unwrap_or_else(|e| panic!("worker did not finish while another thread was pinned: {e}"));

    worker.join().unwrap();
    assert_eq!(stalled.join().unwrap(), Some(u64::MAX));
    assert_eq!(stack.operation_count(), 1 + 2 * CYCLES + 1);
}
