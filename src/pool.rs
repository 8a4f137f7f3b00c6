// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool sizing and contiguous batch partitioning.
//!
//! Both engines split their input into contiguous batches, run one task per
//! batch on a bounded rayon pool and collect the per-batch outputs over a
//! channel. Batch order is preserved when merging, which makes score ties
//! resolve the same way for any worker count.

use std::ops::Range;
use std::sync::mpsc;
use std::thread;

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Default worker count for similarity scoring.
pub const DEFAULT_RETRIEVAL_WORKERS: usize = 4;

/// Number of hardware threads, or 1 when it cannot be determined.
pub fn available_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Clamps a requested worker count to `1..=items`.
///
/// Never more workers than items, and always at least one.
pub fn worker_count(requested: usize, items: usize) -> usize {
    requested.min(items).max(1)
}

/// Splits `0..len` into `workers` contiguous ranges.
///
/// The worker count is first clamped with [`worker_count`]. Every range has
/// `len / workers` items except the last, which also absorbs the remainder.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }

    let workers = worker_count(workers, len);
    let size = len / workers;

    (0..workers)
        .map(|idx| {
            let start = idx * size;
            let end = if idx + 1 == workers { len } else { start + size };
            start..end
        })
        .collect()
}

/// Builds a dedicated pool with exactly `threads` workers.
pub fn build_pool(
    threads: usize,
    name: &'static str,
) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(move |idx| format!("{}-{}", name, idx))
        .build()
}

/// Runs `work` over each contiguous batch of `items` on `pool` and returns
/// the per-batch outputs in batch order.
///
/// Blocks until every batch has finished.
pub fn run_batches<'a, T, R, F>(
    pool: &ThreadPool,
    items: &'a [T],
    workers: usize,
    work: F,
) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&'a [T]) -> R + Sync,
{
    let batches = partition(items.len(), workers);
    let batch_count = batches.len();
    let (tx, rx) = mpsc::channel::<(usize, R)>();
    let work = &work;

    pool.scope(|s| {
        for (idx, range) in batches.into_iter().enumerate() {
            let tx = tx.clone();
            let batch = &items[range];
            s.spawn(move |_| {
                let _ = tx.send((idx, work(batch)));
            });
        }
    });
    drop(tx);

    let mut outputs: Vec<(usize, R)> = rx.into_iter().collect();
    debug_assert_eq!(outputs.len(), batch_count);
    outputs.sort_by_key(|(idx, _)| *idx);
    outputs.into_iter().map(|(_, output)| output).collect()
}
