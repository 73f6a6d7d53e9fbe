//! # Batch Module
//!
//! Fork-join pool for "process N files" batches: reconciliation, duplicate
//! comparison and cache cleanup.
//!
//! Each batch gets a fixed-size pool. The slice is split into contiguous
//! ranges, one per worker, and each worker is the only writer to its own
//! range. The call returns once every range is done. A batch must not be
//! started from inside another batch's worker.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use tracing::warn;

/// Worker count matching the available hardware threads
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Fixed-size fork-join pool
#[derive(Debug, Clone, Copy)]
pub struct BatchPool {
    workers: usize,
}

impl Default for BatchPool {
    fn default() -> Self {
        Self::new(default_workers())
    }
}

impl BatchPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Call `f(index, item)` for every item and wait for all of them.
    ///
    /// Falls back to running on the calling thread if no pool can be built.
    pub fn for_each_partitioned<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync,
    {
        if items.is_empty() {
            return;
        }
        let chunk = items.len().div_ceil(self.workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("pixfolio-batch-{}", i))
            .build();

        match pool {
            Ok(pool) => pool.install(|| {
                items
                    .par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(n, range)| {
                        for (offset, item) in range.iter_mut().enumerate() {
                            f(n * chunk + offset, item);
                        }
                    })
            }),
            Err(e) => {
                warn!(error = %e, "Could not start worker pool, running batch sequentially");
                for (index, item) in items.iter_mut().enumerate() {
                    f(index, item);
                }
            }
        }
    }

    /// Compute `f(index, item)` for every item, keeping input order
    pub fn map_partitioned<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync,
    {
        let mut results: Vec<Option<R>> = std::iter::repeat_with(|| None)
            .take(items.len())
            .collect();
        self.for_each_partitioned(&mut results, |index, slot| {
            *slot = Some(f(index, &items[index]));
        });
        results.into_iter().flatten().collect()
    }
}
