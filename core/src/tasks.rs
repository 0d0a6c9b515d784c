//! Fork-join task scheduling.
//!
//! The render graph never spawns threads itself. It hands index ranges to a
//! [`TaskScheduler`] and blocks until all of them have run. Two schedulers are
//! provided:
//!
//! - [`ThreadPool`] splits the work across scoped OS threads
//!   ([`std::thread::scope`]), running one partition on the calling thread.
//! - [`InlineScheduler`] runs everything on the calling thread. Used on WASM
//!   and in tests that want deterministic ordering.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use redlilium_core::tasks::{TaskScheduler, ThreadPool};
//!
//! let pool = ThreadPool::new(4);
//! let sum = AtomicUsize::new(0);
//! pool.parallel_for(100, 8, &|range| {
//!     sum.fetch_add(range.sum::<usize>(), Ordering::Relaxed);
//! });
//! assert_eq!(sum.load(Ordering::Relaxed), 4950);
//! ```

use std::ops::Range;

/// A blocking fork-join scheduler.
pub trait TaskScheduler: Send + Sync {
    /// Run `task` over `0..count`, split into contiguous ranges.
    ///
    /// Every index is covered by exactly one range. Ranges hold at least
    /// `min_range` items unless `count` itself is smaller. The order in which
    /// ranges run is unspecified; the call returns once all have finished.
    fn parallel_for(&self, count: usize, min_range: usize, task: &(dyn Fn(Range<usize>) + Sync));

    /// Number of threads that may run ranges concurrently.
    fn num_threads(&self) -> usize;
}

/// Split `0..count` into at most `max_partitions` ranges of at least
/// `min_range` items.
pub fn partition(count: usize, min_range: usize, max_partitions: usize) -> Vec<Range<usize>> {
    if count == 0 {
        return Vec::new();
    }
    let min_range = min_range.max(1);
    let partitions = (count / min_range).clamp(1, max_partitions.max(1));
    let chunk = count.div_ceil(partitions);

    (0..count)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(count))
        .collect()
}

/// Scoped-thread scheduler.
///
/// # Example
///
/// ```
/// use redlilium_core::tasks::{TaskScheduler, ThreadPool};
///
/// let pool = ThreadPool::new(2);
/// let mut slots = vec![0u32; 4];
/// pool.scope(|s| {
///     for (i, slot) in slots.iter_mut().enumerate() {
///         s.spawn(move || *slot = i as u32 * 10);
///     }
/// });
/// assert_eq!(slots, vec![0, 10, 20, 30]);
/// ```
#[derive(Debug)]
pub struct ThreadPool {
    num_threads: usize,
}

impl ThreadPool {
    /// Create a pool running at most `num_threads` ranges at once.
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    /// Create a pool sized to the available CPU cores.
    pub fn default_threads() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }

    /// Run `f` with a scope whose spawned tasks all finish before returning.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn scope<'env, F>(&self, f: F)
    where
        F: for<'scope> FnOnce(&Scope<'scope, 'env>),
    {
        std::thread::scope(|s| {
            let scope = Scope { inner: s };
            f(&scope);
        });
    }

    /// WASM: tasks run immediately on the calling thread.
    #[cfg(target_arch = "wasm32")]
    pub fn scope<'env, F>(&self, f: F)
    where
        F: for<'scope> FnOnce(&Scope<'scope, 'env>),
    {
        let scope = Scope {
            _marker: std::marker::PhantomData,
        };
        f(&scope);
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::default_threads()
    }
}

impl TaskScheduler for ThreadPool {
    fn parallel_for(&self, count: usize, min_range: usize, task: &(dyn Fn(Range<usize>) + Sync)) {
        let mut ranges = partition(count, min_range, self.num_threads);

        // Single partition: no point in paying for a thread.
        let Some(first) = ranges.pop() else {
            return;
        };
        if ranges.is_empty() {
            task(first);
            return;
        }

        self.scope(|s| {
            for range in ranges {
                s.spawn(move || {
                    crate::profile_scope!("parallel_for_range");
                    task(range);
                });
            }
            task(first);
        });
    }

    fn num_threads(&self) -> usize {
        self.num_threads
    }
}

/// Scheduler that runs every range on the calling thread, in order.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineScheduler;

impl TaskScheduler for InlineScheduler {
    fn parallel_for(&self, count: usize, min_range: usize, task: &(dyn Fn(Range<usize>) + Sync)) {
        for range in partition(count, min_range, usize::MAX) {
            task(range);
        }
    }

    fn num_threads(&self) -> usize {
        1
    }
}

/// Tasks spawned in a scope finish before [`ThreadPool::scope`] returns.
#[cfg(not(target_arch = "wasm32"))]
pub struct Scope<'scope, 'env: 'scope> {
    inner: &'scope std::thread::Scope<'scope, 'env>,
}

#[cfg(not(target_arch = "wasm32"))]
impl<'scope, 'env> Scope<'scope, 'env> {
    /// Spawn a task on a new scoped thread.
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        self.inner.spawn(move || {
            crate::set_thread_name!("redlilium: worker");
            f();
        });
    }
}

/// WASM scope: spawning runs the task immediately.
#[cfg(target_arch = "wasm32")]
pub struct Scope<'scope, 'env: 'scope> {
    _marker: std::marker::PhantomData<(&'scope (), &'env ())>,
}

#[cfg(target_arch = "wasm32")]
impl<'scope, 'env> Scope<'scope, 'env> {
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        f();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn covered(ranges: &[Range<usize>]) -> Vec<usize> {
        let mut all: Vec<usize> = ranges.iter().cloned().flatten().collect();
        all.sort_unstable();
        all
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(0, 4, 8).is_empty());
    }

    #[test]
    fn test_partition_respects_min_range() {
        assert_eq!(partition(10, 4, 16), vec![0..5, 5..10]);
        assert_eq!(partition(3, 4, 16), vec![0..3]);
    }

    #[test]
    fn test_partition_respects_thread_limit() {
        let ranges = partition(100, 1, 4);
        assert_eq!(ranges.len(), 4);
        assert_eq!(covered(&ranges), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_zero_min_range_is_one() {
        assert_eq!(partition(3, 0, 8), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_thread_pool_visits_every_index_once() {
        let pool = ThreadPool::new(4);
        let seen = Mutex::new(Vec::new());
        pool.parallel_for(37, 3, &|range| {
            seen.lock().unwrap().extend(range);
        });

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_thread_pool_zero_count_is_noop() {
        let pool = ThreadPool::new(4);
        let calls = AtomicUsize::new(0);
        pool.parallel_for(0, 1, &|_| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_inline_scheduler_runs_in_order() {
        let seen = Mutex::new(Vec::new());
        InlineScheduler.parallel_for(5, 2, &|range| {
            seen.lock().unwrap().push(range);
        });
        assert_eq!(seen.into_inner().unwrap(), vec![0..3, 3..5]);
    }

    #[test]
    fn test_scope_captures_references() {
        let pool = ThreadPool::new(2);
        let mut value = 0u32;
        pool.scope(|s| {
            s.spawn(|| value = 42);
        });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_default_threads_at_least_one() {
        assert!(ThreadPool::default_threads().num_threads() >= 1);
    }
}
