//! Bounded worker pool shared by the load and stitch stages.

use crate::error::ConfigError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Upper bound on the default worker count.
///
/// Each worker holds at least one full-size decode in flight, so the default
/// stays well below the core count of large machines.
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// A dedicated rayon pool with a fixed number of threads
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool with `workers` threads
    pub fn new(workers: usize) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pano-worker-{}", i))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;

        Ok(Self { pool, workers })
    }

    /// Available parallelism, capped at `MAX_DEFAULT_WORKERS`
    pub fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_DEFAULT_WORKERS)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` over every item and wait for all of them.
    ///
    /// Results come back in input order regardless of completion order.
    pub fn map<T, R, F>(&self, items: Vec<T>, task: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        self.pool.install(|| items.into_par_iter().map(task).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(WorkerPool::new(0), Err(ConfigError::InvalidWorkers)));
    }

    #[test]
    fn default_workers_is_bounded() {
        let workers = WorkerPool::default_workers();
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&workers));
    }

    #[test]
    fn map_preserves_input_order() {
        let pool = WorkerPool::new(4).unwrap();
        let results = pool.map((0..20u64).collect(), |i| {
            // later items finish first
            std::thread::sleep(Duration::from_millis(20 - i));
            i * 10
        });

        assert_eq!(results, (0..20u64).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn concurrency_never_exceeds_worker_count() {
        let pool = WorkerPool::new(2).unwrap();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        pool.map((0..12).collect::<Vec<_>>(), |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            active.fetch_sub(1, Ordering::SeqCst);
        });

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.workers(), 2);
    }
}
