//! Thread pool sizing for the Monte Carlo run set.

use rayon::ThreadPoolBuilder;

/// Worker count for the parallel run set. Zero means the global Rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// Run `f` under this worker count. A zero count uses the global pool;
    /// otherwise a dedicated pool is built for the duration of the call.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match self.workers {
            0 => f(),
            n => ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .expect("Rayon thread pool")
                .install(f),
        }
    }
}
