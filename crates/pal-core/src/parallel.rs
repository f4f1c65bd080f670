//! Worker pool for the embarrassingly parallel phases.
//!
//! Per-row kNN queries and per-waypoint shortest-path searches read shared,
//! immutable data and return independent vectors. They run on indexed rayon
//! iterators so results come back in input order regardless of worker count.

use pal_common::{Error, Result};

/// Degree of parallelism derived from `n_jobs`.
pub struct Parallelism {
    threads: usize,
    pool: Option<rayon::ThreadPool>,
}

impl Parallelism {
    /// `-1` runs on rayon's global pool (all logical CPUs). A positive value
    /// builds a dedicated pool of that size.
    pub fn from_n_jobs(n_jobs: i32) -> Result<Self> {
        match n_jobs {
            -1 => Ok(Self {
                threads: rayon::current_num_threads(),
                pool: None,
            }),
            n if n >= 1 => {
                let threads = n as usize;
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("palantir-worker-{i}"))
                    .build()
                    .map_err(|e| Error::invalid_parameter("n_jobs", e.to_string()))?;
                Ok(Self {
                    threads,
                    pool: Some(pool),
                })
            }
            n => Err(Error::invalid_parameter(
                "n_jobs",
                format!("must be -1 or a positive count, got {n}"),
            )),
        }
    }

    /// Single-threaded execution on a one-worker pool.
    pub fn sequential() -> Result<Self> {
        Self::from_n_jobs(1)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `op` inside this pool; rayon iterators within it use its workers.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl std::fmt::Debug for Parallelism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parallelism")
            .field("threads", &self.threads)
            .field("dedicated", &self.pool.is_some())
            .finish()
    }
}
