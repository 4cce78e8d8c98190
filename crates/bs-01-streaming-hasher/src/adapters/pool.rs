//! # Worker Pool
//!
//! Thin handle over a rayon pool. Either the process-wide global pool or a
//! dedicated pool shared by every hasher built from this handle.

use crate::domain::errors::HasherError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::Arc;

/// Where the concurrent hasher runs its combination batches.
#[derive(Clone, Default)]
pub struct WorkerPool {
    dedicated: Option<Arc<ThreadPool>>,
}

impl WorkerPool {
    /// Use rayon's global pool.
    pub fn global() -> Self {
        Self { dedicated: None }
    }

    /// Build a dedicated pool with `threads` workers.
    pub fn dedicated(threads: usize) -> Result<Self, HasherError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("bs-hasher-{index}"))
            .build()
            .map_err(|e| HasherError::PoolInit(e.to_string()))?;
        Ok(Self::from_pool(Arc::new(pool)))
    }

    pub fn from_pool(pool: Arc<ThreadPool>) -> Self {
        Self {
            dedicated: Some(pool),
        }
    }

    /// Fire-and-forget a job on the pool.
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.dedicated {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }

    pub fn current_num_threads(&self) -> usize {
        match &self.dedicated {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("dedicated", &self.dedicated.is_some())
            .field("threads", &self.current_num_threads())
            .finish()
    }
}
