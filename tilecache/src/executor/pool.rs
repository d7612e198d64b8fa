//! Bounded worker pool for cache units of work.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Default number of workers when the host does not configure one.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Errors from the worker pool.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// A scheduled unit of work panicked before producing a result.
    #[error("worker task panicked: {0}")]
    TaskPanicked(String),
}

/// Fixed-size pool gating concurrent cache units of work.
///
/// Units are tokio tasks that hold an owned semaphore permit for their whole
/// run, so at most `workers` of them execute at once. A disk lookup, the
/// network round-trip and the store update for one `get` are a single unit.
/// Submitted work is never cancelled mid-flight and no timeout is imposed
/// here; both are the transport's concern.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    /// Create a pool with the given number of workers (minimum 1).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Number of workers in the pool.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Currently idle worker slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Schedule a unit of work, returning a handle to its deferred result.
    ///
    /// The work starts as soon as a worker slot frees up; the caller never
    /// blocks. Must be called within a tokio runtime.
    pub fn spawn<F, T>(&self, work: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        TaskHandle {
            inner: tokio::spawn(async move {
                // acquire_owned only fails when the semaphore is closed,
                // which this pool never does.
                let _permit = semaphore.acquire_owned().await.ok();
                work.await
            }),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT)
    }
}

/// Deferred result of a scheduled unit of work.
#[derive(Debug)]
pub struct TaskHandle<T> {
    inner: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the unit of work to finish and take its result.
    pub async fn join(self) -> Result<T, PoolError> {
        self.inner
            .await
            .map_err(|e| PoolError::TaskPanicked(e.to_string()))
    }

    /// True once the unit of work has finished.
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}
