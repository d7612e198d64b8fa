//! Scheduling of cache work on a bounded worker pool.

mod pool;

pub use pool::{PoolError, TaskHandle, WorkerPool, DEFAULT_WORKER_COUNT};
