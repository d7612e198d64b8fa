//! Cache configuration.

use crate::executor::DEFAULT_WORKER_COUNT;
use std::path::PathBuf;

/// Configuration for a [`FileCacheAccessor`](crate::accessor::FileCacheAccessor).
///
/// Handed explicitly to the constructor by the owning session; there are no
/// process-wide singletons.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory for cached payloads and their sidecars.
    pub local_root: PathBuf,
    /// Prefix stripped from decoded URLs when deriving cache paths.
    pub remote_prefix: String,
    /// Caller-controlled freshness stamp. Records written under a different
    /// stamp are revalidated before being served; `0` disables the file
    /// cache entirely.
    pub generation: i64,
    /// Worker pool size for cache units of work.
    pub workers: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let local_root = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tilecache");

        Self {
            local_root,
            remote_prefix: String::new(),
            generation: 1,
            workers: DEFAULT_WORKER_COUNT,
        }
    }
}

impl CacheConfig {
    /// Create a configuration rooted at the given cache directory.
    pub fn new(local_root: impl Into<PathBuf>) -> Self {
        Self {
            local_root: local_root.into(),
            ..Self::default()
        }
    }

    /// Set the remote prefix stripped during key derivation.
    pub fn with_remote_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.remote_prefix = prefix.into();
        self
    }

    /// Set the cache generation stamp.
    pub fn with_generation(mut self, generation: i64) -> Self {
        self.generation = generation;
        self
    }

    /// Set the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Format a byte count for human-readable output.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
