//! File-backed cache records with crash-safe writes.
//!
//! A record is a `(data, data.info)` file pair under the cache root: raw
//! payload bytes plus a one-line `generation|etag|originalUrl` sidecar. The
//! filesystem is the source of truth; there is no in-process index.

mod codec;
mod maintenance;
mod record;
mod stats;
mod types;

pub use codec::PathCodec;
pub use maintenance::{cache_stats, clear_cache, ClearResult};
pub use record::RecordStore;
pub use stats::CacheStats;
pub use types::{CacheError, CacheKey, CacheRecord, SidecarInfo};
