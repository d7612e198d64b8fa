//! tilecache - disk-backed HTTP asset cache with conditional revalidation.
//!
//! Sits between a streaming tile loader and the network: repeat requests are
//! served from `(data, data.info)` file pairs on disk, stale records are
//! revalidated with conditional GETs (`If-None-Match`), and when the
//! upstream is unreachable a stale disk copy is served instead of failing.
//! Payload writes are crash-safe (full temp file, then rename).
//!
//! # High-Level API
//!
//! ```ignore
//! use tilecache::accessor::{AssetAccessor, FileCacheAccessor, HttpAccessor};
//! use tilecache::config::CacheConfig;
//!
//! let config = CacheConfig::default()
//!     .with_remote_prefix("https://assets.example.com/")
//!     .with_generation(7);
//! let accessor = FileCacheAccessor::new(HttpAccessor::new()?, config);
//!
//! let request = accessor.get("https://assets.example.com/t/0/0/0.terrain", &[]).await?;
//! println!("{} bytes", request.response().data().len());
//! ```

pub mod accessor;
pub mod asset;
pub mod cache;
pub mod config;
pub mod executor;
pub mod logging;

/// Version of the tilecache library and CLI.
///
/// Synchronized across all workspace members; injected at compile time from
/// `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
