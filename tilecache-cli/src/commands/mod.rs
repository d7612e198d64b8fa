//! CLI command implementations.
//!
//! - [`fetch`] - Fetch one URL through the file cache
//! - [`cache`] - Cache management (stats, clear)

pub mod cache;
pub mod fetch;
