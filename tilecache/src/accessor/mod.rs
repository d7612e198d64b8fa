//! Asset accessors: direct transport and delegating wrappers.
//!
//! Accessors compose by delegation. A typical stack for a streaming tile
//! client is `FileCacheAccessor<GzipAccessor<HttpAccessor>>`: the transport
//! at the bottom, body decoding above it, and the disk cache on top so that
//! cached payloads are stored decoded.

mod file_cache;
mod gzip;
mod http;
mod types;

pub use file_cache::FileCacheAccessor;
pub use gzip::GzipAccessor;
pub use http::HttpAccessor;
pub use types::{AccessorError, AssetAccessor};
