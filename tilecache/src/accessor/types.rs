//! Accessor capability trait and errors.

use crate::asset::{AssetRequest, Header};
use std::future::Future;
use thiserror::Error;

/// Errors surfaced by accessors.
///
/// Cache-internal problems never appear here: the file cache degrades to a
/// disk copy or a plain fetch instead. Callers see an error only when the
/// transport produced nothing and no fallback existed.
#[derive(Debug, Clone, Error)]
pub enum AccessorError {
    /// The transport could not produce a response at all.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("failed to initialize HTTP client: {0}")]
    Client(String),

    /// A scheduled unit of work was lost before producing a result.
    #[error("cache worker failed: {0}")]
    Worker(String),
}

/// Capability for fetching assets over HTTP.
///
/// Implementations form a delegation chain: a direct transport at the
/// bottom, with decoding or caching accessors layered on top
/// (`GzipAccessor`, `FileCacheAccessor`). Retrying transport failures is the
/// caller's business, never an accessor's.
pub trait AssetAccessor: Send + Sync + 'static {
    /// Fetch `url` with the given request headers, applying whatever caching
    /// strategy this accessor implements.
    fn get(
        &self,
        url: &str,
        headers: &[Header],
    ) -> impl Future<Output = Result<AssetRequest, AccessorError>> + Send;

    /// Fetch `url`, bypassing this accessor's own caching layer.
    ///
    /// For a direct transport this is the same as [`get`](Self::get).
    fn get_no_cache(
        &self,
        url: &str,
        headers: &[Header],
    ) -> impl Future<Output = Result<AssetRequest, AccessorError>> + Send;

    /// Perform a request with an arbitrary verb and body. Caching layers
    /// pass this straight through.
    fn request(
        &self,
        verb: &str,
        url: &str,
        headers: &[Header],
        body: &[u8],
    ) -> impl Future<Output = Result<AssetRequest, AccessorError>> + Send;
}
