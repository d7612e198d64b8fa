//! Gunzip-decoding accessor wrapper.

use crate::accessor::types::{AccessorError, AssetAccessor};
use crate::asset::{AssetRequest, AssetResponse, Header};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::warn;

/// Wraps an accessor and transparently decompresses gzip response bodies.
///
/// Some tile servers ignore `Accept-Encoding` negotiation and always answer
/// with gzip payloads. Layering this below a caching accessor keeps the
/// cached bytes stored decoded.
pub struct GzipAccessor<A> {
    inner: A,
}

impl<A: AssetAccessor> GzipAccessor<A> {
    /// Wrap an accessor.
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    /// Decode the body when the response declares `Content-Encoding: gzip`.
    /// A body that fails to decode is passed through unchanged.
    fn decode(request: AssetRequest) -> AssetRequest {
        let is_gzip = request
            .response()
            .header("Content-Encoding")
            .map(|v| v.eq_ignore_ascii_case("gzip"))
            .unwrap_or(false);
        if !is_gzip || request.response().data().is_empty() {
            return request;
        }

        let mut decoded = Vec::new();
        let mut decoder = GzDecoder::new(request.response().data());
        if let Err(error) = decoder.read_to_end(&mut decoded) {
            warn!(url = request.url(), %error, "failed to decode gzip body");
            return request;
        }

        let (method, url, response) = request.into_parts();
        let (status, mut headers, _) = response.into_parts();
        headers.retain(|name, _| !name.eq_ignore_ascii_case("Content-Encoding"));
        AssetRequest::new(method, url, AssetResponse::new(status, headers, decoded))
    }
}

impl<A: AssetAccessor> AssetAccessor for GzipAccessor<A> {
    async fn get(&self, url: &str, headers: &[Header]) -> Result<AssetRequest, AccessorError> {
        self.inner.get(url, headers).await.map(Self::decode)
    }

    async fn get_no_cache(
        &self,
        url: &str,
        headers: &[Header],
    ) -> Result<AssetRequest, AccessorError> {
        self.inner.get_no_cache(url, headers).await.map(Self::decode)
    }

    async fn request(
        &self,
        verb: &str,
        url: &str,
        headers: &[Header],
        body: &[u8],
    ) -> Result<AssetRequest, AccessorError> {
        self.inner
            .request(verb, url, headers, body)
            .await
            .map(Self::decode)
    }
}
