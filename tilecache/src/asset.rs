//! HTTP request/response model shared by accessors and the cache.

use std::collections::HashMap;

/// A single request header as a `(name, value)` pair.
pub type Header = (String, String);

/// Classification of an upstream response by status-code band.
///
/// Classifying by band rather than exact code keeps the cache policy working
/// for uncommon success codes (201, 206), while 304 stays special-cased for
/// revalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseClass {
    /// 200-299: a fresh payload that replaces the cached record.
    Fresh,
    /// 304: the payload on disk is still valid; only metadata advances.
    NotModified,
    /// Anything else: the disk copy, if one exists, is served as a fallback.
    Failure,
}

impl ResponseClass {
    /// Classify an HTTP status code.
    pub fn of(status: u16) -> Self {
        match status {
            304 => ResponseClass::NotModified,
            200..=299 => ResponseClass::Fresh,
            _ => ResponseClass::Failure,
        }
    }
}

/// An HTTP response: status code, headers, and the raw body.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    status: u16,
    headers: HashMap<String, String>,
    data: Vec<u8>,
}

impl AssetResponse {
    /// Create a response from its parts.
    pub fn new(status: u16, headers: HashMap<String, String>, data: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            data,
        }
    }

    /// The synthesized response served for cache hits and offline fallbacks:
    /// status 200 with the stored ETag as its only header.
    pub fn from_cache(data: Vec<u8>, etag: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Etag".to_string(), etag.to_string());
        Self {
            status: 200,
            headers,
            data,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Etag` validator, if the server sent one.
    pub fn etag(&self) -> Option<&str> {
        self.header("Etag")
    }

    /// All response headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Response body.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decompose into `(status, headers, data)`.
    pub fn into_parts(self) -> (u16, HashMap<String, String>, Vec<u8>) {
        (self.status, self.headers, self.data)
    }
}

/// A completed request: the method and resolved URL paired with the response.
///
/// The URL is the final one after redirects, which is also what gets recorded
/// in the cache sidecar.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    method: String,
    url: String,
    response: AssetResponse,
}

impl AssetRequest {
    /// Create a completed request.
    pub fn new(method: impl Into<String>, url: impl Into<String>, response: AssetResponse) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            response,
        }
    }

    /// A synthesized GET serving cached bytes.
    pub fn from_cache(url: impl Into<String>, data: Vec<u8>, etag: &str) -> Self {
        Self::new("GET", url, AssetResponse::from_cache(data, etag))
    }

    /// HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resolved request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The response.
    pub fn response(&self) -> &AssetResponse {
        &self.response
    }

    /// Decompose into `(method, url, response)`.
    pub fn into_parts(self) -> (String, String, AssetResponse) {
        (self.method, self.url, self.response)
    }
}
