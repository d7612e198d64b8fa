//! Core types for the cache record store.

use std::fmt;
use thiserror::Error;

/// Cache key derived from a request URL.
///
/// The key is the percent-decoded URL with the configured remote prefix
/// stripped from the front; it doubles as the record's relative location
/// under the local cache root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub(crate) fn new(relative: String) -> Self {
        Self(relative)
    }

    /// The decoded, prefix-stripped form of the URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid cache configuration
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Parsed sidecar metadata for a cached payload.
///
/// Persisted next to the data file as a single `generation|etag|originalUrl`
/// line. The URL field is parsed last and may itself contain `|`; an ETag
/// containing `|` would shift the URL field and is assumed not to occur
/// (ETags are quoted tokens).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarInfo {
    /// Caller-controlled freshness stamp the record was written under.
    pub generation: i64,
    /// Validator from the upstream response, empty when none was sent.
    pub etag: String,
    /// Resolved URL the payload was fetched from.
    pub original_url: String,
}

impl SidecarInfo {
    /// Parse a sidecar line.
    ///
    /// Malformed input (fewer than three fields, or a non-numeric
    /// generation) yields `None` and is treated as a cache miss upstream.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).splitn(3, '|');
        let generation = fields.next()?.parse::<i64>().ok()?;
        let etag = fields.next()?.to_string();
        let original_url = fields.next()?.to_string();
        Some(Self {
            generation,
            etag,
            original_url,
        })
    }

    /// Serialize to the on-disk line format.
    pub fn to_line(&self) -> String {
        format!("{}|{}|{}", self.generation, self.etag, self.original_url)
    }
}

/// A complete cached record: payload bytes plus sidecar metadata.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    /// Sidecar metadata.
    pub info: SidecarInfo,
    /// Payload bytes.
    pub data: Vec<u8>,
}
