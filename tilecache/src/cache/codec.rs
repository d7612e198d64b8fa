//! Reversible URL to cache-path mapping.

use crate::cache::types::CacheKey;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Characters escaped when mapping a cache key back to URL form: everything
/// outside the RFC 3986 unreserved set, except `/` which doubles as the
/// directory separator on disk.
const KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Maps request URLs to file paths under the cache root and back.
///
/// The forward direction percent-unescapes the URL and strips a configured
/// remote-prefix length from the front; the reverse direction re-escapes and
/// prepends the prefix, so `decode(encode(url)) == url` for canonically
/// escaped URLs.
#[derive(Debug, Clone)]
pub struct PathCodec {
    local_root: PathBuf,
    remote_prefix: String,
}

impl PathCodec {
    /// Create a codec for the given cache root and remote prefix.
    pub fn new(local_root: impl Into<PathBuf>, remote_prefix: impl Into<String>) -> Self {
        Self {
            local_root: local_root.into(),
            remote_prefix: remote_prefix.into(),
        }
    }

    /// Derive the cache key for a URL.
    ///
    /// Percent-unescapes the URL, then strips the remote-prefix length from
    /// the front when the decoded form is at least that long. The strip is
    /// skipped when the cut would land inside a multi-byte sequence.
    pub fn encode(&self, url: &str) -> CacheKey {
        let decoded = percent_decode_str(url).decode_utf8_lossy().into_owned();
        let head = self.remote_prefix.len();
        let relative = if head > 0 && decoded.len() >= head && decoded.is_char_boundary(head) {
            decoded[head..].to_string()
        } else {
            decoded
        };
        CacheKey::new(relative)
    }

    /// Rebuild the URL a key was derived from: re-escape and prepend the
    /// remote prefix.
    pub fn decode(&self, key: &CacheKey) -> String {
        format!(
            "{}{}",
            self.remote_prefix,
            utf8_percent_encode(key.as_str(), KEY_ESCAPE)
        )
    }

    /// Absolute path of the data file for a key.
    pub fn data_path(&self, key: &CacheKey) -> PathBuf {
        self.local_root.join(key.as_str().trim_start_matches('/'))
    }

    /// Absolute path of the sidecar metadata file for a key.
    pub fn sidecar_path(&self, key: &CacheKey) -> PathBuf {
        Self::append_suffix(&self.data_path(key), ".info")
    }

    /// Root directory this codec maps keys under.
    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    /// Append a literal suffix to a path, keeping the existing extension.
    pub(crate) fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut os: OsString = path.as_os_str().to_owned();
        os.push(suffix);
        PathBuf::from(os)
    }
}
