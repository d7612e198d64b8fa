//! On-disk record store: payload files paired with sidecar metadata.

use crate::cache::codec::PathCodec;
use crate::cache::types::{CacheError, CacheKey, CacheRecord, SidecarInfo};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Orphaned temp files older than this are removed when a later write
/// commits the same key. Old enough that no live writer can still own one.
const TEMP_SWEEP_AGE: Duration = Duration::from_secs(60 * 60);

/// Monotonic discriminator for temp file names within this process.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Reads and writes `(data, data.info)` record pairs under the cache root.
///
/// No in-memory index is kept; every lookup goes to the filesystem. Payload
/// writes go through a uniquely-named temp file renamed over the final path,
/// so concurrent readers observe either the old record or the new one, never
/// a partial write. Concurrent writers for the same key race benignly: the
/// last rename wins.
#[derive(Debug, Clone)]
pub struct RecordStore {
    codec: PathCodec,
}

impl RecordStore {
    /// Create a store over the codec's cache root.
    pub fn new(codec: PathCodec) -> Self {
        Self { codec }
    }

    /// The codec mapping keys to paths.
    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    /// Return the record for `key` only when both files exist and the stored
    /// generation equals `expected_generation`.
    ///
    /// A malformed sidecar or an unreadable payload is a miss, never an
    /// error; a generation mismatch means "present but must be revalidated".
    pub fn read_if_fresh(&self, key: &CacheKey, expected_generation: i64) -> Option<CacheRecord> {
        let info = self.read_sidecar(key)?;
        if info.generation != expected_generation {
            return None;
        }
        match self.read_bytes(key) {
            Ok(data) => Some(CacheRecord { info, data }),
            Err(_) => None,
        }
    }

    /// Parsed sidecar metadata for `key`, fresh or not.
    pub fn read_sidecar(&self, key: &CacheKey) -> Option<SidecarInfo> {
        let text = fs::read_to_string(self.codec.sidecar_path(key)).ok()?;
        SidecarInfo::parse(&text)
    }

    /// Raw payload bytes for `key`.
    pub fn read_bytes(&self, key: &CacheKey) -> io::Result<Vec<u8>> {
        fs::read(self.codec.data_path(key))
    }

    /// Whether a payload file exists for `key`, regardless of freshness.
    pub fn has_payload(&self, key: &CacheKey) -> bool {
        self.codec.data_path(key).exists()
    }

    /// Commit a fresh payload and its metadata.
    ///
    /// The payload is written in full to a temp file, flushed, and renamed
    /// onto the data path before the sidecar is rewritten, so a crash in
    /// between never pairs a new generation with old bytes. A failed rename
    /// is logged and leaves the old record (and old sidecar) intact; the
    /// caller still holds the response in memory and serves it regardless.
    pub fn write_fresh(
        &self,
        key: &CacheKey,
        generation: i64,
        etag: &str,
        original_url: &str,
        bytes: &[u8],
    ) -> Result<(), CacheError> {
        let data_path = self.codec.data_path(key);
        self.ensure_parent(&data_path)?;

        let temp_path = temp_path_for(&data_path);
        write_payload(&temp_path, bytes)?;

        match fs::rename(&temp_path, &data_path) {
            Ok(()) => {
                let _ = fs::remove_file(&temp_path);
                self.write_sidecar(key, generation, etag, original_url)?;
            }
            Err(error) => {
                warn!(
                    temp = %temp_path.display(),
                    path = %data_path.display(),
                    url = original_url,
                    %error,
                    "cache rename failed"
                );
                let _ = fs::remove_file(&temp_path);
            }
        }

        self.sweep_stale_temps(&data_path);
        Ok(())
    }

    /// Rewrite only the sidecar, leaving the payload untouched.
    ///
    /// Used when a 304 confirms the bytes on disk are still current and only
    /// the generation/ETag bookkeeping advances.
    pub fn touch_metadata(
        &self,
        key: &CacheKey,
        generation: i64,
        etag: &str,
        original_url: &str,
    ) -> Result<(), CacheError> {
        let data_path = self.codec.data_path(key);
        self.ensure_parent(&data_path)?;
        self.write_sidecar(key, generation, etag, original_url)
    }

    fn write_sidecar(
        &self,
        key: &CacheKey,
        generation: i64,
        etag: &str,
        original_url: &str,
    ) -> Result<(), CacheError> {
        let info = SidecarInfo {
            generation,
            etag: etag.to_string(),
            original_url: original_url.to_string(),
        };
        fs::write(self.codec.sidecar_path(key), info.to_line())?;
        Ok(())
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Remove leftover temp files for this key from interrupted writes.
    fn sweep_stale_temps(&self, data_path: &Path) {
        let Some(parent) = data_path.parent() else {
            return;
        };
        let Some(file_name) = data_path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let prefix = format!("{}.tmp", file_name);
        let Ok(entries) = fs::read_dir(parent) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) {
                continue;
            }
            let stale = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .map(|age| age >= TEMP_SWEEP_AGE)
                .unwrap_or(false);
            if stale {
                debug!(temp = name, "removing orphaned cache temp file");
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}

fn temp_path_for(data_path: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    PathCodec::append_suffix(data_path, &format!(".tmp{}-{}", process::id(), seq))
}

fn write_payload(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}
