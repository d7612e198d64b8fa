//! Cache directory maintenance helpers.

use crate::cache::types::CacheError;
use std::fs;
use std::io;
use std::path::Path;

/// Result of clearing a cache directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearResult {
    /// Number of files deleted.
    pub files_deleted: u64,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

/// Delete every file under `root`: payloads, sidecars and leftover temp
/// files alike. Subdirectories are left in place.
pub fn clear_cache(root: &Path) -> Result<ClearResult, CacheError> {
    let mut result = ClearResult::default();
    if !root.exists() {
        return Ok(result);
    }
    walk(root, &mut |path, size| {
        if fs::remove_file(path).is_ok() {
            result.files_deleted += 1;
            result.bytes_freed += size;
        }
    })?;
    Ok(result)
}

/// Total `(file_count, byte_size)` of everything under `root`.
pub fn cache_stats(root: &Path) -> Result<(u64, u64), CacheError> {
    let mut files = 0u64;
    let mut bytes = 0u64;
    if root.exists() {
        walk(root, &mut |_, size| {
            files += 1;
            bytes += size;
        })?;
    }
    Ok((files, bytes))
}

/// Recursively visit every file under `dir` with its size.
fn walk(dir: &Path, visit: &mut impl FnMut(&Path, u64)) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, visit)?;
        } else if let Ok(metadata) = entry.metadata() {
            visit(&path, metadata.len());
        }
    }
    Ok(())
}
