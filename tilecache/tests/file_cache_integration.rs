//! Integration tests for the file cache accessor.
//!
//! These exercise the complete flow, from codec through record store,
//! conditional fetch and worker pool, against mock transports and real temp
//! directories: download-then-hit, 304 revalidation, corruption recovery,
//! offline fallback, concurrent writes, and crash-safety around temp files.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tilecache::accessor::{AccessorError, AssetAccessor, FileCacheAccessor};
use tilecache::asset::{AssetRequest, AssetResponse, Header};
use tilecache::config::CacheConfig;

const REMOTE: &str = "https://tiles.test/";

// =============================================================================
// Test Helpers
// =============================================================================

/// Transport that answers every URL with its own bytes as the body.
///
/// Distinct URLs therefore produce distinct payloads, which makes
/// cross-contamination between concurrently written records visible.
#[derive(Clone)]
struct EchoTransport {
    status: u16,
    etag: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl EchoTransport {
    fn new(status: u16, etag: Option<&str>) -> Self {
        Self {
            status,
            etag: etag.map(str::to_string),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetAccessor for EchoTransport {
    async fn get(&self, url: &str, headers: &[Header]) -> Result<AssetRequest, AccessorError> {
        self.get_no_cache(url, headers).await
    }

    async fn get_no_cache(
        &self,
        url: &str,
        _headers: &[Header],
    ) -> Result<AssetRequest, AccessorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut headers = HashMap::new();
        if let Some(etag) = &self.etag {
            headers.insert("Etag".to_string(), etag.clone());
        }
        Ok(AssetRequest::new(
            "GET",
            url,
            AssetResponse::new(self.status, headers, url.as_bytes().to_vec()),
        ))
    }

    async fn request(
        &self,
        _verb: &str,
        url: &str,
        headers: &[Header],
        _body: &[u8],
    ) -> Result<AssetRequest, AccessorError> {
        self.get_no_cache(url, headers).await
    }
}

/// Transport that plays a fixed sequence of results, then repeats the last.
#[derive(Clone)]
struct SequenceTransport {
    script: Arc<Mutex<Vec<Result<AssetRequest, AccessorError>>>>,
    seen_headers: Arc<Mutex<Vec<Vec<Header>>>>,
}

impl SequenceTransport {
    fn new(script: Vec<Result<AssetRequest, AccessorError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            seen_headers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn header_sent(&self, call: usize, name: &str) -> Option<String> {
        self.seen_headers
            .lock()
            .unwrap()
            .get(call)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

impl AssetAccessor for SequenceTransport {
    async fn get(&self, url: &str, headers: &[Header]) -> Result<AssetRequest, AccessorError> {
        self.get_no_cache(url, headers).await
    }

    async fn get_no_cache(
        &self,
        _url: &str,
        headers: &[Header],
    ) -> Result<AssetRequest, AccessorError> {
        self.seen_headers.lock().unwrap().push(headers.to_vec());
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script[0].clone()
        }
    }

    async fn request(
        &self,
        _verb: &str,
        url: &str,
        headers: &[Header],
        _body: &[u8],
    ) -> Result<AssetRequest, AccessorError> {
        self.get_no_cache(url, headers).await
    }
}

fn ok_response(url: &str, status: u16, etag: Option<&str>, body: &[u8]) -> Result<AssetRequest, AccessorError> {
    let mut headers = HashMap::new();
    if let Some(etag) = etag {
        headers.insert("Etag".to_string(), etag.to_string());
    }
    Ok(AssetRequest::new(
        "GET",
        url,
        AssetResponse::new(status, headers, body.to_vec()),
    ))
}

fn transport_error(url: &str) -> Result<AssetRequest, AccessorError> {
    Err(AccessorError::Transport {
        url: url.to_string(),
        message: "network unreachable".to_string(),
    })
}

fn cache_with<A: AssetAccessor>(
    transport: A,
    temp: &TempDir,
    generation: i64,
) -> FileCacheAccessor<A> {
    let config = CacheConfig::new(temp.path())
        .with_remote_prefix(REMOTE)
        .with_generation(generation)
        .with_workers(4);
    FileCacheAccessor::new(transport, config)
}

// =============================================================================
// Conditional Fetch Flow
// =============================================================================

#[tokio::test]
async fn test_download_then_hit_is_transport_free() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/a.bin";
    let transport = EchoTransport::new(200, Some("\"r1\""));
    let cache = cache_with(transport.clone(), &temp, 1);

    let first = cache.get(url, &[]).await.unwrap();
    assert_eq!(first.response().status(), 200);
    assert_eq!(first.response().data(), url.as_bytes());

    let second = cache.get(url, &[]).await.unwrap();
    assert_eq!(second.response().data(), url.as_bytes());
    assert_eq!(second.response().etag(), Some("\"r1\""));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_revalidation_serves_previous_bytes() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/b.bin";
    let transport = SequenceTransport::new(vec![
        ok_response(url, 200, Some("\"r1\""), b"first body"),
        ok_response(url, 304, None, b""),
    ]);
    let cache = cache_with(transport.clone(), &temp, 1);
    cache.get(url, &[]).await.unwrap();

    // Next generation: the record is stale and revalidates with 304.
    let cache = cache_with(transport.clone(), &temp, 2);
    let request = cache.get(url, &[]).await.unwrap();

    assert_eq!(transport.header_sent(1, "If-None-Match"), Some("\"r1\"".to_string()));
    assert_eq!(request.response().status(), 200);
    assert_eq!(request.response().data(), b"first body");

    // And the refreshed record is now a generation-2 hit.
    let key = cache.store().codec().encode(url);
    let record = cache.store().read_if_fresh(&key, 2).expect("refreshed record");
    assert_eq!(record.data, b"first body");
    assert_eq!(record.info.etag, "\"r1\"");
}

#[tokio::test]
async fn test_missing_sidecar_forces_full_fetch() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/c.bin";
    let transport = EchoTransport::new(200, None);
    let cache = cache_with(transport.clone(), &temp, 1);
    cache.get(url, &[]).await.unwrap();

    let key = cache.store().codec().encode(url);
    fs::remove_file(cache.store().codec().sidecar_path(&key)).unwrap();

    let request = cache.get(url, &[]).await.unwrap();
    assert_eq!(request.response().status(), 200);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_corrupt_sidecar_forces_full_fetch() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/d.bin";
    let transport = EchoTransport::new(200, Some("\"r1\""));
    let cache = cache_with(transport.clone(), &temp, 1);
    cache.get(url, &[]).await.unwrap();

    let key = cache.store().codec().encode(url);
    fs::write(cache.store().codec().sidecar_path(&key), "one-field-only").unwrap();

    let request = cache.get(url, &[]).await.unwrap();
    assert_eq!(request.response().data(), url.as_bytes());
    assert_eq!(transport.calls(), 2);
}

// =============================================================================
// Offline Fallback
// =============================================================================

#[tokio::test]
async fn test_server_error_falls_back_to_disk_copy() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/e.bin";
    let transport = SequenceTransport::new(vec![
        ok_response(url, 200, Some("\"r1\""), b"durable copy"),
        ok_response(url, 500, None, b"server melted"),
    ]);
    cache_with(transport.clone(), &temp, 1)
        .get(url, &[])
        .await
        .unwrap();

    let cache = cache_with(transport, &temp, 2);
    let request = cache.get(url, &[]).await.unwrap();

    // Served as offline-success, not as the 500.
    assert_eq!(request.response().status(), 200);
    assert_eq!(request.response().data(), b"durable copy");
    assert_eq!(request.response().etag(), Some("\"r1\""));

    // Generation stamp untouched by the fallback.
    let key = cache.store().codec().encode(url);
    assert_eq!(cache.store().read_sidecar(&key).unwrap().generation, 1);
}

#[tokio::test]
async fn test_transport_error_falls_back_to_disk_copy() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/f.bin";
    let transport = SequenceTransport::new(vec![
        ok_response(url, 200, None, b"kept"),
        transport_error(url),
    ]);
    cache_with(transport.clone(), &temp, 1)
        .get(url, &[])
        .await
        .unwrap();

    let request = cache_with(transport, &temp, 2).get(url, &[]).await.unwrap();
    assert_eq!(request.response().status(), 200);
    assert_eq!(request.response().data(), b"kept");
}

#[tokio::test]
async fn test_failure_without_copy_propagates() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/g.bin";

    let failing = SequenceTransport::new(vec![ok_response(url, 503, None, b"unavailable")]);
    let request = cache_with(failing, &temp, 1).get(url, &[]).await.unwrap();
    assert_eq!(request.response().status(), 503);

    let erroring = SequenceTransport::new(vec![transport_error(url)]);
    let result = cache_with(erroring, &temp, 1).get(url, &[]).await;
    assert!(matches!(result, Err(AccessorError::Transport { .. })));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_distinct_keys_write_distinct_records() {
    let temp = TempDir::new().unwrap();
    let transport = EchoTransport::new(200, Some("\"r1\""));
    let cache = cache_with(transport.clone(), &temp, 1);

    let urls: Vec<String> = (0..16)
        .map(|i| format!("https://tiles.test/l/{}/tile.bin", i))
        .collect();

    let handles: Vec<_> = urls.iter().map(|url| cache.schedule_get(url, &[])).collect();
    let results = futures::future::join_all(handles.into_iter().map(|h| h.join())).await;

    for (url, result) in urls.iter().zip(results) {
        let request = result.unwrap().unwrap();
        assert_eq!(request.response().data(), url.as_bytes());
    }
    assert_eq!(transport.calls(), 16);

    // Every record landed intact under its own path, with no temp debris.
    for url in &urls {
        let key = cache.store().codec().encode(url);
        let record = cache.store().read_if_fresh(&key, 1).expect("record exists");
        assert_eq!(record.data, url.as_bytes());
    }
    let mut temp_files = Vec::new();
    collect_temp_files(temp.path(), &mut temp_files);
    assert!(temp_files.is_empty(), "temp files left: {:?}", temp_files);
}

fn collect_temp_files(dir: &std::path::Path, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_temp_files(&path, out);
        } else if path.to_string_lossy().contains(".tmp") {
            out.push(path);
        }
    }
}

// =============================================================================
// Crash Safety
// =============================================================================

#[tokio::test]
async fn test_orphaned_temp_never_shadows_committed_record() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/h.bin";
    let transport = EchoTransport::new(200, Some("\"r1\""));
    let cache = cache_with(transport.clone(), &temp, 1);
    cache.get(url, &[]).await.unwrap();

    // Simulate a writer killed between temp write and rename.
    let key = cache.store().codec().encode(url);
    let data_path = cache.store().codec().data_path(&key);
    let orphan = format!("{}.tmp12345-0", data_path.display());
    fs::write(&orphan, b"half-written garbage").unwrap();

    // The committed record still reads back intact, transport-free.
    let request = cache.get(url, &[]).await.unwrap();
    assert_eq!(request.response().data(), url.as_bytes());
    assert_eq!(transport.calls(), 1);
}

// =============================================================================
// Disabled Cache
// =============================================================================

#[tokio::test]
async fn test_generation_zero_never_touches_disk() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/i.bin";
    let transport = EchoTransport::new(200, Some("\"r1\""));
    let cache = cache_with(transport.clone(), &temp, 0);

    for _ in 0..3 {
        let request = cache.get(url, &[]).await.unwrap();
        assert_eq!(request.response().data(), url.as_bytes());
    }

    assert_eq!(transport.calls(), 3);
    let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().flatten().collect();
    assert!(entries.is_empty(), "cache dir must stay empty: {:?}", entries);
}

// =============================================================================
// Caller Headers
// =============================================================================

#[tokio::test]
async fn test_caller_headers_are_forwarded() {
    let temp = TempDir::new().unwrap();
    let url = "https://tiles.test/l/0/j.bin";
    let transport = SequenceTransport::new(vec![ok_response(url, 200, None, b"x")]);
    let cache = cache_with(transport.clone(), &temp, 1);

    let headers = vec![("Authorization".to_string(), "Bearer token".to_string())];
    cache.get(url, &headers).await.unwrap();

    assert_eq!(
        transport.header_sent(0, "Authorization"),
        Some("Bearer token".to_string())
    );
}
