//! File-backed caching accessor with conditional revalidation.

use crate::accessor::types::{AccessorError, AssetAccessor};
use crate::asset::{AssetRequest, Header, ResponseClass};
use crate::cache::{CacheKey, CacheStats, PathCodec, RecordStore};
use crate::config::CacheConfig;
use crate::executor::{TaskHandle, WorkerPool};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Caching accessor backed by `(data, data.info)` file pairs on disk.
///
/// Wraps any [`AssetAccessor`] and serves repeat requests from disk:
/// records stamped with the current generation are served without touching
/// the network; stale records are revalidated with `If-None-Match`; and when
/// the upstream fails, any disk copy is served as an offline fallback. A
/// generation stamp of `0` disables the cache and delegates every request to
/// the inner accessor.
///
/// Every `get`, including a fresh hit, runs as one unit of work on the
/// accessor's worker pool, so the calling thread never blocks on file or
/// socket I/O.
pub struct FileCacheAccessor<A> {
    inner: Arc<A>,
    store: Arc<RecordStore>,
    generation: i64,
    pool: WorkerPool,
    stats: Arc<Mutex<CacheStats>>,
}

impl<A> Clone for FileCacheAccessor<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            store: Arc::clone(&self.store),
            generation: self.generation,
            pool: self.pool.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<A: AssetAccessor> FileCacheAccessor<A> {
    /// Create an accessor from explicit configuration.
    pub fn new(inner: A, config: CacheConfig) -> Self {
        let codec = PathCodec::new(config.local_root, config.remote_prefix);
        Self {
            inner: Arc::new(inner),
            store: Arc::new(RecordStore::new(codec)),
            generation: config.generation,
            pool: WorkerPool::new(config.workers),
            stats: Arc::new(Mutex::new(CacheStats::new())),
        }
    }

    /// Snapshot of cache activity counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// The record store backing this accessor.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Schedule a cached fetch, returning a handle to the deferred result.
    ///
    /// The whole unit of work (disk lookup, optional conditional GET, and
    /// the record update) runs on the worker pool. Must be called within a
    /// tokio runtime.
    pub fn schedule_get(
        &self,
        url: &str,
        headers: &[Header],
    ) -> TaskHandle<Result<AssetRequest, AccessorError>> {
        let url = url.to_string();
        let headers = headers.to_vec();

        if self.generation == 0 {
            // Cache disabled: straight delegation, no disk involvement.
            let inner = Arc::clone(&self.inner);
            return self.pool.spawn(async move { inner.get(&url, &headers).await });
        }

        let inner = Arc::clone(&self.inner);
        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        let generation = self.generation;
        self.pool.spawn(async move {
            fetch_through_cache(inner, store, stats, generation, url, headers).await
        })
    }
}

impl<A: AssetAccessor> AssetAccessor for FileCacheAccessor<A> {
    async fn get(&self, url: &str, headers: &[Header]) -> Result<AssetRequest, AccessorError> {
        let handle = self.schedule_get(url, headers);
        handle
            .join()
            .await
            .map_err(|e| AccessorError::Worker(e.to_string()))?
    }

    fn get_no_cache(
        &self,
        url: &str,
        headers: &[Header],
    ) -> impl std::future::Future<Output = Result<AssetRequest, AccessorError>> + Send {
        self.inner.get_no_cache(url, headers)
    }

    fn request(
        &self,
        verb: &str,
        url: &str,
        headers: &[Header],
        body: &[u8],
    ) -> impl std::future::Future<Output = Result<AssetRequest, AccessorError>> + Send {
        self.inner.request(verb, url, headers, body)
    }
}

/// One cache unit of work: lookup, conditional fetch, record update.
async fn fetch_through_cache<A: AssetAccessor>(
    inner: Arc<A>,
    store: Arc<RecordStore>,
    stats: Arc<Mutex<CacheStats>>,
    generation: i64,
    url: String,
    headers: Vec<Header>,
) -> Result<AssetRequest, AccessorError> {
    let key = store.codec().encode(&url);

    if let Some(record) = store.read_if_fresh(&key, generation) {
        debug!(url = %url, key = %key, "cache hit");
        record_stat(&stats, CacheStats::record_hit);
        return Ok(AssetRequest::from_cache(
            record.info.original_url,
            record.data,
            &record.info.etag,
        ));
    }
    record_stat(&stats, CacheStats::record_miss);

    // A stale record still saves bandwidth: revalidate when its ETag is
    // known and the payload it validates is intact on disk.
    let stale_etag = store
        .read_sidecar(&key)
        .filter(|_| store.has_payload(&key))
        .map(|info| info.etag)
        .unwrap_or_default();

    let mut request_headers = headers;
    if !stale_etag.is_empty() {
        request_headers.push(("If-None-Match".to_string(), stale_etag.clone()));
    }

    match inner.get_no_cache(&url, &request_headers).await {
        Ok(completed) => match ResponseClass::of(completed.response().status()) {
            ResponseClass::NotModified => Ok(refresh_record(
                &store,
                &stats,
                &key,
                generation,
                &stale_etag,
                &completed,
            )),
            ResponseClass::Fresh => {
                let etag = completed.response().etag().unwrap_or("");
                if let Err(error) = store.write_fresh(
                    &key,
                    generation,
                    etag,
                    completed.url(),
                    completed.response().data(),
                ) {
                    warn!(url = completed.url(), %error, "failed to persist cache record");
                }
                record_stat(&stats, CacheStats::record_download);
                Ok(completed)
            }
            ResponseClass::Failure => {
                serve_fallback(&store, &stats, &key, &stale_etag, &url, Ok(completed))
            }
        },
        Err(error) => serve_fallback(&store, &stats, &key, &stale_etag, &url, Err(error)),
    }
}

/// Handle a 304: advance the sidecar and serve the payload already on disk.
fn refresh_record(
    store: &RecordStore,
    stats: &Mutex<CacheStats>,
    key: &CacheKey,
    generation: i64,
    stale_etag: &str,
    completed: &AssetRequest,
) -> AssetRequest {
    // A 304 may or may not repeat the validator; keep the stored one when it
    // doesn't.
    let etag = completed.response().etag().unwrap_or(stale_etag);
    if let Err(error) = store.touch_metadata(key, generation, etag, completed.url()) {
        warn!(url = completed.url(), %error, "failed to refresh cache metadata");
    }

    let data = store.read_bytes(key).unwrap_or_else(|error| {
        warn!(key = %key, %error, "cache payload unreadable after 304");
        Vec::new()
    });
    record_stat(stats, CacheStats::record_revalidation);
    debug!(url = completed.url(), key = %key, "revalidated cache record");
    AssetRequest::from_cache(completed.url(), data, stale_etag)
}

/// Serve the disk copy, fresh or not, when the upstream failed; propagate
/// the failure unchanged when there is none.
fn serve_fallback(
    store: &RecordStore,
    stats: &Mutex<CacheStats>,
    key: &CacheKey,
    stale_etag: &str,
    url: &str,
    upstream: Result<AssetRequest, AccessorError>,
) -> Result<AssetRequest, AccessorError> {
    if store.has_payload(key) {
        match store.read_bytes(key) {
            Ok(data) => {
                let served_url = match &upstream {
                    Ok(completed) => completed.url().to_string(),
                    Err(_) => url.to_string(),
                };
                debug!(url = %served_url, key = %key, "serving stale cache copy after upstream failure");
                record_stat(stats, CacheStats::record_offline_fallback);
                return Ok(AssetRequest::from_cache(served_url, data, stale_etag));
            }
            Err(error) => {
                warn!(key = %key, %error, "stale cache copy unreadable");
            }
        }
    }
    record_stat(stats, CacheStats::record_failure);
    upstream
}

fn record_stat(stats: &Mutex<CacheStats>, record: impl FnOnce(&mut CacheStats)) {
    if let Ok(mut stats) = stats.lock() {
        record(&mut stats);
    }
}
