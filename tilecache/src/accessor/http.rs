//! Direct HTTP transport over reqwest.

use crate::accessor::types::{AccessorError, AssetAccessor};
use crate::asset::{AssetRequest, AssetResponse, Header};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{trace, warn};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent string for HTTP requests.
/// Required by some tile servers that reject requests without a User-Agent.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Direct transport accessor over a pooled reqwest client.
///
/// Unlike a plain download client, this surfaces every response (status,
/// headers and body) without filtering on success codes; classification is
/// the caching layer's job. Errors occur only when no response could be
/// produced at all (connect failure, timeout, unreadable body).
#[derive(Clone)]
pub struct HttpAccessor {
    client: reqwest::Client,
}

impl HttpAccessor {
    /// Create an accessor with the default timeout.
    pub fn new() -> Result<Self, AccessorError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Create an accessor with a custom timeout.
    ///
    /// Tuned for many small parallel asset requests: a large warm connection
    /// pool, TCP keepalive and nodelay.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, AccessorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(128)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| AccessorError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    async fn execute(
        &self,
        verb: &str,
        builder: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<AssetRequest, AccessorError> {
        trace!(url, verb, "HTTP request starting");

        let response = builder.send().await.map_err(|e| {
            warn!(
                url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            AccessorError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status().as_u16();
        let resolved_url = response.url().to_string();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let data = response.bytes().await.map_err(|e| {
            warn!(url, error = %e, "failed to read response body");
            AccessorError::Transport {
                url: url.to_string(),
                message: format!("failed to read response body: {}", e),
            }
        })?;

        trace!(url, status, bytes = data.len(), "HTTP response read");

        Ok(AssetRequest::new(
            verb,
            resolved_url,
            AssetResponse::new(status, headers, data.to_vec()),
        ))
    }

    fn apply_headers(
        mut builder: reqwest::RequestBuilder,
        headers: &[Header],
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder
    }
}

impl AssetAccessor for HttpAccessor {
    async fn get(&self, url: &str, headers: &[Header]) -> Result<AssetRequest, AccessorError> {
        let builder = Self::apply_headers(self.client.get(url), headers);
        self.execute("GET", builder, url).await
    }

    async fn get_no_cache(
        &self,
        url: &str,
        headers: &[Header],
    ) -> Result<AssetRequest, AccessorError> {
        // The direct transport has no cache to bypass.
        self.get(url, headers).await
    }

    async fn request(
        &self,
        verb: &str,
        url: &str,
        headers: &[Header],
        body: &[u8],
    ) -> Result<AssetRequest, AccessorError> {
        let method =
            reqwest::Method::from_bytes(verb.as_bytes()).map_err(|e| AccessorError::Transport {
                url: url.to_string(),
                message: format!("invalid method {:?}: {}", verb, e),
            })?;
        let builder = Self::apply_headers(self.client.request(method, url), headers)
            .body(body.to_vec());
        self.execute(verb, builder, url).await
    }
}
