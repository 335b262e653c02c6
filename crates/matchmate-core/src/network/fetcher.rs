//! Remote fetcher: endpoint descriptors, response caching, and retries.
//!
//! The fetcher is the only component that issues network I/O for API
//! payloads. It resolves an [`Endpoint`] against the fixed upstream
//! host, consults an in-memory TTL cache keyed by the fully-resolved
//! URL, and classifies failures into the crate error taxonomy. The
//! fetcher is dependency-injected into the sync engine behind the
//! [`RemoteFetcher`] trait so tests can substitute a fake.

use crate::config::{ApiConfig, FetcherConfig, NetworkConfig};
use crate::network::client::HttpClient;
use crate::network::retry::{retry_async, RetryConfig};
use crate::{MatchError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mini_moka::sync::Cache;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Descriptor for a request against the fixed upstream host.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Path below the API base, e.g. `/api`.
    pub path: String,
    /// HTTP method.
    pub method: Method,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
    /// Per-request timeout; the client default applies when absent.
    pub timeout: Option<Duration>,
    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,
}

impl Endpoint {
    /// Create a GET endpoint for the given path.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            timeout: None,
            query: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The user-list endpoint for one sync cycle (fixed page size).
    pub fn user_list() -> Self {
        Self::get(ApiConfig::USERS_PATH)
            .with_query("results", ApiConfig::USERS_PER_FETCH.to_string())
            .with_header("Content-Type", "application/json")
            .with_timeout(ApiConfig::USERS_REQUEST_TIMEOUT)
    }

    /// Resolve the fully-qualified URL for this endpoint.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(ApiConfig::API_BASE).map_err(|_| MatchError::InvalidUrl {
            url: ApiConfig::API_BASE.to_string(),
        })?;
        url.set_path(&self.path);
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Source of raw remote payloads.
///
/// The engine owns a boxed implementation; production code uses
/// [`HttpFetcher`], tests substitute a counting fake.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch the payload for an endpoint on the fixed upstream host.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<u8>>;

    /// Fetch the payload at an absolute URL (profile images live on a
    /// different host than the API).
    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>>;
}

/// A cached response: payload bytes plus the fetch timestamp.
#[derive(Debug, Clone)]
struct CachedResponse {
    body: Arc<Vec<u8>>,
    fetched_at: DateTime<Utc>,
}

/// HTTP-backed [`RemoteFetcher`] with response caching and retries.
pub struct HttpFetcher {
    client: Arc<HttpClient>,
    config: FetcherConfig,
    /// Response cache keyed by resolved URL. Absent when the freshness
    /// window is zero (the default), which disables caching entirely.
    cache: Option<Cache<String, CachedResponse>>,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration (caching disabled).
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a fetcher with custom configuration.
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = Arc::new(HttpClient::new()?);
        Ok(Self::with_client(client, config))
    }

    /// Create a fetcher sharing an existing HTTP client.
    pub fn with_client(client: Arc<HttpClient>, config: FetcherConfig) -> Self {
        let cache = if config.freshness_window.is_zero() {
            None
        } else {
            Some(
                Cache::builder()
                    .time_to_live(config.freshness_window)
                    .max_capacity(64)
                    .build(),
            )
        };

        Self {
            client,
            config,
            cache,
        }
    }

    /// Whether response caching is active.
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .with_max_retries(self.config.max_retries)
            .with_base_delay(self.config.retry_base_delay)
    }

    /// One network attempt, classified into the error taxonomy.
    async fn fetch_once(&self, endpoint: &Endpoint, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .request(
                endpoint.method.clone(),
                url.as_str(),
                &endpoint.headers,
                endpoint.body.as_ref(),
                endpoint.timeout,
            )
            .await?;

        let status = response.status();
        if !HttpClient::is_success(status) {
            return Err(MatchError::StatusCode {
                code: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| MatchError::Network {
            message: format!("Failed to read response body: {}", e),
            cause: None,
        })?;

        if bytes.is_empty() {
            return Err(MatchError::NoData);
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<u8>> {
        let url = endpoint.url()?;
        let cache_key = url.to_string();

        // Cache hit within the freshness window short-circuits the network.
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cache_key) {
                debug!(
                    "Response cache hit for {} (fetched at {})",
                    cache_key, cached.fetched_at
                );
                return Ok(cached.body.as_ref().clone());
            }
        }

        let (result, stats) = retry_async(
            &self.retry_config(),
            || self.fetch_once(endpoint, &url),
            |e: &MatchError| e.is_retryable(),
        )
        .await;

        if stats.attempts > 1 {
            debug!("Fetch of {} took {} attempts", cache_key, stats.attempts);
        }

        let bytes = result?;

        if let Some(cache) = &self.cache {
            cache.insert(
                cache_key,
                CachedResponse {
                    body: Arc::new(bytes.clone()),
                    fetched_at: Utc::now(),
                },
            );
        }

        Ok(bytes)
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>> {
        // Single attempt, no cache: callers treat these fetches as
        // best-effort (image absence is not fatal).
        let response = self
            .client
            .get_with_timeout(url, NetworkConfig::IMAGE_REQUEST_TIMEOUT)
            .await?;

        let status = response.status();
        if !HttpClient::is_success(status) {
            warn!("GET {} answered with status {}", url, status);
            return Err(MatchError::StatusCode {
                code: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| MatchError::Network {
            message: format!("Failed to read response body: {}", e),
            cause: None,
        })?;

        Ok(bytes.to_vec())
    }
}

/// Decode a JSON payload, surfacing failures as [`MatchError::Decoding`]
/// distinct from transport errors.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| MatchError::Decoding {
        message: format!("Failed to decode response: {}", e),
        source: Some(e),
    })
}
