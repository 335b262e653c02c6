//! Centralized configuration for the MatchMate library.
//!
//! Constants for the upstream API contract and network behavior live
//! here so the rest of the crate never hard-codes hosts or timeouts.

use std::time::Duration;

/// Upstream API contract (fixed host/scheme, see the wire module).
pub struct ApiConfig;

impl ApiConfig {
    /// Base URL of the randomized-user upstream.
    pub const API_BASE: &'static str = "https://randomuser.me";
    /// Path of the user-list endpoint.
    pub const USERS_PATH: &'static str = "/api";
    /// Fixed page size for a sync cycle.
    pub const USERS_PER_FETCH: u32 = 10;
    /// Timeout for the user-list request.
    pub const USERS_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    /// Retries after the initial attempt (so 4 attempts total by default).
    pub const MAX_RETRIES: u32 = 3;
    /// Freshness window for the response cache. Zero disables caching.
    pub const CACHE_FRESHNESS_WINDOW: Duration = Duration::ZERO;
    /// Image fetches are best-effort, so they get a shorter timeout.
    pub const IMAGE_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
}

/// Runtime configuration for the remote fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// How long a cached response may be reused instead of re-fetched.
    /// Zero disables response caching entirely.
    pub freshness_window: Duration,
    /// Retries after the initial attempt for retryable failures.
    pub max_retries: u32,
    /// Base delay between retries (grows exponentially, jittered).
    pub retry_base_delay: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            freshness_window: NetworkConfig::CACHE_FRESHNESS_WINDOW,
            max_retries: NetworkConfig::MAX_RETRIES,
            retry_base_delay: Duration::from_millis(250),
        }
    }
}

impl FetcherConfig {
    /// Set the cache freshness window.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Set the retry budget (retries after the initial attempt).
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base retry delay.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}
