//! Network layer: HTTP client, retries, connectivity, remote fetching.

pub mod client;
pub mod fetcher;
pub mod monitor;
pub mod retry;

pub use client::HttpClient;
pub use fetcher::{decode_json, Endpoint, HttpFetcher, RemoteFetcher};
pub use monitor::{ConnectivityMonitor, MonitorConfig};
pub use retry::{retry_async, RetryConfig, RetryStats};
