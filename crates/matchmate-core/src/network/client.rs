//! HTTP client wrapper.
//!
//! Thin wrapper around reqwest with:
//! - Configurable default and per-request timeouts
//! - User-agent management
//! - Transport errors mapped into the crate taxonomy
//!
//! The client is explicitly constructed and handed to whoever needs it;
//! there is no global singleton.

use crate::config::NetworkConfig;
use crate::{MatchError, Result};
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;

/// HTTP client with timeout and error mapping.
pub struct HttpClient {
    client: Client,
    /// Default timeout applied when a request carries none of its own.
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("MatchMate/1.0")
            .build()
            .map_err(|e| MatchError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The default timeout for requests issued by this client.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::GET, url, &[], None, None).await
    }

    /// Make a GET request with a per-request timeout.
    pub async fn get_with_timeout(&self, url: &str, timeout: Duration) -> Result<Response> {
        self.request(Method::GET, url, &[], None, Some(timeout)).await
    }

    /// Make a request with custom headers, optional JSON body, and an
    /// optional per-request timeout.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<&serde_json::Value>,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let mut request = self.client.request(method.clone(), url);
        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                MatchError::Timeout(timeout.unwrap_or(self.default_timeout))
            } else {
                MatchError::Network {
                    message: format!("{} {} failed: {}", method, url, e),
                    cause: std::error::Error::source(&e).map(|s| s.to_string()),
                }
            }
        })
    }

    /// Check if an HTTP status code indicates success.
    pub fn is_success(status: StatusCode) -> bool {
        (200..300).contains(&status.as_u16())
    }
}
