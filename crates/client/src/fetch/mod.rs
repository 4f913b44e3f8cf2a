//! HTTP fetch collaborator.
//!
//! The engine and pipeline talk to the network through the [`HttpFetcher`]
//! trait: given a URL and extra headers, it returns status, headers, and
//! body bytes, or a failure. Non-2xx statuses are returned, not raised;
//! classification is the caller's job. [`ReqwestFetcher`] is the production
//! implementation; tests substitute canned responses.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use cuppy_core::Error;
use reqwest::Client;
use std::time::Duration;

pub use url::{UrlError, canonicalize, robots_location};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "cuppy/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "cuppy/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers as (name, value) pairs
    pub headers: Vec<(String, String)>,
    /// Response body bytes (empty for 304)
    pub body: Bytes,
}

impl HttpResponse {
    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All header values matching `name`, case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Network fetch collaborator.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Issue a GET for `url` with the given extra headers.
    ///
    /// Returns the response for any status code; `Err` means a
    /// network-level failure, a timeout, or an oversized body.
    async fn get(&self, url: &::url::Url, headers: &[(String, String)]) -> Result<HttpResponse, Error>;
}

/// HTTP fetcher backed by reqwest.
pub struct ReqwestFetcher {
    http: Client,
    config: FetchConfig,
}

impl ReqwestFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &::url::Url, headers: &[(String, String)]) -> Result<HttpResponse, Error> {
        let mut request = self.http.get(url.as_str());
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{}: {}", url, e))
            } else {
                Error::HttpError(format!("network error: {}", e))
            }
        })?;

        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(url = %url, status, bytes = body.len(), "fetched");

        Ok(HttpResponse { status, headers, body })
    }
}
