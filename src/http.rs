//! HTTP transport for the harvester
//!
//! The rest of the crate only talks to the [`Fetcher`] trait, so sitemap
//! resolution and the harvest loop can run against an in-memory source in
//! tests. [`HttpFetcher`] is the production implementation on top of reqwest,
//! with bounded retries and exponential backoff for transient failures.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::Error as CrateError;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// Default number of retries after the first attempt
const DEFAULT_MAX_RETRIES: u32 = 4;

/// Default base backoff in milliseconds, doubled on each retry
const DEFAULT_BACKOFF_MS: u64 = 1200;

/// Conventional desktop browser identifier
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Languages requested from the catalog site
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7";

/// Raw response handed back to callers
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body, undecoded
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Error type for fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or timeout failure on a single attempt
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Every attempt failed with a transient error
    #[error("gave up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// URL that was requested
        url: String,
        /// Number of attempts made
        attempts: u32,
        /// Description of the final failure
        last: String,
    },

    /// The client could not be constructed
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(e) => CrateError::Http(e),
            FetchError::Config(msg) => CrateError::Config(msg),
            _ => CrateError::Fetch(err.to_string()),
        }
    }
}

/// Transport seam: URL in, status and raw bytes out
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetch a URL.
    ///
    /// Non-success statuses that are not worth retrying (404 and friends) are
    /// returned as a normal [`FetchResponse`]; only transient failures that
    /// survive the retry policy surface as errors.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Options for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff before the first retry; doubled for each following one
    pub base_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    max_retries: u32,
    base_backoff: Duration,
}

impl HttpFetcher {
    /// Create a fetcher from options
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| FetchError::Config(format!("Accept-Language: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = ReqwestClient::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            base_backoff: config.base_backoff,
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn attempt(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(FetchResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

/// Statuses worth another attempt
fn is_transient(status: u16) -> bool {
    StatusCode::from_u16(status)
        .map(|s| s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error())
        .unwrap_or(false)
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let attempts = self.max_retries + 1;
        let mut last = String::new();

        for attempt in 0..attempts {
            match self.attempt(url).await {
                Ok(response) if !is_transient(response.status) => {
                    debug!(status = response.status, bytes = response.body.len(), "fetched");
                    return Ok(response);
                }
                Ok(response) => last = format!("HTTP {}", response.status),
                Err(e) => last = e.to_string(),
            }

            if attempt + 1 < attempts {
                let backoff = self.backoff(attempt);
                warn!(
                    "Transient failure on {} ({}), attempt {}/{}, backing off {:.1}s",
                    url,
                    last,
                    attempt + 1,
                    attempts,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn fast_config() -> FetchConfig {
        FetchConfig {
            max_retries: 2,
            base_backoff: Duration::from_millis(1),
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_success_sends_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/sitemap.xml")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .match_header("accept-language", Matcher::Regex("^vi-VN".to_string()))
            .with_status(200)
            .with_body("<urlset></urlset>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&fast_config()).unwrap();
        let response = fetcher
            .fetch(&format!("{}/sitemap.xml", server.url()))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, b"<urlset></urlset>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/missing.xml")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&fast_config()).unwrap();
        let response = fetcher
            .fetch(&format!("{}/missing.xml", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&fast_config()).unwrap();
        let result = fetcher.fetch(&format!("{}/flaky", server.url())).await;

        match result {
            Err(FetchError::RetriesExhausted { attempts, last, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "HTTP 503");
            }
            other => panic!("Expected RetriesExhausted, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[test]
    fn test_backoff_doubles() {
        let fetcher = HttpFetcher::new(&FetchConfig {
            base_backoff: Duration::from_millis(100),
            ..FetchConfig::default()
        })
        .unwrap();

        assert_eq!(fetcher.backoff(0), Duration::from_millis(100));
        assert_eq!(fetcher.backoff(1), Duration::from_millis(200));
        assert_eq!(fetcher.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(429));
        assert!(is_transient(500));
        assert!(is_transient(502));
        assert!(!is_transient(404));
        assert!(!is_transient(200));
    }
}
