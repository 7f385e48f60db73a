//! REST client layer: base URL, bearer auth, rate limiting and retry.
//!
//! # Example
//!
//! ```ignore
//! use horizon_gridview_net::http::RestApiClient;
//!
//! let client = RestApiClient::builder("https://org.crm.dynamics.com/api/data/v9.0")
//!     .bearer_auth("my-token")
//!     .rate_limit_per_second(10)
//!     .build()?;
//!
//! // Paths are appended to the base URL
//! let views: serde_json::Value = client.get("savedqueries").json_response().await?;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::client::HttpClient;
use super::request::HttpRequest;
use super::response::HttpResponse;
use crate::error::Result;

const TARGET: &str = "horizon_gridview_net::rest_api";

/// Retry of throttled (429), 5xx and transient transport failures.
///
/// Delays grow by `backoff_multiplier` from `initial_delay_ms` up to
/// `max_delay_ms`. A `Retry-After` header on the response takes precedence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// The delay following `current`, capped at the maximum.
    pub fn next_delay(&self, current: Duration) -> Duration {
        current
            .mul_f64(self.backoff_multiplier)
            .min(Duration::from_millis(self.max_delay_ms))
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    updated: Instant,
}

/// Token bucket limiter allowing bursts of up to one second's worth of requests.
#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// A limiter for `requests_per_second` (at least one).
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = f64::from(requests_per_second.max(1));
        Self {
            per_second,
            capacity: per_second,
            bucket: Mutex::new(Bucket {
                tokens: per_second,
                updated: Instant::now(),
            }),
        }
    }

    /// Takes a token, or reports how long until one is available.
    pub fn try_acquire(&self) -> std::result::Result<(), Duration> {
        let mut bucket = self.bucket.lock();
        let now = Instant::now();
        let refill = now.duration_since(bucket.updated).as_secs_f64() * self.per_second;
        bucket.tokens = (bucket.tokens + refill).min(self.capacity);
        bucket.updated = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - bucket.tokens) / self.per_second))
        }
    }

    /// Takes a token, sleeping until one is available.
    pub async fn acquire(&self) {
        while let Err(wait) = self.try_acquire() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Builder for [`RestApiClient`].
pub struct RestApiClientBuilder {
    base_url: String,
    http_client: Option<HttpClient>,
    default_headers: http::HeaderMap,
    bearer_token: Option<String>,
    rate_limiter: Option<RateLimiter>,
    retry: RetryConfig,
}

impl RestApiClientBuilder {
    /// A builder for `base_url`; request paths are appended to it.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: None,
            default_headers: http::HeaderMap::new(),
            bearer_token: None,
            rate_limiter: None,
            retry: RetryConfig::default(),
        }
    }

    /// Replaces the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sends through an existing HTTP client.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Adds a header sent with every request. Invalid names or values are ignored.
    pub fn default_header(mut self, name: &'static str, value: &str) -> Self {
        match http::HeaderValue::try_from(value) {
            Ok(value) => {
                self.default_headers.insert(name, value);
            }
            Err(_) => tracing::warn!(target: TARGET, header = name, "ignoring invalid header value"),
        }
        self
    }

    /// Sends `Accept: application/json`.
    pub fn accept_json(self) -> Self {
        self.default_header("Accept", "application/json")
    }

    /// Authenticates every request with a bearer token.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Limits outgoing requests per second.
    pub fn rate_limit_per_second(mut self, requests_per_second: u32) -> Self {
        self.rate_limiter = Some(RateLimiter::new(requests_per_second));
        self
    }

    /// Configures retry behavior.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Disables retries.
    pub fn no_retry(self) -> Self {
        self.retry(RetryConfig::disabled())
    }

    /// Builds the client. Fails when the base URL does not parse.
    pub fn build(self) -> Result<RestApiClient> {
        url::Url::parse(&self.base_url)?;
        let http_client = match self.http_client {
            Some(client) => client,
            None => HttpClient::builder().build()?,
        };

        Ok(RestApiClient {
            inner: Arc::new(RestApiClientInner {
                base_url: self.base_url.trim_end_matches('/').to_string(),
                http_client,
                default_headers: self.default_headers,
                bearer_token: self.bearer_token,
                rate_limiter: self.rate_limiter,
                retry: self.retry,
            }),
        })
    }
}

struct RestApiClientInner {
    base_url: String,
    http_client: HttpClient,
    default_headers: http::HeaderMap,
    bearer_token: Option<String>,
    rate_limiter: Option<RateLimiter>,
    retry: RetryConfig,
}

/// A REST client bound to a base URL.
///
/// Clones share the connection pool and the rate limiter.
#[derive(Clone)]
pub struct RestApiClient {
    inner: Arc<RestApiClientInner>,
}

impl RestApiClient {
    /// A builder for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> RestApiClientBuilder {
        RestApiClientBuilder::new(base_url)
    }

    /// The base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.inner.retry
    }

    /// A GET request for `path` relative to the base URL.
    pub fn get(&self, path: &str) -> RestApiRequestBuilder {
        self.request(http::Method::GET, path)
    }

    /// A request for `path` relative to the base URL.
    pub fn request(&self, method: http::Method, path: &str) -> RestApiRequestBuilder {
        let url = format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'));
        let mut request = HttpRequest::get(url);
        request.method = method;
        request.headers = self.inner.default_headers.clone();
        request.bearer_token = self.inner.bearer_token.clone();

        RestApiRequestBuilder {
            client: self.clone(),
            request,
        }
    }

    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        let inner = &self.inner;
        let mut delay = Duration::from_millis(inner.retry.initial_delay_ms);
        let mut attempt = 0;

        loop {
            if let Some(limiter) = &inner.rate_limiter {
                limiter.acquire().await;
            }
            let exhausted = attempt >= inner.retry.max_retries;
            attempt += 1;

            let wait = match inner.http_client.execute(request.clone()).await {
                Ok(response) if exhausted || !response.is_retryable() => return Ok(response),
                Ok(response) => {
                    let wait = response.retry_after().unwrap_or(delay);
                    tracing::debug!(target: TARGET, status = response.status(), attempt, "retrying after status");
                    wait
                }
                Err(err) if exhausted || !err.is_transient() => return Err(err),
                Err(err) => {
                    tracing::debug!(target: TARGET, error = %err, attempt, "retrying after error");
                    delay
                }
            };

            tokio::time::sleep(wait).await;
            delay = inner.retry.next_delay(delay);
        }
    }
}

impl std::fmt::Debug for RestApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestApiClient")
            .field("base_url", &self.inner.base_url)
            .field("has_auth", &self.inner.bearer_token.is_some())
            .field("retry", &self.inner.retry)
            .finish()
    }
}

/// A request being prepared by a [`RestApiClient`].
pub struct RestApiRequestBuilder {
    client: RestApiClient,
    request: HttpRequest,
}

impl RestApiRequestBuilder {
    /// Adds a header. Invalid values are ignored.
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = http::HeaderValue::try_from(value) {
            self.request.headers.insert(name, value);
        }
        self
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((key.into(), value.into()));
        self
    }

    /// Adds query parameters.
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.request.query.extend(pairs);
        self
    }

    /// Overrides the client's timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// The request as it would be sent.
    pub fn build(self) -> HttpRequest {
        self.request
    }

    /// Sends the request, retrying as configured.
    ///
    /// A non-2xx status left after retrying is returned as a response.
    pub async fn send(self) -> Result<HttpResponse> {
        self.client.execute_with_retry(self.request).await
    }

    /// Sends the request and parses a 2xx body as JSON.
    ///
    /// Other statuses fail with [`NetworkError::HttpStatus`](crate::NetworkError::HttpStatus).
    pub async fn json_response<T: DeserializeOwned>(self) -> Result<T> {
        self.send().await?.error_for_status_with_body().await?.json().await
    }
}
