//! Low-level HTTP client over `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use super::request::HttpRequest;
use super::response::HttpResponse;
use crate::error::{NetworkError, Result};

/// Settings applied when the underlying client is built.
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Whole-request timeout.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
    /// Proxy URL for all traffic.
    pub proxy: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: format!("HorizonGridView/{} (Rust)", env!("CARGO_PKG_VERSION")),
            proxy: None,
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    default_headers: http::HeaderMap,
}

impl HttpClientBuilder {
    /// A builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Routes all requests through `proxy_url`.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Adds a header sent with every request.
    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = http::HeaderName::try_from(name)?;
        let value = http::HeaderValue::try_from(value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Builds the client.
    ///
    /// Cookies are kept so that session affinity cookies set by the server
    /// are sent back.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = reqwest::Client::builder()
            .user_agent(&self.config.user_agent)
            .cookie_store(true)
            .default_headers(self.default_headers);

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(proxy_url) = &self.config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| NetworkError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        Ok(HttpClient {
            inner: Arc::new(HttpClientInner {
                client: builder.build()?,
                config: self.config,
            }),
        })
    }
}

struct HttpClientInner {
    client: reqwest::Client,
    config: HttpClientConfig,
}

/// An asynchronous HTTP client.
///
/// Clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

impl HttpClient {
    /// A builder for a new client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// The settings the client was built with.
    pub fn config(&self) -> &HttpClientConfig {
        &self.inner.config
    }

    /// Sends `request` and waits for the response headers.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.full_url()?;
        tracing::trace!(
            target: "horizon_gridview_net::http",
            method = %request.method,
            url = %request.url,
            "sending request"
        );

        let mut builder = self
            .inner
            .client
            .request(request.method, url)
            .headers(request.headers);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpResponse::from_reqwest(builder.send().await?))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .finish()
    }
}
