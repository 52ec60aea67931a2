//! HTTP client with retry and throttling
//!
//! Provides the retrying requester used for every feed request:
//! - Retries on transport failure or any non-2xx status, with a fixed or
//!   linearly incrementing delay (no jitter, no circuit breaker)
//! - Buffered or streamed response body, chosen per endpoint
//! - Blanket per-request timeout at the transport layer

use super::rate_limit::{Throttle, ThrottleConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::types::{FetchMode, RetryStyle, StringMap};
use bytes::BytesMut;
use futures::StreamExt;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay between retries
    pub retry_interval: Duration,
    /// Delay strategy
    pub retry_style: RetryStyle,
    /// Outbound request throttle
    pub throttle: Option<ThrottleConfig>,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            // The feed corpus retries up to 10 total attempts at 2.5s apart
            max_retries: 9,
            retry_interval: Duration::from_millis(2500),
            retry_style: RetryStyle::Fixed,
            throttle: None,
            default_headers: StringMap::new(),
            user_agent: format!("datafeed-kit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the retry delay and style
    pub fn retry(mut self, style: RetryStyle, interval: Duration) -> Self {
        self.config.retry_style = style;
        self.config.retry_interval = interval;
        self
    }

    /// Set the outbound throttle
    pub fn throttle(mut self, config: ThrottleConfig) -> Self {
        self.config.throttle = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Request body (urlencoded form)
    pub form: Option<StringMap>,
    /// How to read the response body
    pub fetch_mode: FetchMode,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override max retries for this request
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set urlencoded form body
    #[must_use]
    pub fn form(mut self, form: StringMap) -> Self {
        self.form = Some(form);
        self
    }

    /// Set the response fetch mode
    #[must_use]
    pub fn fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// A fetched response with its body already read
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// HTTP client with retry and throttling
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    throttle: Option<Throttle>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");

        let throttle = config.throttle.as_ref().map(Throttle::new);

        Self {
            client,
            config,
            authenticator: None,
            throttle,
        }
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Self {
        let mut client = Self::with_config(config);
        client.authenticator = Some(Authenticator::with_client(
            auth_config,
            client.client.clone(),
        ));
        client
    }

    /// Set the authenticator
    pub fn set_authenticator(&mut self, auth_config: AuthConfig) {
        self.authenticator = Some(Authenticator::with_client(auth_config, self.client.clone()));
    }

    /// Establish the session artifact eagerly for session-based schemes
    pub async fn prime_auth(&self) -> Result<()> {
        match &self.authenticator {
            Some(auth) => auth.prime().await,
            None => Ok(()),
        }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<PageResponse> {
        self.execute(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a GET request and parse the body as JSON
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let page = self.execute(Method::GET, url, RequestConfig::default()).await?;
        serde_json::from_str(&page.body)
            .map_err(|e| Error::parse(format!("Invalid JSON response from {url}: {e}")))
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &str, body: Value) -> Result<PageResponse> {
        self.execute(Method::POST, url, RequestConfig::default().json(body))
            .await
    }

    /// Execute a request with retries.
    ///
    /// Retry state lives entirely on this call's stack; independent requests
    /// never see each other's attempt counters. The retry path is awaited all
    /// the way down, so its settlement always propagates to the caller.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<PageResponse> {
        let full_url = self.build_url(url);
        let max_retries = config.max_retries.unwrap_or(self.config.max_retries);
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let mut attempt = 0;
        loop {
            match self.attempt(&method, &full_url, &config, timeout).await {
                Ok(page) => {
                    debug!("Request succeeded: {} {}", method, full_url);
                    return Ok(page);
                }
                // Auth and parse failures are fatal for the run, not retried
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    if attempt >= max_retries {
                        return Err(Error::exhausted(attempt + 1, err));
                    }
                    let delay = self.calculate_delay(attempt);
                    warn!(
                        "Request failed ({err}), attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Issue a single attempt and read the body
    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        config: &RequestConfig,
        timeout: Duration,
    ) -> Result<PageResponse> {
        if let Some(ref throttle) = self.throttle {
            throttle.wait().await;
        }

        let mut req = self.client.request(method.clone(), url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        if let Some(ref body) = config.body {
            req = req.json(body);
        }
        if let Some(ref form) = config.form {
            req = req.form(form);
        }
        req = req.timeout(timeout);

        if let Some(ref auth) = self.authenticator {
            req = auth.apply(req).await?;
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        let body = self.read_body(response, config.fetch_mode, timeout).await?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), body));
        }

        Ok(PageResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// Read the response body in the configured mode
    async fn read_body(
        &self,
        response: Response,
        mode: FetchMode,
        timeout: Duration,
    ) -> Result<String> {
        match mode {
            FetchMode::Buffered => response.text().await.map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }
                } else {
                    Error::Http(e)
                }
            }),
            FetchMode::Streamed => {
                let mut stream = response.bytes_stream();
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(Error::Http)?;
                    buf.extend_from_slice(&chunk);
                }
                String::from_utf8(buf.to_vec())
                    .map_err(|e| Error::parse(format!("Response body is not valid UTF-8: {e}")))
            }
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Calculate the retry delay for a given attempt
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self.config.retry_style {
            RetryStyle::Fixed => self.config.retry_interval,
            RetryStyle::Linear => self.config.retry_interval * (attempt + 1),
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_throttle", &self.throttle.is_some())
            .finish_non_exhaustive()
    }
}
