use crate::util::{validate_url, UrlValidationError};
use futures::StreamExt;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Transport timeout applied to every outbound fetch unless configured otherwise.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest response body read into memory unless configured otherwise.
pub const DEFAULT_MAX_BODY_SIZE: usize = 5 * 1024 * 1024; // 5MB
/// Redirect hops followed before a fetch gives up.
const MAX_REDIRECTS: usize = 3;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL failed validation (bad syntax, scheme, or internal host)
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the transport timeout
    #[error("request timed out")]
    Timeout,
    /// Response body exceeded the size limit
    #[error("response too large (exceeds {0} bytes)")]
    TooLarge(usize),
}

/// Transport policy for a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub user_agent: String,
    /// Permit localhost and private-range hosts. Off for public deployments.
    pub allow_private_networks: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_SIZE,
            user_agent: concat!("feedsub/", env!("CARGO_PKG_VERSION")).to_owned(),
            allow_private_networks: false,
        }
    }
}

/// The outcome of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the body was served from, after any redirects
    pub final_url: String,
    /// Full response body
    pub body: Vec<u8>,
    /// Raw `Content-Type` header, if the server sent one
    pub content_type: Option<String>,
}

/// Single-shot HTTP GET with redirect following and a body size cap.
///
/// Cloning is cheap; the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
    allow_private_networks: bool,
}

impl Fetcher {
    /// Builds a fetcher with its own HTTP client configured from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the HTTP client cannot be constructed
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = Self::client_builder(settings).build()?;
        Ok(Self::with_client(client, settings))
    }

    /// Client builder carrying the timeout, User-Agent and redirect guard
    /// for `settings`. Extend it and pass the result to [`Fetcher::with_client`].
    pub fn client_builder(settings: &FetchSettings) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .redirect(redirect_policy(settings.allow_private_networks))
    }

    /// Wraps an existing client. The client's own timeout and redirect
    /// policy apply, so it should come from [`Fetcher::client_builder`].
    pub fn with_client(client: reqwest::Client, settings: &FetchSettings) -> Self {
        Self {
            client,
            max_body_bytes: settings.max_body_bytes,
            allow_private_networks: settings.allow_private_networks,
        }
    }

    /// Applies the URL policy of this fetcher without fetching anything.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for unparseable URLs, non-http(s)
    /// schemes, and internal hosts when private networks are not allowed.
    pub fn check_url(&self, url: &str) -> Result<Url, FetchError> {
        validate_url(url, self.allow_private_networks)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    /// Performs exactly one GET of `url` and reads the whole body.
    ///
    /// Redirects are followed by the HTTP client; the URL reported in
    /// [`FetchedPage::final_url`] is the one the body actually came from.
    /// There are no retries.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on validation failure, network error, timeout,
    /// non-2xx status, or an oversized body.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let validated = self.check_url(url)?;

        let response = self
            .client
            .get(validated)
            .send()
            .await
            .map_err(from_transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "Fetch returned non-success status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = self.read_body(response).await?;

        tracing::debug!(
            url = %url,
            final_url = %final_url,
            content_type = content_type.as_deref().unwrap_or(""),
            bytes = body.len(),
            "Fetched page"
        );

        Ok(FetchedPage {
            final_url,
            body,
            content_type,
        })
    }

    /// Reads the response body, enforcing the size limit while streaming.
    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        // Fast path: check Content-Length header
        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(FetchError::TooLarge(self.max_body_bytes));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(from_transport)?;
            if bytes.len().saturating_add(chunk.len()) > self.max_body_bytes {
                return Err(FetchError::TooLarge(self.max_body_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }
}

/// Redirect policy: at most 3 hops, no loops, and every hop must pass the
/// same URL validation as the request itself.
fn redirect_policy(allow_private: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("Too many redirects (max {MAX_REDIRECTS})"));
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        if let Err(e) = validate_url(url.as_str(), allow_private) {
            tracing::warn!(to = %url, error = %e, "Refusing redirect");
            return attempt.error(e);
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

fn from_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }

    // A redirect refused by the URL policy is reported like a bad input URL
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        if let Some(rejected) = inner.downcast_ref::<UrlValidationError>() {
            return FetchError::InvalidUrl(format!("redirect target refused: {rejected}"));
        }
        source = inner.source();
    }

    FetchError::Network(err)
}
