//! # HTTP Retrieval Utilities
//!
//! An asynchronous API client wrapper around `reqwest`, with middleware
//! retries and uniform response handling. Bodies are returned as text; the
//! caller decides how to parse them.

use anyhow::{bail, Context};
use reqwest::{header::AUTHORIZATION, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

/// A standardized container for API responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// The response body on success.
    pub data: Option<T>,
    /// The raw body returned by the server when the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Whether the status code was in the 2xx range.
    pub success: bool,
}

/// # API Client
///
/// Holds a base URL, an optional bearer token and a retrying client.
pub struct ApiClient {
    inner: ClientWithMiddleware,
    base_url: Url,
    auth_token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ApiClient {
    /// Creates a client with an exponential backoff policy of
    /// `max_retries` retries.
    ///
    /// # Errors
    /// Fails when `base_url` is not an absolute `http`/`https` URL.
    pub fn new(base_url: &str, auth_token: Option<String>, max_retries: u32) -> anyhow::Result<Self> {
        let url = Url::parse(base_url).with_context(|| format!("Invalid base URL {:?}", base_url))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            bail!("Base URL must be an absolute http(s) URL: {}", base_url);
        }

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { inner: client, base_url: url, auth_token })
    }

    /// The base URL every request is built from.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded,
    /// so values containing `/`, `?` or spaces stay a single segment.
    ///
    /// # Errors
    /// Fails only for URLs that cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Performs a GET on the endpoint made of `segments` and returns the
    /// body as text.
    ///
    /// # Errors
    /// Returns an error when the request cannot be sent or the body cannot
    /// be read. Non-2xx answers are not errors; they come back with
    /// `success == false`.
    pub async fn get_text(&self, segments: &[&str]) -> anyhow::Result<ApiResponse<String>> {
        let full_url = self.endpoint(segments)?;
        log::debug!("GET {}", full_url);

        let mut req = self.inner.get(full_url);
        if let Some(token) = &self.auth_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();

        if status.is_success() {
            let data = response.text().await?;
            Ok(ApiResponse { data: Some(data), error_body: None, status: status.as_u16(), success: true })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse { data: None, error_body: error_text, status: status.as_u16(), success: false })
        }
    }
}
