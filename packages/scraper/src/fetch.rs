//! HTTP implementation of [`PageFetcher`].
//!
//! Requests carry a fixed set of browser headers. The site serves the same
//! listing markup to anything that looks like a desktop browser, and refuses
//! or degrades requests that don't.

use std::collections::BTreeMap;

use crate::{PageFetcher, ScrapeError};

/// Site root used when no other base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://letterboxd.com";

/// Configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Additional HTTP headers to include in requests.
    pub headers: BTreeMap<String, String>,
}

impl FetchConfig {
    /// Creates a config with the default browser headers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: default_browser_headers(),
        }
    }

    /// Adds or replaces an HTTP header.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches pages over HTTP with a shared [`reqwest::Client`].
///
/// Non-success statuses are returned as [`ScrapeError::Http`]. Nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher whose client sends the configured headers on every
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a header name or value is invalid,
    /// or [`ScrapeError::Http`] if the client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Parse(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Parse(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }
        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .build()
            .map_err(ScrapeError::Http)?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Header set that mimics a desktop Edge browser navigating to a page.
#[must_use]
pub fn default_browser_headers() -> BTreeMap<String, String> {
    [
        ("authority", "letterboxd.com"),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9",
        ),
        ("accept-language", "en-US,en;q=0.9"),
        ("cache-control", "max-age=0"),
        (
            "sec-ch-ua",
            r#""Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109""#,
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", r#""macOS""#),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
        (
            "user-agent",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36 Edg/109.0.1518.78",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}
