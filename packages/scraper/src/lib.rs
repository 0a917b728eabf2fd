#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Page fetching and record extraction for film listing pages.
//!
//! Provides the [`PageFetcher`] capability (with an HTTP implementation in
//! [`fetch`]), the star-rating parser ([`stars`]), record extraction over
//! parsed documents ([`extract`]), and the sequential page collector
//! ([`paginate`]) that drives them.
//!
//! This crate knows nothing about where records end up. Callers decide
//! whether and how to persist what it returns.

pub mod extract;
pub mod fetch;
pub mod fragment;
pub mod paginate;
pub mod progress;
pub mod stars;
pub mod throttle;
pub mod urls;

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parsing the response body or a selector failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An identifier did not have the expected path shape.
    #[error("Malformed identifier '{value}': {reason}")]
    MalformedIdentifier {
        /// The offending identifier.
        value: String,
        /// What was expected of it.
        reason: &'static str,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability for retrieving the text of a fully-formed URL.
///
/// Implementations must surface network failures and non-success statuses
/// as errors. They must not retry.
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the request fails or the server responds
    /// with a non-success status.
    fn fetch(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, ScrapeError>> + Send;
}
