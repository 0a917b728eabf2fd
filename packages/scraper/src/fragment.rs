//! Document query capability used by the extractors.
//!
//! Extraction code only ever asks a fragment for its descendants, one of its
//! attributes, or its text. [`Fragment`] captures exactly that so extractors
//! stay independent of how the document was parsed.

use scraper::{ElementRef, Selector};

use crate::ScrapeError;

/// A queryable piece of a parsed document.
pub trait Fragment: Sized {
    /// Returns every descendant matching `selector`, in document order.
    fn query_all(&self, selector: &Selector) -> Vec<Self>;

    /// Returns the first descendant matching `selector`.
    fn query_first(&self, selector: &Selector) -> Option<Self>;

    /// Returns the value of attribute `name`, if present.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Returns the concatenated text content.
    fn text(&self) -> String;
}

impl Fragment for ElementRef<'_> {
    fn query_all(&self, selector: &Selector) -> Vec<Self> {
        self.select(selector).collect()
    }

    fn query_first(&self, selector: &Selector) -> Option<Self> {
        self.select(selector).next()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(ToOwned::to_owned)
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if `selector` is not valid CSS.
pub fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}
