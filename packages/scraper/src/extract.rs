//! Record extraction from listing and member-table markup.
//!
//! Poster containers (one per film in a history or watchlist grid) become
//! [`ReviewRecord`]s or [`WatchlistRecord`]s. Rows of a film's member-rating
//! table become [`FilmReviewerRecord`]s.
//!
//! Each field is extracted on its own. A missing element leaves that field
//! as `None` and never prevents the rest of the record from being read.

use filmgraph_film_models::{FilmReference, FilmReviewerRecord, ReviewRecord, WatchlistRecord};
use scraper::{Html, Selector};

use crate::ScrapeError;
use crate::fragment::{Fragment, parse_selector};
use crate::stars::parse_stars;

/// Compiled selectors for every page shape the extractors understand.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    /// One film entry in a poster grid.
    poster_container: Selector,
    /// Poster image; its `alt` is the film title.
    image: Selector,
    /// Lazy-load marker carrying `data-film-id` and `data-film-slug`.
    lazy_load: Selector,
    /// Rendered star rating.
    rating: Selector,
    /// Member-ratings table on a film's members page.
    person_table: Selector,
    /// Rows inside the member-ratings table.
    table_row: Selector,
    /// Profile link inside a member row.
    profile_link: Selector,
}

impl PageSelectors {
    /// Compiles the selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a selector fails to compile.
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            poster_container: parse_selector(".poster-container")?,
            image: parse_selector("img")?,
            lazy_load: parse_selector(".really-lazy-load")?,
            rating: parse_selector(".rating")?,
            person_table: parse_selector(".person-table")?,
            table_row: parse_selector("tr")?,
            profile_link: parse_selector(".table-person .name")?,
        })
    }
}

/// Reads the title, id, and slug of the film a poster container shows.
pub fn extract_film_reference<F: Fragment>(poster: &F, selectors: &PageSelectors) -> FilmReference {
    let title = poster
        .query_first(&selectors.image)
        .and_then(|img| img.attribute("alt"));

    let marker = poster.query_first(&selectors.lazy_load);
    let external_id = marker.as_ref().and_then(|m| m.attribute("data-film-id"));
    let slug = marker.as_ref().and_then(|m| m.attribute("data-film-slug"));

    FilmReference {
        title,
        external_id,
        slug,
    }
}

/// Extracts a rated-history entry from a poster container.
pub fn extract_review<F: Fragment>(poster: &F, selectors: &PageSelectors) -> ReviewRecord {
    let rating = poster
        .query_first(&selectors.rating)
        .map(|r| parse_stars(&r.text()));

    ReviewRecord {
        film: extract_film_reference(poster, selectors),
        rating,
    }
}

/// Extracts a watchlist entry from a poster container.
pub fn extract_watchlist_entry<F: Fragment>(
    poster: &F,
    selectors: &PageSelectors,
) -> WatchlistRecord {
    WatchlistRecord {
        film: extract_film_reference(poster, selectors),
    }
}

/// Extracts a reviewer from one row of the member-ratings table.
///
/// Rows without a profile link carry no identity and yield `Ok(None)`. A
/// row without a rating element keeps an empty rating.
///
/// # Errors
///
/// Returns [`ScrapeError::MalformedIdentifier`] if the profile link does not
/// have the `/{username}/` shape.
pub fn extract_reviewer<F: Fragment>(
    row: &F,
    selectors: &PageSelectors,
) -> Result<Option<FilmReviewerRecord>, ScrapeError> {
    let Some(user_url) = row
        .query_first(&selectors.profile_link)
        .and_then(|link| link.attribute("href"))
    else {
        return Ok(None);
    };

    let username = username_from_profile_path(&user_url)?.to_owned();
    let user_rating = row
        .query_first(&selectors.rating)
        .map(|r| parse_stars(&r.text()));

    Ok(Some(FilmReviewerRecord {
        user_url,
        user_rating,
        username,
    }))
}

/// Derives a username from a profile path such as `/someone/`.
///
/// The username is the second `/`-separated segment.
///
/// # Errors
///
/// Returns [`ScrapeError::MalformedIdentifier`] if the path has fewer than
/// two segments or the second one is empty.
pub fn username_from_profile_path(path: &str) -> Result<&str, ScrapeError> {
    match path.split('/').nth(1) {
        Some(name) if !name.is_empty() => Ok(name),
        Some(_) => Err(ScrapeError::MalformedIdentifier {
            value: path.to_owned(),
            reason: "empty username segment",
        }),
        None => Err(ScrapeError::MalformedIdentifier {
            value: path.to_owned(),
            reason: "expected a path of the form /{username}/",
        }),
    }
}

/// Records extracted from one page, with the number of fragments (posters
/// or member rows) the page matched.
///
/// `matched` can exceed `records.len()` when rows are dropped. A page is
/// past the end of its listing only when it matched nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage<T> {
    /// Fragments matched on the page, counted before extraction.
    pub matched: usize,
    /// Records that survived extraction, in page order.
    pub records: Vec<T>,
}

impl<T> ParsedPage<T> {
    const fn empty() -> Self {
        Self {
            matched: 0,
            records: Vec::new(),
        }
    }

    /// `true` if the page matched no fragments at all.
    #[must_use]
    pub const fn is_past_end(&self) -> bool {
        self.matched == 0
    }
}

/// Extracts every rated-history entry on a user's films page.
#[must_use]
pub fn parse_review_page(html: &str, selectors: &PageSelectors) -> ParsedPage<ReviewRecord> {
    let document = Html::parse_document(html);
    let posters = document.root_element().query_all(&selectors.poster_container);
    ParsedPage {
        matched: posters.len(),
        records: posters
            .iter()
            .map(|poster| extract_review(poster, selectors))
            .collect(),
    }
}

/// Extracts every entry on a user's watchlist page.
#[must_use]
pub fn parse_watchlist_page(html: &str, selectors: &PageSelectors) -> ParsedPage<WatchlistRecord> {
    let document = Html::parse_document(html);
    let posters = document.root_element().query_all(&selectors.poster_container);
    ParsedPage {
        matched: posters.len(),
        records: posters
            .iter()
            .map(|poster| extract_watchlist_entry(poster, selectors))
            .collect(),
    }
}

/// Extracts every reviewer on a film's members page.
///
/// A page without a member table matches nothing. The table's first row is
/// the header and is neither counted nor extracted. Rows with a malformed
/// profile link are logged and dropped but still count as matched, so a
/// page of bad rows does not end the walk.
#[must_use]
pub fn parse_film_reviewers_page(
    html: &str,
    selectors: &PageSelectors,
) -> ParsedPage<FilmReviewerRecord> {
    let document = Html::parse_document(html);
    let Some(table) = document.root_element().query_first(&selectors.person_table) else {
        return ParsedPage::empty();
    };

    let rows = table.query_all(&selectors.table_row);
    let member_rows = rows.get(1..).unwrap_or_default();

    ParsedPage {
        matched: member_rows.len(),
        records: member_rows
            .iter()
            .filter_map(|row| match extract_reviewer(row, selectors) {
                Ok(reviewer) => reviewer,
                Err(e) => {
                    log::warn!("Dropping member row: {e}");
                    None
                }
            })
            .collect(),
    }
}
