//! Sequential page collection for one subject.
//!
//! A [`Collector`] walks numbered pages starting at 1 and stops at the first
//! page that yields no records, or at the configured page ceiling. Pages are
//! fetched strictly one after another: whether page N+1 exists is only known
//! once page N has been read.
//!
//! A fetch failure aborts the whole walk. Records from earlier pages are
//! discarded with it, so callers never see a partial subject.

use std::sync::Arc;
use std::time::Duration;

use filmgraph_film_models::{FilmReviewerRecord, ReviewRecord, WatchlistRecord};

use crate::extract::{
    PageSelectors, ParsedPage, parse_film_reviewers_page, parse_review_page, parse_watchlist_page,
};
use crate::progress::{ProgressCallback, null_progress};
use crate::throttle::RequestThrottle;
use crate::{PageFetcher, ScrapeError, urls};

/// Default page ceiling for film member tables. A pragmatic bound on how
/// deep one film is walked, not a limit observed on the site.
pub const FILM_REVIEW_PAGE_LIMIT: u32 = 24;

/// How far a [`Collector`] may walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Last page to fetch. `None` walks until an empty page.
    pub max_pages: Option<u32>,
}

impl Pagination {
    /// Walk until an empty page.
    pub const UNBOUNDED: Self = Self { max_pages: None };

    /// Walk at most `max_pages` pages.
    #[must_use]
    pub const fn bounded(max_pages: u32) -> Self {
        Self {
            max_pages: Some(max_pages),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectorState {
    Fetching { page: u32 },
    Done,
}

/// Drives page fetches for one collection stream.
///
/// Owns the stream's [`RequestThrottle`], so consecutive collections on the
/// same collector are paced against each other as well.
pub struct Collector<'a, F: PageFetcher> {
    fetcher: &'a F,
    base_url: String,
    throttle: RequestThrottle,
    selectors: PageSelectors,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a, F: PageFetcher> Collector<'a, F> {
    /// Creates a collector that waits at least `delay` between requests.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if the page selectors fail to compile.
    pub fn new(fetcher: &'a F, base_url: &str, delay: Duration) -> Result<Self, ScrapeError> {
        Ok(Self {
            fetcher,
            base_url: base_url.to_owned(),
            throttle: RequestThrottle::new(delay),
            selectors: PageSelectors::new()?,
            progress: null_progress(),
        })
    }

    /// Reports one unit of progress per page that produced records.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Collects a user's rated-film history.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScrapeError`] raised while fetching.
    pub async fn user_reviews(&mut self, username: &str) -> Result<Vec<ReviewRecord>, ScrapeError> {
        let base = self.base_url.clone();
        self.collect(
            Pagination::UNBOUNDED,
            |page| urls::user_films_url(&base, username, page),
            parse_review_page,
        )
        .await
    }

    /// Collects a user's watchlist.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScrapeError`] raised while fetching.
    pub async fn watchlist(&mut self, username: &str) -> Result<Vec<WatchlistRecord>, ScrapeError> {
        let base = self.base_url.clone();
        self.collect(
            Pagination::UNBOUNDED,
            |page| urls::watchlist_url(&base, username, page),
            parse_watchlist_page,
        )
        .await
    }

    /// Collects the members who rated a film.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScrapeError`] raised while fetching.
    pub async fn film_reviewers(
        &mut self,
        film_slug: &str,
        pagination: Pagination,
    ) -> Result<Vec<FilmReviewerRecord>, ScrapeError> {
        let base = self.base_url.clone();
        self.collect(
            pagination,
            |page| urls::film_reviews_url(&base, film_slug, page),
            parse_film_reviewers_page,
        )
        .await
    }

    /// Walks pages built by `page_url`, extracting records with
    /// `parse_page`, until a page matches no fragments or `pagination` runs
    /// out. A page whose fragments were all dropped during extraction does
    /// not end the walk.
    ///
    /// Records are returned in page order, then in-page order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScrapeError`] raised while fetching. Records from
    /// earlier pages are dropped.
    pub async fn collect<T, U, P>(
        &mut self,
        pagination: Pagination,
        page_url: U,
        parse_page: P,
    ) -> Result<Vec<T>, ScrapeError>
    where
        U: Fn(u32) -> String,
        P: Fn(&str, &PageSelectors) -> ParsedPage<T>,
    {
        let mut records = Vec::new();
        let mut state = CollectorState::Fetching { page: 1 };

        while let CollectorState::Fetching { page } = state {
            if let Some(max) = pagination.max_pages
                && page > max
            {
                log::debug!("Reached max pages ({max}), stopping");
                state = CollectorState::Done;
                continue;
            }

            self.throttle.wait().await;
            let url = page_url(page);
            log::debug!("Fetching page {page}: {url}");
            let body = self.fetcher.fetch(&url).await?;

            let parsed = parse_page(&body, &self.selectors);
            if parsed.is_past_end() {
                log::debug!("Page {page} is empty, stopping");
                state = CollectorState::Done;
            } else {
                log::trace!(
                    "Page {page}: {} records from {} fragments",
                    parsed.records.len(),
                    parsed.matched
                );
                records.extend(parsed.records);
                self.progress.inc(1);
                state = CollectorState::Fetching { page: page + 1 };
            }
        }

        log::debug!("Collection complete: {} records", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    const BASE: &str = "https://example.test";

    /// Serves canned bodies; unknown URLs get an empty page.
    #[derive(Default)]
    struct FakeFetcher {
        pages: BTreeMap<String, String>,
        failing: Option<String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_page(mut self, url: String, body: String) -> Self {
            self.pages.insert(url, body);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
            self.requested.lock().unwrap().push(url.to_owned());
            if self.failing.as_deref() == Some(url) {
                return Err(ScrapeError::Io(std::io::Error::other("connection reset")));
            }
            Ok(self.pages.get(url).cloned().unwrap_or_default())
        }
    }

    fn posters(ids: &[u32]) -> String {
        ids.iter()
            .map(|id| {
                format!(
                    r#"<li class="poster-container"><div class="really-lazy-load" data-film-id="{id}" data-film-slug="/film/f{id}/"><img alt="Film {id}"></div><span class="rating">★★</span></li>"#
                )
            })
            .collect()
    }

    fn member_rows(names: &[&str]) -> String {
        let rows: String = names
            .iter()
            .map(|n| {
                format!(
                    r#"<tr><td class="table-person"><a class="name" href="/{n}/">{n}</a></td><td><span class="rating">★★★</span></td></tr>"#
                )
            })
            .collect();
        format!(r#"<table class="person-table"><tr><th>Name</th></tr>{rows}</table>"#)
    }

    fn ids<T>(records: &[T], id: impl Fn(&T) -> Option<&str>) -> Vec<String> {
        records.iter().filter_map(|r| id(r).map(str::to_owned)).collect()
    }

    #[tokio::test]
    async fn stops_at_first_empty_page() {
        let fetcher = FakeFetcher::default()
            .with_page(urls::user_films_url(BASE, "alice", 1), posters(&[1, 2]))
            .with_page(urls::user_films_url(BASE, "alice", 2), posters(&[3]))
            .with_page(urls::user_films_url(BASE, "alice", 3), posters(&[4, 5]));

        let mut collector = Collector::new(&fetcher, BASE, Duration::ZERO).unwrap();
        let reviews = collector.user_reviews("alice").await.unwrap();

        assert_eq!(
            ids(&reviews, |r| r.film.external_id.as_deref()),
            vec!["1", "2", "3", "4", "5"]
        );
        let requested = fetcher.requested();
        assert_eq!(requested.len(), 4);
        assert_eq!(requested[3], urls::user_films_url(BASE, "alice", 4));
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let fetcher = FakeFetcher::default();
        let mut collector = Collector::new(&fetcher, BASE, Duration::ZERO).unwrap();
        let entries = collector.watchlist("nobody").await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(fetcher.requested(), vec![urls::watchlist_url(BASE, "nobody", 1)]);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_collection() {
        let mut fetcher = FakeFetcher::default()
            .with_page(urls::user_films_url(BASE, "alice", 1), posters(&[1]))
            .with_page(urls::user_films_url(BASE, "alice", 3), posters(&[3]));
        fetcher.failing = Some(urls::user_films_url(BASE, "alice", 2));

        let mut collector = Collector::new(&fetcher, BASE, Duration::ZERO).unwrap();
        let result = collector.user_reviews("alice").await;

        assert!(matches!(result, Err(ScrapeError::Io(_))));
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn bounded_pagination_stops_at_ceiling() {
        let slug = "/film/popular/";
        let mut fetcher = FakeFetcher::default();
        for page in 1..=5 {
            fetcher = fetcher.with_page(
                urls::film_reviews_url(BASE, slug, page),
                member_rows(&[&format!("user{page}")]),
            );
        }

        let mut collector = Collector::new(&fetcher, BASE, Duration::ZERO).unwrap();
        let reviewers = collector
            .film_reviewers(slug, Pagination::bounded(3))
            .await
            .unwrap();

        let names: Vec<&str> = reviewers.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["user1", "user2", "user3"]);
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn bounded_pagination_still_stops_on_empty_page() {
        let slug = "/film/obscure/";
        let fetcher = FakeFetcher::default()
            .with_page(urls::film_reviews_url(BASE, slug, 1), member_rows(&["a", "b"]));

        let mut collector = Collector::new(&fetcher, BASE, Duration::ZERO).unwrap();
        let reviewers = collector
            .film_reviewers(slug, Pagination::bounded(FILM_REVIEW_PAGE_LIMIT))
            .await
            .unwrap();

        assert_eq!(reviewers.len(), 2);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn page_of_dropped_rows_does_not_end_walk() {
        let slug = "/film/noisy/";
        let bad_rows = r#"<table class="person-table"><tr><th>Name</th></tr>
            <tr><td class="table-person"><a class="name" href="bad">x</a></td></tr>
            <tr><td class="table-person"><a class="name" href="worse">y</a></td></tr>
            </table>"#;
        let fetcher = FakeFetcher::default()
            .with_page(urls::film_reviews_url(BASE, slug, 1), member_rows(&["a"]))
            .with_page(urls::film_reviews_url(BASE, slug, 2), bad_rows.to_owned())
            .with_page(urls::film_reviews_url(BASE, slug, 3), member_rows(&["c"]));

        let mut collector = Collector::new(&fetcher, BASE, Duration::ZERO).unwrap();
        let reviewers = collector
            .film_reviewers(slug, Pagination::bounded(FILM_REVIEW_PAGE_LIMIT))
            .await
            .unwrap();

        let names: Vec<&str> = reviewers.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(fetcher.requested().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_paced_by_the_throttle() {
        let fetcher = FakeFetcher::default()
            .with_page(urls::user_films_url(BASE, "alice", 1), posters(&[1]))
            .with_page(urls::user_films_url(BASE, "alice", 2), posters(&[2]));

        let mut collector = Collector::new(&fetcher, BASE, Duration::from_secs(2)).unwrap();
        let start = tokio::time::Instant::now();
        collector.user_reviews("alice").await.unwrap();

        // Three requests, two enforced gaps.
        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}
