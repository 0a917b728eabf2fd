#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Breadth-first crawl from film reviewers to their rating histories.
//!
//! A crawl round reads every saved film member table, takes the distinct
//! reviewers as the frontier, and saves each reviewer's rated-film history
//! through a fixed-size pool of workers. Film member tables are seeded with
//! [`save_film_reviews`]. Subjects that already have an artifact are
//! skipped, so a round can be interrupted and re-run at any point.

pub mod overlap;
pub mod pool;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use filmgraph_film_models::{ArtifactKind, FilmReviewerRow, ReviewRow};
use filmgraph_scraper::extract::username_from_profile_path;
use filmgraph_scraper::fetch::DEFAULT_BASE_URL;
use filmgraph_scraper::paginate::{Collector, FILM_REVIEW_PAGE_LIMIT, Pagination};
use filmgraph_scraper::progress::ProgressCallback;
use filmgraph_scraper::throttle::DEFAULT_REQUEST_DELAY;
use filmgraph_scraper::{PageFetcher, ScrapeError, urls};
use filmgraph_store::gate::{SaveOutcome, save_artifact};
use filmgraph_store::{ArtifactStore, StoreError, film_artifact_name};

pub use overlap::watchlist_overlap;
pub use pool::crawl_users;

/// Number of crawl workers when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 8;

/// Errors that can occur while crawling.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// Fetching or extracting pages failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// Reading or writing artifacts failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A crawl worker panicked or was cancelled.
    #[error("Crawl worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Settings shared by every crawl operation.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Root of the artifact tree.
    pub data_dir: PathBuf,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Minimum delay between requests of one worker.
    pub delay: Duration,
    /// Site root that page URLs are built on.
    pub base_url: String,
    /// Page ceiling for film member tables.
    pub film_review_pages: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            workers: DEFAULT_WORKERS,
            delay: DEFAULT_REQUEST_DELAY,
            base_url: DEFAULT_BASE_URL.to_owned(),
            film_review_pages: FILM_REVIEW_PAGE_LIMIT,
        }
    }
}

impl CrawlConfig {
    /// The artifact store under [`Self::data_dir`].
    #[must_use]
    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.data_dir)
    }
}

/// Per-outcome subject counts for a crawl round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Subjects whose artifact was written this round.
    pub saved: u64,
    /// Subjects skipped because an artifact already existed.
    pub already_saved: u64,
    /// Subjects that had nothing to save.
    pub no_data: u64,
    /// Subjects whose collection or write failed.
    pub failed: u64,
}

impl CrawlSummary {
    /// Counts one subject's outcome.
    pub const fn record(&mut self, outcome: &SaveOutcome) {
        match outcome {
            SaveOutcome::Saved { .. } => self.saved += 1,
            SaveOutcome::AlreadySaved => self.already_saved += 1,
            SaveOutcome::NoData => self.no_data += 1,
        }
    }

    /// Total subjects handled.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.saved + self.already_saved + self.no_data + self.failed
    }
}

impl std::ops::AddAssign for CrawlSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.saved += rhs.saved;
        self.already_saved += rhs.already_saved;
        self.no_data += rhs.no_data;
        self.failed += rhs.failed;
    }
}

/// Saves a user's rated-film history unless it is already saved.
///
/// # Errors
///
/// Returns [`CrawlError`] if collection or the write fails. Nothing is
/// written in either case.
pub async fn save_user_reviews<F: PageFetcher>(
    fetcher: &F,
    config: &CrawlConfig,
    username: &str,
) -> Result<SaveOutcome, CrawlError> {
    let mut collector = Collector::new(fetcher, &config.base_url, config.delay)?;
    Ok(save_user_reviews_with(&mut collector, &config.store(), username).await?)
}

/// [`save_user_reviews`] on an existing collection stream.
pub(crate) async fn save_user_reviews_with<F: PageFetcher>(
    collector: &mut Collector<'_, F>,
    store: &ArtifactStore,
    username: &str,
) -> Result<SaveOutcome, StoreError> {
    save_artifact(store, ArtifactKind::UserReviews, username, move || async move {
        let reviews = collector.user_reviews(username).await?;
        Ok(reviews.iter().map(ReviewRow::from).collect::<Vec<_>>())
    })
    .await
}

/// Saves the member ratings of a film unless they are already saved.
///
/// `film_slug` is the site path of the film (`/film/{name}/`); the table is
/// stored under `{name}`.
///
/// # Errors
///
/// Returns [`CrawlError`] if the slug is malformed, or collection or the
/// write fails.
pub async fn save_film_reviews<F: PageFetcher>(
    fetcher: &F,
    config: &CrawlConfig,
    film_slug: &str,
    progress: Arc<dyn ProgressCallback>,
) -> Result<SaveOutcome, CrawlError> {
    let film_name = film_artifact_name(film_slug)?;
    log::info!(
        "Collecting member ratings for {}",
        urls::film_url(&config.base_url, film_slug)
    );
    let pagination = Pagination::bounded(config.film_review_pages);
    progress.set_total(u64::from(config.film_review_pages));

    let outcome = {
        let mut collector = Collector::new(fetcher, &config.base_url, config.delay)?
            .with_progress(Arc::clone(&progress));
        let collector = &mut collector;
        save_artifact(
            &config.store(),
            ArtifactKind::FilmReviews,
            film_name,
            move || async move {
                let reviewers = collector.film_reviewers(film_slug, pagination).await?;
                Ok(reviewers.iter().map(FilmReviewerRow::from).collect::<Vec<_>>())
            },
        )
        .await?
    };

    progress.finish(format!("{film_name}: {outcome:?}"));
    Ok(outcome)
}

/// Builds the current frontier and maps it to usernames.
///
/// Profile URLs that do not yield a username are logged and skipped.
///
/// # Errors
///
/// Returns [`CrawlError::Store`] if the film tables cannot be read.
pub fn frontier_usernames(config: &CrawlConfig) -> Result<Vec<String>, CrawlError> {
    let frontier = filmgraph_store::frontier::build_frontier(&config.store())?;
    Ok(frontier
        .iter()
        .filter_map(|url| match username_from_profile_path(url) {
            Ok(name) => Some(name.to_owned()),
            Err(e) => {
                log::warn!("Skipping frontier entry: {e}");
                None
            }
        })
        .collect())
}

/// Runs one crawl round: builds the frontier, then saves every frontier
/// user's history through the worker pool.
///
/// # Errors
///
/// Returns [`CrawlError`] if the frontier cannot be built or a worker
/// cannot start. Per-user failures are counted, not returned.
pub async fn crawl_frontier<F: PageFetcher + 'static>(
    fetcher: Arc<F>,
    config: &CrawlConfig,
    progress: Arc<dyn ProgressCallback>,
) -> Result<CrawlSummary, CrawlError> {
    let usernames = frontier_usernames(config)?;
    log::info!("Number of users to scrape: {}", usernames.len());
    progress.set_total(usernames.len() as u64);

    let summary = crawl_users(fetcher, config, usernames, Arc::clone(&progress)).await?;
    progress.finish(format!(
        "{} saved, {} already saved, {} empty, {} failed",
        summary.saved, summary.already_saved, summary.no_data, summary.failed
    ));
    Ok(summary)
}
