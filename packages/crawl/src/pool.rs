//! Fixed-size worker pool for crawling user histories.
//!
//! Usernames are fed through a bounded channel shared by `workers` tasks.
//! Each worker owns its collector (and with it its throttle), saves one
//! user at a time, and returns its own tally when the queue drains. The
//! per-worker tallies are summed once every worker has finished, so no
//! counter is shared between tasks.

use std::sync::Arc;
use std::time::Duration;

use filmgraph_scraper::PageFetcher;
use filmgraph_scraper::paginate::Collector;
use filmgraph_scraper::progress::ProgressCallback;
use filmgraph_store::ArtifactStore;
use tokio::sync::{Mutex, mpsc};

use crate::{CrawlConfig, CrawlError, CrawlSummary, save_user_reviews_with};

type Queue = Arc<Mutex<mpsc::Receiver<String>>>;

/// Saves the history of every user in `usernames` across
/// [`CrawlConfig::workers`] concurrent workers.
///
/// A user whose collection or write fails is logged and counted in
/// [`CrawlSummary::failed`]; the rest of the round carries on.
///
/// # Errors
///
/// Returns [`CrawlError::Join`] if a worker panics, or
/// [`CrawlError::Scrape`] if a worker cannot build its collector. Every
/// worker is awaited before the first such error is returned.
pub async fn crawl_users<F: PageFetcher + 'static>(
    fetcher: Arc<F>,
    config: &CrawlConfig,
    usernames: Vec<String>,
    progress: Arc<dyn ProgressCallback>,
) -> Result<CrawlSummary, CrawlError> {
    let workers = config.workers.max(1);
    let (tx, rx) = mpsc::channel::<String>(workers);
    let queue: Queue = Arc::new(Mutex::new(rx));
    let store = config.store();

    log::debug!("Starting {workers} crawl workers");

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let fetcher = Arc::clone(&fetcher);
            let queue = Arc::clone(&queue);
            let store = store.clone();
            let base_url = config.base_url.clone();
            let delay = config.delay;
            let progress = Arc::clone(&progress);

            tokio::spawn(async move {
                run_worker(worker, fetcher, store, base_url, delay, queue, progress).await
            })
        })
        .collect();
    drop(queue);

    for username in usernames {
        if tx.send(username).await.is_err() {
            log::warn!("All crawl workers stopped before the queue drained");
            break;
        }
    }
    drop(tx);

    let mut summary = CrawlSummary::default();
    let mut first_error = None;
    for handle in handles {
        match handle.await.map_err(CrawlError::from).and_then(|tally| tally) {
            Ok(tally) => summary += tally,
            Err(e) => {
                log::error!("Crawl worker failed: {e}");
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    log::info!(
        "Crawl round finished: {} saved, {} already saved, {} empty, {} failed",
        summary.saved,
        summary.already_saved,
        summary.no_data,
        summary.failed,
    );

    Ok(summary)
}

async fn run_worker<F: PageFetcher>(
    worker: usize,
    fetcher: Arc<F>,
    store: ArtifactStore,
    base_url: String,
    delay: Duration,
    queue: Queue,
    progress: Arc<dyn ProgressCallback>,
) -> Result<CrawlSummary, CrawlError> {
    let mut collector = Collector::new(fetcher.as_ref(), &base_url, delay)?;
    let mut tally = CrawlSummary::default();

    loop {
        let next = queue.lock().await.recv().await;
        let Some(username) = next else {
            break;
        };

        progress.set_message(username.clone());
        match save_user_reviews_with(&mut collector, &store, &username).await {
            Ok(outcome) => tally.record(&outcome),
            Err(e) => {
                log::error!("Failed to save reviews for {username}: {e}");
                tally.failed += 1;
            }
        }
        progress.inc(1);
    }

    log::debug!("Worker {worker} done: {tally:?}");
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use filmgraph_film_models::ArtifactKind;
    use filmgraph_scraper::progress::null_progress;
    use filmgraph_scraper::urls;

    const BASE: &str = "https://example.test";

    fn config(dir: &std::path::Path, workers: usize) -> CrawlConfig {
        CrawlConfig {
            data_dir: dir.to_path_buf(),
            workers,
            delay: Duration::ZERO,
            base_url: BASE.to_owned(),
            ..CrawlConfig::default()
        }
    }

    #[tokio::test]
    async fn empty_queue_finishes_with_empty_summary() {
        let tmp = temp_dir("pool_empty_queue");
        let fetcher = Arc::new(FakeFetcher::default());

        let summary = crawl_users(Arc::clone(&fetcher), &config(&tmp, 3), Vec::new(), null_progress())
            .await
            .unwrap();

        assert_eq!(summary, CrawlSummary::default());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn every_user_is_handled_exactly_once() {
        let tmp = temp_dir("pool_every_user_once");
        let names: Vec<String> = (0..10).map(|i| format!("user{i}")).collect();
        let mut fetcher = FakeFetcher::default();
        for (i, name) in names.iter().enumerate() {
            if i % 2 == 0 {
                fetcher = fetcher.with_page(urls::user_films_url(BASE, name, 1), posters(&[1]));
            }
        }
        let fetcher = Arc::new(fetcher);

        let summary = crawl_users(Arc::clone(&fetcher), &config(&tmp, 4), names.clone(), null_progress())
            .await
            .unwrap();

        assert_eq!(summary.saved, 5);
        assert_eq!(summary.no_data, 5);
        assert_eq!(summary.total(), 10);

        let store = ArtifactStore::new(&tmp);
        for (i, name) in names.iter().enumerate() {
            assert_eq!(
                store.exists(ArtifactKind::UserReviews, name).unwrap(),
                i % 2 == 0
            );
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn zero_workers_still_runs_one() {
        let tmp = temp_dir("pool_zero_workers");
        let fetcher = Arc::new(
            FakeFetcher::default().with_page(urls::user_films_url(BASE, "solo", 1), posters(&[9])),
        );

        let summary = crawl_users(fetcher, &config(&tmp, 0), vec!["solo".to_owned()], null_progress())
            .await
            .unwrap();

        assert_eq!(summary.saved, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn write_failure_counts_as_failed() {
        let tmp = temp_dir("pool_write_failure");
        let store = ArtifactStore::new(&tmp);
        let blocked = store
            .artifact_path(ArtifactKind::UserReviews, "blocked")
            .unwrap()
            .with_extension("csv.tmp");
        std::fs::create_dir_all(&blocked).unwrap();

        let fetcher = Arc::new(
            FakeFetcher::default()
                .with_page(urls::user_films_url(BASE, "blocked", 1), posters(&[1]))
                .with_page(urls::user_films_url(BASE, "fine", 1), posters(&[2])),
        );

        let summary = crawl_users(
            fetcher,
            &config(&tmp, 2),
            vec!["blocked".to_owned(), "fine".to_owned()],
            null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.saved, 1);
        assert!(!store.exists(ArtifactKind::UserReviews, "blocked").unwrap());
        assert!(store.exists(ArtifactKind::UserReviews, "fine").unwrap());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn panicking_worker_does_not_cut_the_round_short() {
        let tmp = temp_dir("pool_panicking_worker");
        let mut fetcher = FakeFetcher::default()
            .with_page(urls::user_films_url(BASE, "ann", 1), posters(&[1]))
            .with_page(urls::user_films_url(BASE, "bea", 1), posters(&[2]));
        fetcher.panicking = Some(urls::user_films_url(BASE, "boom", 1));

        let result = crawl_users(
            Arc::new(fetcher),
            &config(&tmp, 2),
            vec!["boom".to_owned(), "ann".to_owned(), "bea".to_owned()],
            null_progress(),
        )
        .await;

        assert!(matches!(result, Err(CrawlError::Join(_))));
        let store = ArtifactStore::new(&tmp);
        assert!(store.exists(ArtifactKind::UserReviews, "ann").unwrap());
        assert!(store.exists(ArtifactKind::UserReviews, "bea").unwrap());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
