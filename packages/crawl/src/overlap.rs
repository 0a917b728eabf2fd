//! Films shared by several users' watchlists.

use std::collections::BTreeSet;

use filmgraph_film_models::{FilmReference, WatchlistRecord};
use filmgraph_scraper::PageFetcher;
use filmgraph_scraper::paginate::Collector;

use crate::{CrawlConfig, CrawlError};

/// Collects each user's watchlist and returns the films on all of them.
///
/// # Errors
///
/// Returns [`CrawlError::Scrape`] if any watchlist cannot be collected.
pub async fn watchlist_overlap<F: PageFetcher>(
    fetcher: &F,
    config: &CrawlConfig,
    usernames: &[String],
) -> Result<Vec<FilmReference>, CrawlError> {
    let mut collector = Collector::new(fetcher, &config.base_url, config.delay)?;

    let mut watchlists = Vec::with_capacity(usernames.len());
    for username in usernames {
        let watchlist = collector.watchlist(username).await?;
        log::info!("{username}: {} films on watchlist", watchlist.len());
        watchlists.push(watchlist);
    }

    Ok(intersect_watchlists(&watchlists))
}

/// Intersects watchlists by film id.
///
/// Entries without an id never match. The result follows the first list's
/// order and carries the first list's title and slug for each film.
#[must_use]
pub fn intersect_watchlists(watchlists: &[Vec<WatchlistRecord>]) -> Vec<FilmReference> {
    let Some((first, rest)) = watchlists.split_first() else {
        return Vec::new();
    };

    let mut common = film_ids(first);
    for list in rest {
        let ids = film_ids(list);
        common.retain(|id| ids.contains(id));
    }

    first
        .iter()
        .filter(|entry| {
            entry
                .film
                .external_id
                .as_deref()
                .is_some_and(|id| common.remove(id))
        })
        .map(|entry| entry.film.clone())
        .collect()
}

fn film_ids(list: &[WatchlistRecord]) -> BTreeSet<&str> {
    list.iter()
        .filter_map(|entry| entry.film.external_id.as_deref())
        .collect()
}
