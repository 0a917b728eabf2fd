#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the filmgraph crawler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use filmgraph_cli_utils::IndicatifProgress;
use filmgraph_crawl::overlap::watchlist_overlap;
use filmgraph_crawl::{
    CrawlConfig, DEFAULT_WORKERS, crawl_frontier, frontier_usernames, save_film_reviews,
    save_user_reviews,
};
use filmgraph_scraper::fetch::{DEFAULT_BASE_URL, FetchConfig, HttpFetcher};
use filmgraph_scraper::paginate::FILM_REVIEW_PAGE_LIMIT;

#[derive(Parser)]
#[command(name = "filmgraph", about = "Letterboxd review crawler")]
struct Cli {
    /// Directory holding `user_reviews/` and `film_reviews/`
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,
    /// Number of concurrent crawl workers
    #[arg(long, global = true, default_value_t = DEFAULT_WORKERS)]
    workers: usize,
    /// Minimum delay between requests of one worker, in milliseconds
    #[arg(long, global = true, default_value = "500")]
    delay_ms: u64,
    /// Site root to crawl
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one crawl round over every reviewer in the saved film tables
    /// (the default)
    Crawl,
    /// Save the member ratings of one or more films
    FilmReviews {
        /// Film slugs (e.g., "/film/the-matrix/")
        #[arg(required = true)]
        slugs: Vec<String>,
        /// Maximum number of member pages per film
        #[arg(long, default_value_t = FILM_REVIEW_PAGE_LIMIT)]
        max_pages: u32,
    },
    /// Save the rated-film history of one or more users
    UserReviews {
        #[arg(required = true)]
        usernames: Vec<String>,
    },
    /// List films that are on every given user's watchlist
    Overlap {
        #[arg(required = true)]
        usernames: Vec<String>,
    },
    /// Print the users the next crawl round would visit
    Frontier,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = filmgraph_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = CrawlConfig {
        data_dir: cli.data_dir,
        workers: cli.workers,
        delay: Duration::from_millis(cli.delay_ms),
        base_url: cli.base_url,
        ..CrawlConfig::default()
    };
    let fetcher = Arc::new(HttpFetcher::new(&FetchConfig::new())?);

    match cli.command.unwrap_or(Commands::Crawl) {
        Commands::Crawl => {
            let start = Instant::now();
            let progress = IndicatifProgress::subjects_bar(&multi, "Crawling users", 0);
            let summary = crawl_frontier(fetcher, &config, progress).await?;
            log::info!(
                "Crawled {} users in {:.1}s",
                summary.total(),
                start.elapsed().as_secs_f64()
            );
        }
        Commands::FilmReviews { slugs, max_pages } => {
            config.film_review_pages = max_pages;
            for slug in &slugs {
                let progress = IndicatifProgress::pages_spinner(&multi, slug);
                if let Err(e) = save_film_reviews(fetcher.as_ref(), &config, slug, progress).await {
                    log::error!("Failed to save reviews for {slug}: {e}");
                }
            }
        }
        Commands::UserReviews { usernames } => {
            for username in &usernames {
                if let Err(e) = save_user_reviews(fetcher.as_ref(), &config, username).await {
                    log::error!("Failed to save reviews for {username}: {e}");
                }
            }
        }
        Commands::Overlap { usernames } => {
            let films = watchlist_overlap(fetcher.as_ref(), &config, &usernames).await?;
            println!("{:<12} {:<40} SLUG", "ID", "TITLE");
            println!("{}", "-".repeat(72));
            for film in &films {
                println!(
                    "{:<12} {:<40} {}",
                    film.external_id.as_deref().unwrap_or("-"),
                    film.title.as_deref().unwrap_or("-"),
                    film.slug.as_deref().unwrap_or("-"),
                );
            }
            log::info!("{} films on every watchlist", films.len());
        }
        Commands::Frontier => {
            let usernames = frontier_usernames(&config)?;
            println!("{} users in frontier", usernames.len());
            println!("{}", "-".repeat(40));
            for username in &usernames {
                println!("{username}");
            }
        }
    }

    Ok(())
}
