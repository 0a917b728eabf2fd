#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `filmgraph` binary.
//!
//! Log output goes through `indicatif-log-bridge`, so lines printed by the
//! crawl workers are held back while a bar redraws instead of tearing it.

use std::sync::Arc;
use std::time::Duration;

use filmgraph_scraper::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

pub use indicatif::MultiProgress;

const SPINNER_TICK: Duration = Duration::from_millis(120);

const USERS_TEMPLATE: &str =
    "{prefix:.bold} {wide_bar:.green/dim} {pos}/{len} users [{elapsed_precise}, eta {eta}] {msg}";
const PAGES_SPINNER_TEMPLATE: &str = "{spinner:.cyan} {prefix:.bold} page {pos} {msg}";
const PAGES_BAR_TEMPLATE: &str = "  {prefix:.bold} {wide_bar:.cyan/dim} page {pos}/{len} {msg}";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("=> "))
}

/// [`ProgressCallback`] rendered as an `indicatif` bar.
///
/// The bar's prefix names the operation; [`ProgressCallback::set_message`]
/// fills the trailing status (e.g. the user a worker just picked up).
pub struct IndicatifProgress {
    bar: ProgressBar,
    sized_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Bar over the users of a crawl round. `total` may be zero and set
    /// later through [`ProgressCallback::set_total`].
    #[must_use]
    pub fn subjects_bar(
        multi: &MultiProgress,
        label: &str,
        total: u64,
    ) -> Arc<dyn ProgressCallback> {
        let sized_style = style(USERS_TEMPLATE);
        let bar = multi.add(ProgressBar::new(total).with_style(sized_style.clone()));
        bar.set_prefix(label.to_owned());

        Arc::new(Self { bar, sized_style })
    }

    /// Spinner counting the pages of one film's member table. Becomes a bar
    /// once the page ceiling is known.
    #[must_use]
    pub fn pages_spinner(multi: &MultiProgress, film_slug: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner().with_style(style(PAGES_SPINNER_TEMPLATE)));
        bar.enable_steady_tick(SPINNER_TICK);
        bar.set_prefix(film_slug.to_owned());

        Arc::new(Self {
            bar,
            sized_style: style(PAGES_BAR_TEMPLATE),
        })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.sized_style.clone());
        self.bar.set_length(total);
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge`.
///
/// Logs at `info` unless `RUST_LOG` says otherwise. Returns the
/// [`MultiProgress`] every bar must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .build();
    let max_level = logger.filter();

    // Already installed when embedded in tests.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(max_level);
    }

    multi
}
