//! Save-once gate around subject collection.
//!
//! An artifact on disk means its subject is finished. [`save_artifact`]
//! checks for one before doing any work, so re-running a crawl only
//! collects subjects that have no artifact yet.
//!
//! Subjects that collect zero rows are not written. On disk, "never
//! attempted", "attempted and empty", and "attempted and failed" all look
//! the same, and all three are retried on the next run.

use std::future::Future;
use std::path::PathBuf;

use filmgraph_film_models::ArtifactKind;
use filmgraph_scraper::ScrapeError;
use serde::Serialize;

use crate::{ArtifactStore, StoreError};

/// What [`save_artifact`] did for a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// An artifact already existed; nothing was collected.
    AlreadySaved,
    /// Collection returned no rows; nothing was written.
    NoData,
    /// A new artifact was written.
    Saved {
        /// Number of rows written.
        rows: usize,
        /// Where the artifact was written.
        path: PathBuf,
    },
}

/// Collects and writes the artifact for `subject` unless one already exists.
///
/// `collect` runs only when no artifact is present, and at most once.
///
/// # Errors
///
/// Returns [`StoreError::Scrape`] if `collect` fails (nothing is written),
/// or another [`StoreError`] if the artifact cannot be written (nothing is
/// left on disk).
pub async fn save_artifact<R, C, Fut>(
    store: &ArtifactStore,
    kind: ArtifactKind,
    subject: &str,
    collect: C,
) -> Result<SaveOutcome, StoreError>
where
    R: Serialize,
    C: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<R>, ScrapeError>>,
{
    if store.exists(kind, subject)? {
        log::info!("{kind} for {subject} already saved");
        return Ok(SaveOutcome::AlreadySaved);
    }

    let rows = collect().await?;
    if rows.is_empty() {
        log::info!("No {kind} found for {subject}");
        return Ok(SaveOutcome::NoData);
    }

    match store.write(kind, subject, &rows) {
        Ok(path) => {
            log::info!("Saved {} {kind} rows for {subject}", rows.len());
            Ok(SaveOutcome::Saved {
                rows: rows.len(),
                path,
            })
        }
        Err(e) => {
            log::error!("Error saving {kind} for {subject}: {e}");
            Err(e)
        }
    }
}
