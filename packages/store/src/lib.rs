#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flat-file artifact store for collected tables.
//!
//! Each subject (a username or a film) gets exactly one CSV artifact under
//! a per-kind directory:
//!
//! ```text
//! {root}/user_reviews/{username}_reviews.csv
//! {root}/film_reviews/{film_name}_reviews.csv
//! ```
//!
//! An artifact that exists is complete: it is written to a temporary file
//! and renamed into place, and never rewritten. [`gate`] builds the
//! save-once behaviour on top of that, and [`frontier`] reads the film
//! tables back to choose the next users to crawl.

pub mod frontier;
pub mod gate;

use std::path::{Path, PathBuf};

use filmgraph_film_models::ArtifactKind;
use filmgraph_scraper::ScrapeError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors that can occur while reading or writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Encoding or decoding a CSV table failed.
    #[error("CSV error at {path}: {source}")]
    Csv {
        /// Path that caused the error.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A subject cannot be turned into an artifact file name.
    #[error("Invalid subject '{subject}': {reason}")]
    InvalidSubject {
        /// The rejected subject.
        subject: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Collecting the subject's records failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

/// Root of the on-disk artifact tree.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens a store rooted at `root`. Nothing is created until the first
    /// write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every artifact of `kind`.
    #[must_use]
    pub fn kind_dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.directory())
    }

    /// Path of the artifact for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSubject`] if `subject` is empty or could
    /// escape the kind directory.
    pub fn artifact_path(&self, kind: ArtifactKind, subject: &str) -> Result<PathBuf, StoreError> {
        validate_subject(subject)?;
        Ok(self.kind_dir(kind).join(format!("{subject}_reviews.csv")))
    }

    /// Returns `true` if an artifact for `subject` is already on disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSubject`] for unusable subjects.
    pub fn exists(&self, kind: ArtifactKind, subject: &str) -> Result<bool, StoreError> {
        Ok(self.artifact_path(kind, subject)?.exists())
    }

    /// Writes `rows` as the artifact for `subject`, with a header row taken
    /// from the row type's field names.
    ///
    /// The table is written to a temporary file and renamed into place, so
    /// a failed write leaves no artifact behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory, the temporary file, or the
    /// rename fails, or a row cannot be encoded.
    pub fn write<R: Serialize>(
        &self,
        kind: ArtifactKind,
        subject: &str,
        rows: &[R],
    ) -> Result<PathBuf, StoreError> {
        let path = self.artifact_path(kind, subject)?;
        let dir = self.kind_dir(kind);
        std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        let tmp_path = path.with_extension("csv.tmp");
        if let Err(e) = write_rows(&tmp_path, rows) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        std::fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            io_error(&path, e)
        })?;

        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    /// Lists every artifact of `kind`, sorted by file name. A missing kind
    /// directory lists as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be read.
    pub fn list(&self, kind: ArtifactKind) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| io_error(&dir, e))? {
            let entry = entry.map_err(|e| io_error(&dir, e))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Reads an artifact back into rows. Rows that fail to decode are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened or its header
    /// cannot be read.
    pub fn read<R: DeserializeOwned>(&self, path: &Path) -> Result<Vec<R>, StoreError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
        reader.headers().map_err(|e| csv_error(path, e))?;

        let mut rows = Vec::new();
        for (line, result) in reader.deserialize::<R>().enumerate() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => log::warn!("Skipping row {} of {}: {e}", line + 1, path.display()),
            }
        }
        Ok(rows)
    }
}

/// Artifact name for a film slug: its third `/`-separated segment, so
/// `/film/the-matrix/` is stored as `the-matrix`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidSubject`] if the slug has no such segment.
pub fn film_artifact_name(film_slug: &str) -> Result<&str, StoreError> {
    match film_slug.split('/').nth(2) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(StoreError::InvalidSubject {
            subject: film_slug.to_owned(),
            reason: "expected a film slug of the form /film/{name}/",
        }),
    }
}

fn validate_subject(subject: &str) -> Result<(), StoreError> {
    let reason = if subject.is_empty() {
        "empty subject"
    } else if subject == "." || subject == ".." {
        "relative path component"
    } else if subject.contains(['/', '\\']) {
        "contains a path separator"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidSubject {
        subject: subject.to_owned(),
        reason,
    })
}

fn write_rows<R: Serialize>(path: &Path, rows: &[R]) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StoreError {
    StoreError::Csv {
        path: path.display().to_string(),
        source,
    }
}
