#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Film, rating, and review record types.
//!
//! These are the records produced by the scraper and persisted by the
//! store. Every field extracted from markup is optional because extraction
//! is best-effort: a missing element is recorded as `None`, never as an
//! empty string or a zero rating.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A star rating in half-star steps.
///
/// Stored as a count of half stars so that equality is exact. Serializes as
/// a decimal number of stars (e.g. `3.5`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct Rating {
    halves: u32,
}

impl Rating {
    /// Zero stars.
    pub const ZERO: Self = Self { halves: 0 };

    /// Creates a rating from a number of half stars.
    #[must_use]
    pub const fn from_halves(halves: u32) -> Self {
        Self { halves }
    }

    /// Returns the number of half stars in this rating.
    #[must_use]
    pub const fn halves(self) -> u32 {
        self.halves
    }

    /// Returns the rating as a number of stars.
    #[must_use]
    pub fn stars(self) -> f64 {
        f64::from(self.halves) / 2.0
    }

    /// Adds one full star.
    #[must_use]
    pub const fn add_full(self) -> Self {
        Self {
            halves: self.halves.saturating_add(2),
        }
    }

    /// Adds half a star.
    #[must_use]
    pub const fn add_half(self) -> Self {
        Self {
            halves: self.halves.saturating_add(1),
        }
    }
}

impl From<Rating> for f64 {
    fn from(value: Rating) -> Self {
        value.stars()
    }
}

impl From<f64> for Rating {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(value: f64) -> Self {
        if value.is_nan() || value <= 0.0 {
            return Self::ZERO;
        }
        Self {
            halves: (value * 2.0).round() as u32,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stars())
    }
}

/// Identifies a film as far as the listing markup allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilmReference {
    /// Display title, from the poster image's `alt` text.
    pub title: Option<String>,
    /// Numeric site id (`data-film-id`), kept as text.
    pub external_id: Option<String>,
    /// Site slug (`data-film-slug`).
    pub slug: Option<String>,
}

/// One entry of a user's rated-film history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// The film that was watched.
    pub film: FilmReference,
    /// The user's rating, if they left one.
    pub rating: Option<Rating>,
}

/// One entry of a user's watchlist. Watchlists carry no ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistRecord {
    /// The film on the watchlist.
    pub film: FilmReference,
}

/// One row of a film's member-ratings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmReviewerRecord {
    /// Profile path of the reviewer (e.g. `/someone/`).
    pub user_url: String,
    /// The reviewer's rating of the film.
    pub user_rating: Option<Rating>,
    /// Username, the second `/`-separated segment of `user_url`.
    pub username: String,
}

/// The kinds of persisted tables.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    /// A user's rated-film history, keyed by username.
    UserReviews,
    /// A film's member ratings, keyed by film name.
    FilmReviews,
}

impl ArtifactKind {
    /// Directory (relative to the store root) holding this kind's tables.
    #[must_use]
    pub fn directory(self) -> &'static str {
        match self {
            Self::UserReviews => "user_reviews",
            Self::FilmReviews => "film_reviews",
        }
    }
}

/// Flat CSV shape of a [`ReviewRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRow {
    /// Film title.
    pub movie_title: Option<String>,
    /// Rating in stars.
    pub movie_rating: Option<Rating>,
    /// Site film id.
    pub movie_id: Option<String>,
    /// Site film slug.
    pub film_slug: Option<String>,
}

impl From<&ReviewRecord> for ReviewRow {
    fn from(record: &ReviewRecord) -> Self {
        Self {
            movie_title: record.film.title.clone(),
            movie_rating: record.rating,
            movie_id: record.film.external_id.clone(),
            film_slug: record.film.slug.clone(),
        }
    }
}

/// Flat CSV shape of a [`FilmReviewerRecord`].
///
/// Every column is optional on the way back in: tables on disk may contain
/// empty cells, and readers decide what to do with incomplete rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmReviewerRow {
    /// Profile path of the reviewer.
    pub user_url: Option<String>,
    /// Rating in stars.
    pub user_rating: Option<Rating>,
    /// Reviewer username.
    pub username: Option<String>,
}

impl FilmReviewerRow {
    /// Returns `true` if no column is empty.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.user_url.is_some() && self.user_rating.is_some() && self.username.is_some()
    }
}

impl From<&FilmReviewerRecord> for FilmReviewerRow {
    fn from(record: &FilmReviewerRecord) -> Self {
        Self {
            user_url: Some(record.user_url.clone()),
            user_rating: record.user_rating,
            username: Some(record.username.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_stars_from_halves() {
        assert!((Rating::from_halves(7).stars() - 3.5).abs() < f64::EPSILON);
        assert!(Rating::ZERO.stars().abs() < f64::EPSILON);
    }

    #[test]
    fn rating_from_decimal_rounds_to_half_steps() {
        assert_eq!(Rating::from(4.0), Rating::from_halves(8));
        assert_eq!(Rating::from(2.5), Rating::from_halves(5));
        assert_eq!(Rating::from(-1.0), Rating::ZERO);
        assert_eq!(Rating::from(f64::NAN), Rating::ZERO);
    }

    #[test]
    fn rating_displays_as_stars() {
        assert_eq!(Rating::from_halves(9).to_string(), "4.5");
        assert_eq!(Rating::from_halves(6).to_string(), "3");
    }

    #[test]
    fn artifact_kind_names() {
        assert_eq!(ArtifactKind::UserReviews.to_string(), "user_reviews");
        assert_eq!(ArtifactKind::FilmReviews.as_ref(), "film_reviews");
        assert_eq!(ArtifactKind::FilmReviews.directory(), "film_reviews");
    }

    #[test]
    fn reviewer_row_completeness() {
        let record = FilmReviewerRecord {
            user_url: "/someone/".to_owned(),
            user_rating: None,
            username: "someone".to_owned(),
        };
        let row = FilmReviewerRow::from(&record);
        assert!(!row.is_complete());

        let rated = FilmReviewerRow {
            user_rating: Some(Rating::from_halves(4)),
            ..row
        };
        assert!(rated.is_complete());
    }
}
