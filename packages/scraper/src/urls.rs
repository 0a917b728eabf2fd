//! URL shapes for the pages the collectors walk.
//!
//! Page 1 of a user listing lives at the bare listing path; later pages add
//! `page/{n}/`. Film member tables always carry the page segment.

/// Trims surrounding slashes from a film slug such as `/film/the-matrix/`.
fn trim_slug(slug: &str) -> &str {
    slug.trim_matches('/')
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// A user's rated-film history.
#[must_use]
pub fn user_films_url(base_url: &str, username: &str, page: u32) -> String {
    listing_url(base_url, username, "films", page)
}

/// A user's watchlist.
#[must_use]
pub fn watchlist_url(base_url: &str, username: &str, page: u32) -> String {
    listing_url(base_url, username, "watchlist", page)
}

fn listing_url(base_url: &str, username: &str, listing: &str, page: u32) -> String {
    let base = trim_base(base_url);
    if page <= 1 {
        format!("{base}/{username}/{listing}/")
    } else {
        format!("{base}/{username}/{listing}/page/{page}/")
    }
}

/// A film's landing page.
#[must_use]
pub fn film_url(base_url: &str, film_slug: &str) -> String {
    format!("{}/{}/", trim_base(base_url), trim_slug(film_slug))
}

/// One page of a film's member ratings, newest first, rated members only.
#[must_use]
pub fn film_reviews_url(base_url: &str, film_slug: &str, page: u32) -> String {
    format!(
        "{}/{}/members/rated/.5-5/by/date/page/{page}/",
        trim_base(base_url),
        trim_slug(film_slug)
    )
}
