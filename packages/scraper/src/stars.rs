//! Star-glyph rating parser.

use filmgraph_film_models::Rating;

/// Glyph worth one full star.
pub const FULL_STAR: char = '★';

/// Glyph worth half a star.
pub const HALF_STAR: char = '½';

/// Counts star glyphs in rendered rating text.
///
/// Every [`FULL_STAR`] adds one star and every [`HALF_STAR`] adds half a
/// star. Any other character is ignored, so text without glyphs is a zero
/// rating rather than an error.
#[must_use]
pub fn parse_stars(glyphs: &str) -> Rating {
    glyphs.chars().fold(Rating::ZERO, |rating, ch| match ch {
        FULL_STAR => rating.add_full(),
        HALF_STAR => rating.add_half(),
        _ => rating,
    })
}
