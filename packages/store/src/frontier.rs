//! Crawl frontier built from saved film member tables.
//!
//! The frontier is never stored. Every call re-reads all film tables, so
//! whatever has been saved since the last run is picked up. Which of those
//! users still need crawling is decided later by the save gate, based on
//! which user artifacts exist.

use std::collections::BTreeSet;

use filmgraph_film_models::{ArtifactKind, FilmReviewerRow};

use crate::{ArtifactStore, StoreError};

/// Returns the distinct reviewer profile URLs across every saved film
/// table, in discovery order.
///
/// Tables are read in file-name order, rows in file order. Rows with an
/// empty column are dropped first, then repeated URLs collapse onto their
/// first occurrence.
///
/// # Errors
///
/// Returns [`StoreError`] if the film table directory or one of its tables
/// cannot be read.
pub fn build_frontier(store: &ArtifactStore) -> Result<Vec<String>, StoreError> {
    let tables = store.list(ArtifactKind::FilmReviews)?;

    let mut seen = BTreeSet::new();
    let mut frontier = Vec::new();
    let mut total_rows = 0_usize;
    let mut incomplete = 0_usize;

    for path in &tables {
        let rows: Vec<FilmReviewerRow> = store.read(path)?;
        total_rows += rows.len();

        for row in rows {
            if !row.is_complete() {
                incomplete += 1;
                continue;
            }
            if let Some(user_url) = row.user_url
                && seen.insert(user_url.clone())
            {
                frontier.push(user_url);
            }
        }
    }

    log::info!(
        "Frontier: {} users from {total_rows} rows in {} film tables ({incomplete} incomplete rows dropped)",
        frontier.len(),
        tables.len(),
    );

    Ok(frontier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn temp_store(name: &str) -> (PathBuf, ArtifactStore) {
        let tmp = std::env::temp_dir().join(format!("filmgraph_frontier_{name}"));
        let _ = std::fs::remove_dir_all(&tmp);
        (tmp.clone(), ArtifactStore::new(tmp))
    }

    fn write_table(store: &ArtifactStore, name: &str, body: &str) {
        let dir = store.kind_dir(ArtifactKind::FilmReviews);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{name}_reviews.csv")), body).unwrap();
    }

    #[test]
    fn no_tables_means_empty_frontier() {
        let (_tmp, store) = temp_store("no_tables_means_empty_frontier");
        assert!(build_frontier(&store).unwrap().is_empty());
    }

    #[test]
    fn drops_incomplete_rows() {
        let (tmp, store) = temp_store("drops_incomplete_rows");
        write_table(
            &store,
            "dune",
            "user_url,user_rating,username\n\
             /alice/,4.0,alice\n\
             /bob/,,bob\n\
             ,3.0,nobody\n\
             /carol/,2.5,\n",
        );

        assert_eq!(build_frontier(&store).unwrap(), vec!["/alice/"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn collapses_duplicate_users_across_tables() {
        let (tmp, store) = temp_store("collapses_duplicate_users_across_tables");
        write_table(
            &store,
            "alien",
            "user_url,user_rating,username\n/alice/,4.0,alice\n/bob/,3.0,bob\n",
        );
        write_table(
            &store,
            "brazil",
            "user_url,user_rating,username\n/bob/,5.0,bob\n/carol/,1.0,carol\n/alice/,2.0,alice\n",
        );

        assert_eq!(
            build_frontier(&store).unwrap(),
            vec!["/alice/", "/bob/", "/carol/"]
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn incomplete_first_occurrence_does_not_hide_later_complete_row() {
        let (tmp, store) = temp_store("incomplete_first_occurrence");
        write_table(
            &store,
            "heat",
            "user_url,user_rating,username\n/dave/,,dave\n/dave/,3.5,dave\n",
        );

        assert_eq!(build_frontier(&store).unwrap(), vec!["/dave/"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rebuilding_unchanged_tables_gives_same_users() {
        let (tmp, store) = temp_store("rebuilding_unchanged_tables");
        write_table(
            &store,
            "a",
            "user_url,user_rating,username\n/x/,1.0,x\n/y/,2.0,y\n",
        );
        write_table(
            &store,
            "b",
            "user_url,user_rating,username\n/y/,2.0,y\n/z/,3.0,z\n",
        );

        let first: HashSet<String> = build_frontier(&store).unwrap().into_iter().collect();
        let second: HashSet<String> = build_frontier(&store).unwrap().into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
