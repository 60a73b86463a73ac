//! Filter to keep only films carrying a given genre.

use crate::traits::Filter;
use crate::types::{Candidate, RankingContext};
use engagement::{Catalog, GenreId, Result};
use std::sync::Arc;

/// Keeps only candidates whose genre set contains `genre_id`.
///
/// Films the catalog does not know are dropped.
pub struct GenreFilter {
    catalog: Arc<dyn Catalog>,
    genre_id: GenreId,
}

impl GenreFilter {
    /// Create a new GenreFilter.
    ///
    /// # Arguments
    /// * `catalog` - Shared catalog for film attribute lookups
    /// * `genre_id` - The genre a film must carry to be kept
    pub fn new(catalog: Arc<dyn Catalog>, genre_id: GenreId) -> Self {
        Self { catalog, genre_id }
    }
}

impl Filter for GenreFilter {
    fn name(&self) -> &str {
        "GenreFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &RankingContext,
    ) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                self.catalog
                    .film_attributes(candidate.film_id)
                    .is_some_and(|attributes| attributes.genres.contains(&self.genre_id))
            })
            .collect())
    }
}
