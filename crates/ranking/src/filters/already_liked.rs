//! Filter to remove films the target user already likes.

use crate::traits::Filter;
use crate::types::{Candidate, RankingContext};
use engagement::Result;

/// Removes candidates contained in the context's liked set.
///
/// A global context has an empty liked set, so nothing is removed.
pub struct AlreadyLikedFilter;

impl Filter for AlreadyLikedFilter {
    fn name(&self) -> &str {
        "AlreadyLikedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RankingContext,
    ) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| !context.liked_films.contains(&candidate.film_id))
            .collect())
    }
}
