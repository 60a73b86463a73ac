//! Filter to keep only films released in a given year.

use crate::traits::Filter;
use crate::types::{Candidate, RankingContext};
use engagement::{Catalog, Result};
use std::sync::Arc;

/// Keeps only candidates whose release year equals `year`
pub struct ReleaseYearFilter {
    catalog: Arc<dyn Catalog>,
    year: u16,
}

impl ReleaseYearFilter {
    pub fn new(catalog: Arc<dyn Catalog>, year: u16) -> Self {
        Self { catalog, year }
    }
}

impl Filter for ReleaseYearFilter {
    fn name(&self) -> &str {
        "ReleaseYearFilter"
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
                    .is_some_and(|attributes| attributes.release_year == self.year)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::create_test_catalog;

    #[test]
    fn test_keeps_exact_year_only() {
        let filter = ReleaseYearFilter::new(Arc::new(create_test_catalog()), 2001);
        let candidates = (1..=3)
            .map(|id| Candidate::new(id, 1))
            .collect();

        let filtered = filter.apply(candidates, &RankingContext::global()).unwrap();
        let ids: Vec<_> = filtered.iter().map(|c| c.film_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let filter = ReleaseYearFilter::new(Arc::new(create_test_catalog()), 1999);
        let candidates = vec![Candidate::new(1, 1)];

        let filtered = filter.apply(candidates, &RankingContext::global()).unwrap();
        assert!(filtered.is_empty());
    }
}
