//! Ordered chain of candidate filters.
//!
//! Popularity builds one from the request's genre and year filters;
//! recommendations use one to strip films the user already likes.

use crate::traits::Filter;
use crate::types::{Candidate, RankingContext};
use engagement::Result;
use tracing::debug;

/// Filters applied one after another, in insertion order.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_optional_filter(genre.map(|g| GenreFilter::new(catalog.clone(), g)))
///     .add_optional_filter(year.map(|y| ReleaseYearFilter::new(catalog.clone(), y)));
///
/// let kept = pipeline.apply(candidates, &RankingContext::global())?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Append a filter (builder pattern)
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append a filter only when the request asked for one
    pub fn add_optional_filter(self, filter: Option<impl Filter + 'static>) -> Self {
        match filter {
            Some(filter) => self.add_filter(filter),
            None => self,
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter over the candidates.
    ///
    /// The first failing filter aborts the run and its error is returned.
    pub fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RankingContext,
    ) -> Result<Vec<Candidate>> {
        self.filters
            .iter()
            .try_fold(candidates, |current, filter| {
                let before = current.len();
                let kept = filter.apply(current, context)?;
                debug!(filter = filter.name(), before, after = kept.len(), "filter applied");
                Ok(kept)
            })
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
