//! Popularity Ranker - films ordered by how many distinct users like them
//!
//! ## Algorithm
//! 1. Validate the request (positive limit, known genre, plausible year)
//! 2. Snapshot like counts under one read of the like graph
//! 3. Drop films nobody likes and films failing the genre/year filters
//! 4. Sort by like count DESC, film id ASC
//! 5. Truncate to the limit
//!
//! The same counts also order the films two users have in common, the
//! results of a title/director search, and (on request) a director's films.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::{GenreFilter, ReleaseYearFilter};
use crate::types::{Candidate, RankingContext, by_rank};
use engagement::{
    Catalog, DirectorId, EARLIEST_RELEASE_YEAR, EngagementError, EngagementIndex, FilmId, GenreId,
    Result, SearchScope, UserId,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of films returned when the caller gives no limit
pub const DEFAULT_POPULAR_LIMIT: usize = 10;

/// How a director's films are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilmOrder {
    /// Oldest release first
    #[default]
    Year,
    /// Most liked first
    Likes,
}

impl FromStr for FilmOrder {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "year" => Ok(FilmOrder::Year),
            "likes" => Ok(FilmOrder::Likes),
            other => Err(EngagementError::InvalidArgument(format!(
                "unknown sort order '{}', expected 'year' or 'likes'",
                other
            ))),
        }
    }
}

/// Ranks films by distinct-liker count
pub struct PopularityRanker {
    index: Arc<EngagementIndex>,
    catalog: Arc<dyn Catalog>,
    default_limit: usize,
}

impl PopularityRanker {
    pub fn new(index: Arc<EngagementIndex>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            index,
            catalog,
            default_limit: DEFAULT_POPULAR_LIMIT,
        }
    }

    /// Configure the limit used when none is given (default: 10)
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Top films by like count, optionally restricted by genre and release year.
    ///
    /// A limit of zero or below, an unknown genre, or a year before the
    /// first film ever shown is `InvalidArgument`. Nothing to report is an
    /// empty list.
    #[instrument(skip(self))]
    pub fn popular(
        &self,
        limit: Option<i64>,
        genre_id: Option<GenreId>,
        year: Option<u16>,
    ) -> Result<Vec<FilmId>> {
        let limit = self.resolve_limit(limit)?;
        let mut candidates = self.candidates(genre_id, year)?;
        candidates.truncate(limit);

        debug!("Ranked {} popular films", candidates.len());
        Ok(candidates.into_iter().map(|c| c.film_id).collect())
    }

    /// Every liked film passing the filters, in ranked order
    pub fn candidates(
        &self,
        genre_id: Option<GenreId>,
        year: Option<u16>,
    ) -> Result<Vec<Candidate>> {
        self.validate_filters(genre_id, year)?;

        let candidates: Vec<Candidate> = {
            let graph = self.index.graph();
            graph
                .like_counts()
                .filter(|(_, count)| *count > 0)
                .map(|(film_id, count)| Candidate::new(film_id, count as u64))
                .collect()
        };

        let pipeline = FilterPipeline::new()
            .add_optional_filter(genre_id.map(|g| GenreFilter::new(self.catalog.clone(), g)))
            .add_optional_filter(year.map(|y| ReleaseYearFilter::new(self.catalog.clone(), y)));

        let mut candidates = pipeline.apply(candidates, &RankingContext::global())?;
        candidates.sort_by(by_rank);
        Ok(candidates)
    }

    /// Films liked by both users, most liked first (ties by ascending id)
    #[instrument(skip(self))]
    pub fn common_films(&self, user_id: UserId, other_id: UserId) -> Result<Vec<FilmId>> {
        self.catalog.require_user(user_id)?;
        self.catalog.require_user(other_id)?;

        let graph = self.index.graph();
        let (Some(mine), Some(theirs)) = (graph.films_of(user_id), graph.films_of(other_id)) else {
            return Ok(Vec::new());
        };

        let mut common: Vec<Candidate> = mine
            .intersection(theirs)
            .map(|&film_id| Candidate::new(film_id, graph.like_count(film_id) as u64))
            .collect();
        common.sort_by(by_rank);

        Ok(common.into_iter().map(|c| c.film_id).collect())
    }

    /// Every film of a director, by release year (ties by id) or by like
    /// count (ties by id). `NotFound` for an unknown director.
    #[instrument(skip(self))]
    pub fn films_by_director(
        &self,
        director_id: DirectorId,
        order: FilmOrder,
    ) -> Result<Vec<FilmId>> {
        self.catalog.require_director(director_id)?;
        let films = self.catalog.films_by_director(director_id);

        let ranked: Vec<FilmId> = match order {
            FilmOrder::Likes => {
                let mut candidates = self.with_like_counts(&films);
                candidates.sort_by(by_rank);
                candidates.into_iter().map(|c| c.film_id).collect()
            }
            FilmOrder::Year => {
                let mut dated: Vec<(u16, FilmId)> = films
                    .iter()
                    .filter_map(|&film_id| {
                        let year = self.catalog.film_attributes(film_id)?.release_year;
                        Some((year, film_id))
                    })
                    .collect();
                dated.sort_unstable();
                dated.into_iter().map(|(_, film_id)| film_id).collect()
            }
        };

        debug!("Ordered {} films of director {}", ranked.len(), director_id);
        Ok(ranked)
    }

    /// Films whose title or director name contains `query`, most liked
    /// first (ties by id). A blank query finds nothing.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str, scope: SearchScope) -> Result<Vec<FilmId>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let matches = self.catalog.search_films(query, scope);
        let mut ranked = self.with_like_counts(&matches);
        ranked.sort_by(by_rank);

        debug!("Search for {:?} matched {} films", query, ranked.len());
        Ok(ranked.into_iter().map(|c| c.film_id).collect())
    }

    /// Pair films with their like counts under one read of the like graph
    fn with_like_counts(&self, films: &[FilmId]) -> Vec<Candidate> {
        let graph = self.index.graph();
        films
            .iter()
            .map(|&film_id| Candidate::new(film_id, graph.like_count(film_id) as u64))
            .collect()
    }

    fn resolve_limit(&self, limit: Option<i64>) -> Result<usize> {
        match limit {
            None => Ok(self.default_limit),
            Some(limit) if limit <= 0 => Err(EngagementError::InvalidArgument(format!(
                "limit must be positive, got {}",
                limit
            ))),
            Some(limit) => Ok(usize::try_from(limit).unwrap_or(usize::MAX)),
        }
    }

    fn validate_filters(&self, genre_id: Option<GenreId>, year: Option<u16>) -> Result<()> {
        if let Some(genre_id) = genre_id {
            if !self.catalog.genre_exists(genre_id) {
                return Err(EngagementError::InvalidArgument(format!(
                    "unknown genre filter: {}",
                    genre_id
                )));
            }
        }
        if let Some(year) = year {
            if year < EARLIEST_RELEASE_YEAR {
                return Err(EngagementError::InvalidArgument(format!(
                    "release year filter before {}: {}",
                    EARLIEST_RELEASE_YEAR, year
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::{
        CHAPLIN, COMEDY, DRAMA, FELLINI, NOBODY, create_test_catalog,
    };
    use catalog::{CatalogIndex, User};

    fn create_test_ranker() -> (Arc<EngagementIndex>, PopularityRanker) {
        let mut catalog: CatalogIndex = create_test_catalog();
        for id in 1..=4 {
            catalog.insert_user(User {
                id,
                login: format!("user{}", id),
                name: format!("User {}", id),
            });
        }

        let index = Arc::new(EngagementIndex::new());
        let ranker = PopularityRanker::new(index.clone(), Arc::new(catalog));
        (index, ranker)
    }

    #[test]
    fn test_no_likes_is_empty() {
        let (_, ranker) = create_test_ranker();
        assert!(ranker.popular(Some(10), None, None).unwrap().is_empty());
    }

    #[test]
    fn test_orders_by_count_then_id() {
        let (index, ranker) = create_test_ranker();
        index.add_like(1, 3);
        index.add_like(1, 2);
        index.add_like(2, 2);
        index.add_like(3, 1);

        // Film 2 has two likes, films 1 and 3 tie on one
        assert_eq!(ranker.popular(None, None, None).unwrap(), vec![2, 1, 3]);
        assert_eq!(ranker.popular(Some(2), None, None).unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_genre_and_year_filters() {
        let (index, ranker) = create_test_ranker();
        index.add_like(1, 1);
        index.add_like(2, 1);
        for user in 1..=3 {
            index.add_like(user, 2);
        }
        index.add_like(4, 3);

        assert_eq!(ranker.popular(Some(10), Some(COMEDY), None).unwrap(), vec![1, 3]);
        assert_eq!(ranker.popular(Some(10), Some(DRAMA), None).unwrap(), vec![2, 3]);
        assert_eq!(ranker.popular(Some(10), None, Some(2001)).unwrap(), vec![2, 3]);
        assert_eq!(
            ranker.popular(Some(10), Some(COMEDY), Some(2001)).unwrap(),
            vec![3]
        );
        assert!(ranker.popular(Some(10), None, Some(1999)).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_requests() {
        let (_, ranker) = create_test_ranker();

        for limit in [0, -5] {
            assert!(matches!(
                ranker.popular(Some(limit), None, None),
                Err(EngagementError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            ranker.popular(None, Some(99), None),
            Err(EngagementError::InvalidArgument(_))
        ));
        assert!(matches!(
            ranker.popular(None, None, Some(1800)),
            Err(EngagementError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_removed_like_drops_film() {
        let (index, ranker) = create_test_ranker();
        index.add_like(1, 1);
        index.remove_like(1, 1).unwrap();

        assert!(ranker.popular(None, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_common_films() {
        let (index, ranker) = create_test_ranker();
        for film in 1..=3 {
            index.add_like(1, film);
        }
        index.add_like(2, 1);
        index.add_like(2, 3);
        index.add_like(3, 3);

        assert_eq!(ranker.common_films(1, 2).unwrap(), vec![3, 1]);
        assert!(ranker.common_films(1, 4).unwrap().is_empty());
        assert!(ranker.common_films(1, 99).unwrap_err().is_not_found());
    }

    #[test]
    fn test_director_films_by_year() {
        let (index, ranker) = create_test_ranker();
        index.add_like(1, 3);

        // City Lights (2000) before The Circus (2001), likes ignored
        assert_eq!(
            ranker.films_by_director(CHAPLIN, FilmOrder::Year).unwrap(),
            vec![1, 3]
        );
        // Same year: ascending id
        assert_eq!(
            ranker.films_by_director(FELLINI, FilmOrder::Year).unwrap(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_director_films_by_likes() {
        let (index, ranker) = create_test_ranker();
        index.add_like(1, 3);
        index.add_like(2, 3);
        index.add_like(1, 1);

        assert_eq!(
            ranker.films_by_director(CHAPLIN, FilmOrder::Likes).unwrap(),
            vec![3, 1]
        );
        // Neither film liked yet: ascending id
        index.remove_like(1, 3).unwrap();
        index.remove_like(2, 3).unwrap();
        assert_eq!(
            ranker.films_by_director(FELLINI, FilmOrder::Likes).unwrap(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_director_without_films_and_unknown_director() {
        let (_, ranker) = create_test_ranker();

        assert!(
            ranker
                .films_by_director(NOBODY, FilmOrder::Likes)
                .unwrap()
                .is_empty()
        );
        assert!(
            ranker
                .films_by_director(99, FilmOrder::Year)
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_film_order_parsing() {
        assert_eq!("year".parse::<FilmOrder>().unwrap(), FilmOrder::Year);
        assert_eq!("likes".parse::<FilmOrder>().unwrap(), FilmOrder::Likes);
        assert_eq!(FilmOrder::default(), FilmOrder::Year);
        assert!(matches!(
            "rating".parse::<FilmOrder>(),
            Err(EngagementError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_search_orders_matches_by_likes() {
        let (index, ranker) = create_test_ranker();
        index.add_like(1, 3);
        index.add_like(2, 3);
        index.add_like(1, 2);

        let titles = SearchScope::default();
        // "City Lights" and "The Circus"
        assert_eq!(ranker.search("ci", titles).unwrap(), vec![3, 1]);
        assert_eq!(ranker.search("STRADA", titles).unwrap(), vec![2]);
        assert!(ranker.search("fellini", titles).unwrap().is_empty());

        let directors: SearchScope = "director".parse().unwrap();
        assert_eq!(ranker.search("fellini", directors).unwrap(), vec![3, 2]);

        let both: SearchScope = "title,director".parse().unwrap();
        assert_eq!(ranker.search("li", both).unwrap(), vec![3, 2, 1]);

        assert!(ranker.search("   ", both).unwrap().is_empty());
    }
}
