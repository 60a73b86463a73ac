//! # Engagement Service
//!
//! The facade over the engagement core:
//! 1. Gate every referenced id against the catalog
//! 2. Mutate the like graph or the review tallies
//! 3. Record the accepted action in the activity ledger
//! 4. Run popularity and recommendation derivations on the blocking pool
//! 5. Materialize ranked ids into film records
//!
//! Purges are called by whoever deletes a user, film or review, after the
//! entity is gone, so they do not gate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use catalog::EngagementSnapshot;
use engagement::{
    ActivityLedger, Catalog, DirectorId, EngagementError, EngagementIndex, EventType, FeedEvent,
    FilmId, FilmRecord, GenreId, OpinionScorer, Operation, Polarity, ReviewId, SearchScope, UserId,
    VoteState,
};
use ranking::{FilmOrder, PopularityRanker, RecommendationEngine};

use crate::config::ServiceConfig;
use crate::error::Result;

/// What a purge removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub likes: usize,
    pub votes: usize,
    pub events: usize,
}

/// Entry point for every engagement operation
#[derive(Clone)]
pub struct EngagementService {
    catalog: Arc<dyn Catalog>,
    index: Arc<EngagementIndex>,
    opinions: Arc<OpinionScorer>,
    ledger: Arc<ActivityLedger>,
    popularity: Arc<PopularityRanker>,
    recommender: Arc<RecommendationEngine>,
    config: ServiceConfig,
}

impl EngagementService {
    /// Create a service with empty engagement state over `catalog`
    pub fn new(catalog: Arc<dyn Catalog>, config: ServiceConfig) -> Self {
        Self::with_ledger(catalog, config, ActivityLedger::new())
    }

    /// Create a service recording into the given ledger
    pub fn with_ledger(
        catalog: Arc<dyn Catalog>,
        config: ServiceConfig,
        ledger: ActivityLedger,
    ) -> Self {
        let index = Arc::new(EngagementIndex::new());
        let popularity = PopularityRanker::new(index.clone(), catalog.clone())
            .with_default_limit(config.default_popular_limit);
        let recommender =
            RecommendationEngine::new(index.clone()).with_min_overlap(config.min_neighbor_overlap);

        Self {
            catalog,
            index,
            opinions: Arc::new(OpinionScorer::new()),
            ledger: Arc::new(ledger),
            popularity: Arc::new(popularity),
            recommender: Arc::new(recommender),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Number of like edges held
    pub fn like_count(&self) -> usize {
        self.index.edge_count()
    }

    /// Distinct users who like a film
    pub fn film_like_count(&self, film_id: FilmId) -> usize {
        self.index.like_count(film_id)
    }

    /// Number of feed events held
    pub fn event_count(&self) -> usize {
        self.ledger.len()
    }

    /// Replay persisted likes and votes without recording feed events.
    ///
    /// Every reference is checked before anything is applied, so a bad
    /// snapshot leaves the service untouched.
    pub fn seed(&self, snapshot: &EngagementSnapshot) -> Result<()> {
        for like in &snapshot.likes {
            self.catalog.require_user(like.user_id)?;
            self.catalog.require_film(like.film_id)?;
        }
        for vote in &snapshot.votes {
            self.catalog.require_review(vote.review_id)?;
            self.catalog.require_user(vote.user_id)?;
        }

        for like in &snapshot.likes {
            self.index.add_like(like.user_id, like.film_id);
        }
        for vote in &snapshot.votes {
            self.opinions.vote(vote.review_id, vote.user_id, vote.polarity);
        }

        info!(
            "Seeded {} likes and {} votes",
            snapshot.likes.len(),
            snapshot.votes.len()
        );
        Ok(())
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Like a film. Liking twice keeps one edge but records both actions.
    ///
    /// The feed event is appended while the like graph is still locked, so
    /// for any (user, film) the last LIKE event in the feed matches the
    /// edge's final state.
    pub fn add_like(&self, user_id: UserId, film_id: FilmId) -> Result<FeedEvent> {
        self.catalog.require_user(user_id)?;
        self.catalog.require_film(film_id)?;

        let (created, event) = self.index.add_like_with(user_id, film_id, |created| {
            let event = self
                .ledger
                .record(user_id, EventType::Like, Operation::Add, film_id);
            (created, event)
        });

        info!(user_id, film_id, created, "like added");
        Ok(event)
    }

    /// Remove a like. `NotFound` if the user does not like the film.
    pub fn remove_like(&self, user_id: UserId, film_id: FilmId) -> Result<FeedEvent> {
        self.catalog.require_user(user_id)?;
        self.catalog.require_film(film_id)?;

        let removed = self.index.remove_like_with(user_id, film_id, || {
            self.ledger
                .record(user_id, EventType::Like, Operation::Remove, film_id)
        });
        let event = match removed {
            Ok(event) => event,
            Err(e) => {
                warn!(user_id, film_id, "rejected like removal: {}", e);
                return Err(e.into());
            }
        };

        info!(user_id, film_id, "like removed");
        Ok(event)
    }

    /// Films a user likes, ascending by id
    pub fn films_liked_by(&self, user_id: UserId) -> Result<Vec<FilmId>> {
        self.catalog.require_user(user_id)?;
        let mut films: Vec<FilmId> = self.index.films_liked_by(user_id).into_iter().collect();
        films.sort_unstable();
        Ok(films)
    }

    /// Films liked by both users, most liked first
    pub fn common_films(&self, user_id: UserId, other_id: UserId) -> Result<Vec<FilmId>> {
        Ok(self.popularity.common_films(user_id, other_id)?)
    }

    /// A director's films ordered by `sort_by` (`year`, the default, or
    /// `likes`). Any other order is `InvalidArgument`.
    pub fn director_films(
        &self,
        director_id: DirectorId,
        sort_by: Option<&str>,
    ) -> Result<Vec<FilmRecord>> {
        let order = sort_by
            .map(str::parse::<FilmOrder>)
            .transpose()?
            .unwrap_or_default();
        let ids = self.popularity.films_by_director(director_id, order)?;
        Ok(self.materialize(&ids))
    }

    /// Films matching `query` in the fields named by `by` (comma separated
    /// `title` and `director`, titles only when absent), most liked first
    pub fn search_films(&self, query: &str, by: Option<&str>) -> Result<Vec<FilmRecord>> {
        let scope: SearchScope = by.unwrap_or_default().parse()?;
        let ids = self.popularity.search(query, scope)?;
        info!("Search for {:?} by {:?} found {} films", query, by, ids.len());
        Ok(self.materialize(&ids))
    }

    // =========================================================================
    // Popularity and Recommendations
    // =========================================================================

    /// Most liked films, optionally by genre and release year
    #[instrument(skip(self))]
    pub async fn popular(
        &self,
        limit: Option<i64>,
        genre_id: Option<GenreId>,
        year: Option<u16>,
    ) -> Result<Vec<FilmId>> {
        let start_time = Instant::now();
        let ranker = self.popularity.clone();

        let films =
            tokio::task::spawn_blocking(move || ranker.popular(limit, genre_id, year)).await??;

        info!(
            "Ranked {} popular films in {:.2?}",
            films.len(),
            start_time.elapsed()
        );
        Ok(films)
    }

    /// Recommended films for a user, capped by `recommendation_limit` if set
    #[instrument(skip(self))]
    pub async fn recommend(&self, user_id: UserId) -> Result<Vec<FilmId>> {
        self.catalog.require_user(user_id)?;

        let start_time = Instant::now();
        let engine = self.recommender.clone();

        let mut films = tokio::task::spawn_blocking(move || engine.recommend(user_id)).await??;
        if let Some(limit) = self.config.recommendation_limit {
            films.truncate(limit);
        }

        info!(
            "Recommended {} films for user {} in {:.2?}",
            films.len(),
            user_id,
            start_time.elapsed()
        );
        Ok(films)
    }

    /// `popular`, materialized into film records in ranked order
    pub async fn popular_films(
        &self,
        limit: Option<i64>,
        genre_id: Option<GenreId>,
        year: Option<u16>,
    ) -> Result<Vec<FilmRecord>> {
        let ids = self.popular(limit, genre_id, year).await?;
        Ok(self.materialize(&ids))
    }

    /// `recommend`, materialized into film records in ranked order
    pub async fn recommended_films(&self, user_id: UserId) -> Result<Vec<FilmRecord>> {
        let ids = self.recommend(user_id).await?;
        Ok(self.materialize(&ids))
    }

    /// Look up records and put them back in the order of `ids`.
    /// Ids the catalog no longer knows are dropped.
    fn materialize(&self, ids: &[FilmId]) -> Vec<FilmRecord> {
        let mut records = self.catalog.film_records(ids);
        let position: HashMap<FilmId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        records.sort_by_key(|record| position.get(&record.id).copied().unwrap_or(usize::MAX));
        records
    }

    // =========================================================================
    // Review Votes
    // =========================================================================

    /// Vote on a review, replacing any earlier vote of the user. Returns the new score.
    pub fn vote(&self, review_id: ReviewId, user_id: UserId, polarity: Polarity) -> Result<i64> {
        self.catalog.require_review(review_id)?;
        self.catalog.require_user(user_id)?;

        let score = self.opinions.vote(review_id, user_id, polarity);
        info!(review_id, user_id, %polarity, score, "review vote cast");
        Ok(score)
    }

    /// Retract a vote of the given polarity. Returns the new score.
    pub fn retract_vote(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        polarity: Polarity,
    ) -> Result<i64> {
        self.catalog.require_review(review_id)?;
        self.catalog.require_user(user_id)?;

        match self.opinions.retract_vote(review_id, user_id, polarity) {
            Ok(score) => {
                info!(review_id, user_id, %polarity, score, "review vote retracted");
                Ok(score)
            }
            Err(e) => {
                warn!(review_id, user_id, %polarity, "rejected vote retraction: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn score_of(&self, review_id: ReviewId) -> Result<i64> {
        self.catalog.require_review(review_id)?;
        Ok(self.opinions.score_of(review_id))
    }

    pub fn vote_of(&self, review_id: ReviewId, user_id: UserId) -> Result<VoteState> {
        self.catalog.require_review(review_id)?;
        self.catalog.require_user(user_id)?;
        Ok(self.opinions.vote_of(review_id, user_id))
    }

    /// Most useful reviews of a film (or of every film), best first
    pub fn most_useful_reviews(
        &self,
        film_id: Option<FilmId>,
        count: Option<i64>,
    ) -> Result<Vec<(ReviewId, i64)>> {
        let count = match count {
            None => self.config.default_review_count,
            Some(count) if count <= 0 => {
                return Err(EngagementError::InvalidArgument(format!(
                    "count must be positive, got {}",
                    count
                ))
                .into());
            }
            Some(count) => usize::try_from(count).unwrap_or(usize::MAX),
        };
        if let Some(film_id) = film_id {
            self.catalog.require_film(film_id)?;
        }

        let reviews = self.catalog.reviews(film_id);
        Ok(self.opinions.rank(&reviews, count))
    }

    // =========================================================================
    // Activity Feed
    // =========================================================================

    /// Record a review written, edited or deleted by the user
    pub fn record_review(
        &self,
        user_id: UserId,
        review_id: ReviewId,
        operation: Operation,
    ) -> Result<FeedEvent> {
        self.catalog.require_user(user_id)?;
        if operation != Operation::Remove {
            self.catalog.require_review(review_id)?;
        }
        Ok(self
            .ledger
            .record(user_id, EventType::Review, operation, review_id))
    }

    /// Record a friendship added or removed by the user
    pub fn record_friendship(
        &self,
        user_id: UserId,
        friend_id: UserId,
        operation: Operation,
    ) -> Result<FeedEvent> {
        self.catalog.require_user(user_id)?;
        self.catalog.require_user(friend_id)?;
        if user_id == friend_id {
            return Err(EngagementError::InvalidArgument(format!(
                "user {} cannot befriend themselves",
                user_id
            ))
            .into());
        }
        Ok(self
            .ledger
            .record(user_id, EventType::Friend, operation, friend_id))
    }

    /// A user's feed, oldest first
    pub fn feed_for(&self, user_id: UserId) -> Result<Vec<FeedEvent>> {
        self.catalog.require_user(user_id)?;
        Ok(self.ledger.feed_for(user_id))
    }

    // =========================================================================
    // Purges
    // =========================================================================

    /// Drop a deleted user's likes, votes and feed events, including
    /// friendship events of others that name the user
    pub fn purge_user(&self, user_id: UserId) -> PurgeSummary {
        let summary = PurgeSummary {
            likes: self.index.remove_user(user_id),
            votes: self.opinions.remove_user(user_id),
            events: self.ledger.remove_user(user_id),
        };
        info!(user_id, ?summary, "user purged");
        summary
    }

    /// Drop a deleted film's likes and like events, and everything attached
    /// to its reviews
    pub fn purge_film(&self, film_id: FilmId) -> PurgeSummary {
        let mut summary = PurgeSummary {
            likes: self.index.remove_film(film_id),
            votes: 0,
            events: self.ledger.remove_entity(EventType::Like, film_id),
        };
        for review_id in self.catalog.reviews(Some(film_id)) {
            let review = self.purge_review(review_id);
            summary.votes += review.votes;
            summary.events += review.events;
        }
        info!(film_id, ?summary, "film purged");
        summary
    }

    /// Drop a deleted review's votes and review events
    pub fn purge_review(&self, review_id: ReviewId) -> PurgeSummary {
        PurgeSummary {
            likes: 0,
            votes: self.opinions.remove_review(review_id),
            events: self.ledger.remove_entity(EventType::Review, review_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{CatalogIndex, Director, Film, Genre, LikeRecord, Review, User, VoteRecord};
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeSet;

    const COMEDY: GenreId = 1;
    const DRAMA: GenreId = 2;

    fn create_test_catalog() -> CatalogIndex {
        let mut index = CatalogIndex::new();
        index.insert_genre(Genre {
            id: COMEDY,
            name: "Comedy".to_string(),
        });
        index.insert_genre(Genre {
            id: DRAMA,
            name: "Drama".to_string(),
        });
        for id in 1..=4 {
            index.insert_user(User {
                id,
                login: format!("user{}", id),
                name: format!("User {}", id),
            });
        }
        for (id, name) in [(1, "Jacques Tati"), (2, "Ingmar Bergman")] {
            index.insert_director(Director {
                id,
                name: name.to_string(),
            });
        }
        for (id, year, genre, director) in [
            (1, 2000, COMEDY, 1),
            (2, 2001, DRAMA, 2),
            (3, 2001, DRAMA, 2),
            (4, 2002, COMEDY, 1),
        ] {
            index.insert_film(Film {
                id,
                title: format!("Film {}", id),
                release_year: year,
                genres: BTreeSet::from([genre]),
                directors: BTreeSet::from([director]),
            });
        }
        for (id, film_id, user_id) in [(10, 1, 1), (11, 1, 2), (12, 2, 3)] {
            index.insert_review(Review {
                id,
                film_id,
                user_id,
                is_positive: true,
                content: format!("Review {}", id),
            });
        }
        index
    }

    fn create_test_service() -> EngagementService {
        EngagementService::new(Arc::new(create_test_catalog()), ServiceConfig::default())
    }

    #[tokio::test]
    async fn test_recommendation_scenario() {
        let service = create_test_service();
        for (user, film) in [(1, 1), (1, 2), (2, 1), (2, 3), (2, 4), (3, 3)] {
            service.add_like(user, film).unwrap();
        }

        assert_eq!(service.recommend(1).await.unwrap(), vec![3, 4]);

        let films = service.recommended_films(1).await.unwrap();
        let titles: Vec<&str> = films.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Film 3", "Film 4"]);
    }

    #[tokio::test]
    async fn test_recommendation_limit() {
        let config = ServiceConfig {
            recommendation_limit: Some(1),
            ..ServiceConfig::default()
        };
        let service = EngagementService::new(Arc::new(create_test_catalog()), config);
        for (user, film) in [(1, 1), (2, 1), (2, 3), (2, 4)] {
            service.add_like(user, film).unwrap();
        }

        assert_eq!(service.recommend(1).await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_recommend_unknown_user() {
        let service = create_test_service();
        assert!(service.recommend(99).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_popular() {
        let service = create_test_service();
        assert!(service.popular(Some(10), None, None).await.unwrap().is_empty());

        for (user, film) in [(1, 1), (2, 1), (1, 2), (2, 2), (3, 2)] {
            service.add_like(user, film).unwrap();
        }

        assert_eq!(service.popular(None, None, None).await.unwrap(), vec![2, 1]);
        assert_eq!(
            service.popular(Some(10), Some(COMEDY), None).await.unwrap(),
            vec![1]
        );

        let films = service.popular_films(Some(1), None, Some(2001)).await.unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].id, 2);

        let err = service.popular(Some(0), None, None).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_like_gating_and_feed() {
        let service = create_test_service();

        assert!(service.add_like(99, 1).unwrap_err().is_not_found());
        assert!(service.add_like(1, 99).unwrap_err().is_not_found());
        assert!(service.remove_like(1, 1).unwrap_err().is_not_found());

        service.add_like(1, 1).unwrap();
        service.add_like(1, 1).unwrap();
        service.remove_like(1, 1).unwrap();

        assert!(service.films_liked_by(1).unwrap().is_empty());
        assert_eq!(service.like_count(), 0);

        let feed = service.feed_for(1).unwrap();
        let operations: Vec<Operation> = feed.iter().map(|e| e.operation).collect();
        assert_eq!(
            operations,
            vec![Operation::Add, Operation::Add, Operation::Remove]
        );
        assert!(feed.windows(2).all(|w| w[0].event_id < w[1].event_id));
        assert!(service.feed_for(99).unwrap_err().is_not_found());
    }

    #[test]
    fn test_racing_like_and_unlike_keep_feed_in_step() {
        use std::sync::Barrier;
        use std::thread;

        const ROUNDS: usize = 2_000;

        let service = create_test_service();
        service.add_like(1, 1).unwrap();

        let start = Arc::new(Barrier::new(3));
        let done = Arc::new(Barrier::new(3));
        let spawn_racer = |like: bool| {
            let service = service.clone();
            let (start, done) = (start.clone(), done.clone());
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    start.wait();
                    if like {
                        service.add_like(1, 1).unwrap();
                    } else {
                        // NotFound when the other thread has not re-added yet
                        let _ = service.remove_like(1, 1);
                    }
                    done.wait();
                }
            })
        };
        let adder = spawn_racer(true);
        let remover = spawn_racer(false);

        for round in 0..ROUNDS {
            start.wait();
            done.wait();

            let feed = service.feed_for(1).unwrap();
            let last = feed.last().unwrap();
            assert_eq!(last.event_type, EventType::Like);
            let liked = service.films_liked_by(1).unwrap().contains(&1);
            assert_eq!(
                last.operation == Operation::Add,
                liked,
                "round {}: feed ends with {:?} but the like edge is {}",
                round,
                last.operation,
                if liked { "present" } else { "absent" }
            );
        }

        adder.join().unwrap();
        remover.join().unwrap();
    }

    #[test]
    fn test_votes() {
        let service = create_test_service();

        assert_eq!(service.vote(10, 1, Polarity::Like).unwrap(), 1);
        assert_eq!(service.vote(10, 2, Polarity::Like).unwrap(), 2);
        assert_eq!(service.vote(10, 3, Polarity::Dislike).unwrap(), 1);
        // Flipping a vote moves the score by two
        assert_eq!(service.vote(10, 1, Polarity::Dislike).unwrap(), -1);

        assert_eq!(service.vote_of(10, 1).unwrap(), VoteState::Disliked);
        assert_eq!(service.vote_of(10, 4).unwrap(), VoteState::NoVote);

        assert!(
            service
                .retract_vote(10, 2, Polarity::Dislike)
                .unwrap_err()
                .is_not_found()
        );
        assert_eq!(service.retract_vote(10, 2, Polarity::Like).unwrap(), -2);
        assert_eq!(service.score_of(10).unwrap(), -2);
        assert_eq!(service.score_of(11).unwrap(), 0);

        assert!(service.vote(99, 1, Polarity::Like).unwrap_err().is_not_found());
        assert!(service.vote(10, 99, Polarity::Like).unwrap_err().is_not_found());
    }

    #[test]
    fn test_most_useful_reviews() {
        let service = create_test_service();
        service.vote(11, 1, Polarity::Like).unwrap();
        service.vote(11, 3, Polarity::Like).unwrap();
        service.vote(12, 1, Polarity::Like).unwrap();
        service.vote(10, 2, Polarity::Dislike).unwrap();

        assert_eq!(
            service.most_useful_reviews(None, None).unwrap(),
            vec![(11, 2), (12, 1), (10, -1)]
        );
        assert_eq!(
            service.most_useful_reviews(Some(1), Some(1)).unwrap(),
            vec![(11, 2)]
        );
        assert!(service.most_useful_reviews(Some(4), None).unwrap().is_empty());
        assert!(
            service
                .most_useful_reviews(None, Some(0))
                .unwrap_err()
                .is_invalid_argument()
        );
        assert!(
            service
                .most_useful_reviews(Some(99), None)
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_feed_ordering_with_fixed_clock() {
        fn fixed_clock() -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
        }
        let service = EngagementService::with_ledger(
            Arc::new(create_test_catalog()),
            ServiceConfig::default(),
            ActivityLedger::with_clock(fixed_clock),
        );

        service.record_review(1, 10, Operation::Add).unwrap();
        service.record_friendship(1, 2, Operation::Add).unwrap();
        service.add_like(1, 1).unwrap();
        service.record_review(1, 10, Operation::Update).unwrap();

        let feed = service.feed_for(1).unwrap();
        let types: Vec<EventType> = feed.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                EventType::Review,
                EventType::Friend,
                EventType::Like,
                EventType::Review
            ]
        );
        assert!(feed.iter().all(|e| e.timestamp == fixed_clock()));

        assert!(
            service
                .record_friendship(1, 1, Operation::Add)
                .unwrap_err()
                .is_invalid_argument()
        );
        assert!(
            service
                .record_review(1, 99, Operation::Add)
                .unwrap_err()
                .is_not_found()
        );
        // A deleted review can still be reported as removed
        assert!(service.record_review(1, 99, Operation::Remove).is_ok());
    }

    #[test]
    fn test_purges() {
        let service = create_test_service();
        service.add_like(1, 1).unwrap();
        service.add_like(2, 1).unwrap();
        service.add_like(2, 2).unwrap();
        service.vote(10, 2, Polarity::Like).unwrap();
        service.vote(11, 2, Polarity::Like).unwrap();
        service.vote(11, 1, Polarity::Like).unwrap();
        service.record_friendship(1, 2, Operation::Add).unwrap();
        service.record_review(1, 10, Operation::Add).unwrap();

        let summary = service.purge_user(2);
        assert_eq!(summary.likes, 2);
        assert_eq!(summary.votes, 2);
        // Two like events of user 2 and user 1's friendship event naming user 2
        assert_eq!(summary.events, 3);
        assert_eq!(service.score_of(11).unwrap(), 1);

        let summary = service.purge_film(1);
        assert_eq!(summary.likes, 1);
        assert_eq!(summary.votes, 1);
        // User 1's like event and review event for review 10
        assert_eq!(summary.events, 2);
        assert_eq!(service.like_count(), 0);
        assert_eq!(service.event_count(), 0);
    }

    #[test]
    fn test_seed() {
        let service = create_test_service();
        let snapshot = EngagementSnapshot {
            likes: vec![
                LikeRecord {
                    user_id: 1,
                    film_id: 1,
                },
                LikeRecord {
                    user_id: 2,
                    film_id: 1,
                },
            ],
            votes: vec![VoteRecord {
                review_id: 10,
                user_id: 3,
                polarity: Polarity::Dislike,
            }],
        };

        service.seed(&snapshot).unwrap();
        assert_eq!(service.like_count(), 2);
        assert_eq!(service.score_of(10).unwrap(), -1);
        assert_eq!(service.event_count(), 0);
    }

    #[test]
    fn test_seed_with_bad_reference_changes_nothing() {
        let service = create_test_service();
        let snapshot = EngagementSnapshot {
            likes: vec![
                LikeRecord {
                    user_id: 1,
                    film_id: 1,
                },
                LikeRecord {
                    user_id: 1,
                    film_id: 99,
                },
            ],
            votes: Vec::new(),
        };

        assert!(service.seed(&snapshot).unwrap_err().is_not_found());
        assert_eq!(service.like_count(), 0);
    }

    #[test]
    fn test_common_films() {
        let service = create_test_service();
        for (user, film) in [(1, 1), (1, 2), (2, 1), (2, 2), (3, 2)] {
            service.add_like(user, film).unwrap();
        }

        assert_eq!(service.common_films(1, 2).unwrap(), vec![2, 1]);
        assert!(service.common_films(1, 99).unwrap_err().is_not_found());
    }

    #[test]
    fn test_director_films() {
        let service = create_test_service();
        for (user, film) in [(1, 4), (2, 4), (3, 1)] {
            service.add_like(user, film).unwrap();
        }

        let ids = |films: Vec<FilmRecord>| films.iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids(service.director_films(1, None).unwrap()), vec![1, 4]);
        assert_eq!(ids(service.director_films(1, Some("year")).unwrap()), vec![1, 4]);
        assert_eq!(ids(service.director_films(1, Some("likes")).unwrap()), vec![4, 1]);

        assert!(
            service
                .director_films(1, Some("title"))
                .unwrap_err()
                .is_invalid_argument()
        );
        assert!(service.director_films(9, None).unwrap_err().is_not_found());
    }

    #[test]
    fn test_search_films() {
        let service = create_test_service();
        for (user, film) in [(1, 3), (2, 3), (1, 2)] {
            service.add_like(user, film).unwrap();
        }

        let ids = |films: Vec<FilmRecord>| films.iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids(service.search_films("film", None).unwrap()), vec![3, 2, 1, 4]);
        assert_eq!(ids(service.search_films("FILM 4", None).unwrap()), vec![4]);
        assert_eq!(
            ids(service.search_films("bergman", Some("director")).unwrap()),
            vec![3, 2]
        );
        assert!(
            service
                .search_films("bergman", Some("title"))
                .unwrap()
                .is_empty()
        );
        assert!(service.search_films("", Some("title,director")).unwrap().is_empty());

        assert!(
            service
                .search_films("film", Some("genre"))
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_votes_keep_score_consistent() {
        let service = create_test_service();

        let handles: Vec<_> = (1..=4u64)
            .map(|user| {
                let service = service.clone();
                tokio::spawn(async move {
                    for i in 0..200 {
                        let polarity = if (i + user) % 2 == 0 {
                            Polarity::Like
                        } else {
                            Polarity::Dislike
                        };
                        service.vote(10, user, polarity).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Last vote of each user: i = 199, odd users like, even users dislike
        let expected: i64 = (1..=4u64)
            .map(|user| match service.vote_of(10, user).unwrap() {
                VoteState::Liked => 1,
                VoteState::Disliked => -1,
                VoteState::NoVote => 0,
            })
            .sum();
        assert_eq!(service.score_of(10).unwrap(), expected);
        assert_eq!(expected, 0);
    }
}
