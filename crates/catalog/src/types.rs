//! Catalog records and the in-memory `CatalogIndex`.
//!
//! The catalog owns users, genres, directors, films and reviews. The engagement core
//! never mutates them; it reads them through the `Catalog` trait that
//! `CatalogIndex` implements.

use engagement::{DirectorId, FilmId, FilmRecord, GenreId, Polarity, ReviewId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Entity Records
// =============================================================================

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub name: String,
}

/// A film genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// A film director
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    pub id: DirectorId,
    pub name: String,
}

/// Films are stored as the presentation record the core hands back
pub type Film = FilmRecord;

/// A review a user wrote about a film
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub film_id: FilmId,
    pub user_id: UserId,
    pub is_positive: bool,
    pub content: String,
}

// =============================================================================
// Engagement Snapshot
// =============================================================================

/// A persisted like edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub user_id: UserId,
    pub film_id: FilmId,
}

/// A persisted review vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub review_id: ReviewId,
    pub user_id: UserId,
    pub polarity: Polarity,
}

/// Likes and votes stored alongside the catalog, replayed into the
/// engagement components at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub likes: Vec<LikeRecord>,
    pub votes: Vec<VoteRecord>,
}

// =============================================================================
// CatalogIndex - The In-Memory Catalog
// =============================================================================

/// Holds every catalog entity plus the film lookups by director and the
/// review lookups by film.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    // Primary data stores
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) genres: HashMap<GenreId, Genre>,
    pub(crate) directors: HashMap<DirectorId, Director>,
    pub(crate) films: HashMap<FilmId, Film>,
    pub(crate) reviews: HashMap<ReviewId, Review>,

    // Secondary indices
    /// Films each director made (one film can have several directors)
    pub(crate) director_films: HashMap<DirectorId, Vec<FilmId>>,
    /// Reviews written about each film
    pub(crate) film_reviews: HashMap<FilmId, Vec<ReviewId>>,
}

impl CatalogIndex {
    /// Creates a new, empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn get_director(&self, id: DirectorId) -> Option<&Director> {
        self.directors.get(&id)
    }

    pub fn get_film(&self, id: FilmId) -> Option<&Film> {
        self.films.get(&id)
    }

    pub fn get_review(&self, id: ReviewId) -> Option<&Review> {
        self.reviews.get(&id)
    }

    /// Genre names of a film, in genre id order
    pub fn genre_names(&self, film: &Film) -> Vec<String> {
        film.genres
            .iter()
            .filter_map(|id| self.genres.get(id))
            .map(|genre| genre.name.clone())
            .collect()
    }

    /// Director names of a film, in director id order
    pub fn director_names(&self, film: &Film) -> Vec<String> {
        film.directors
            .iter()
            .filter_map(|id| self.directors.get(id))
            .map(|director| director.name.clone())
            .collect()
    }

    /// Look a genre up by name, ignoring case
    pub fn find_genre(&self, name: &str) -> Option<&Genre> {
        self.genres
            .values()
            .find(|genre| genre.name.eq_ignore_ascii_case(name))
    }

    pub fn all_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_genre(&mut self, genre: Genre) {
        self.genres.insert(genre.id, genre);
    }

    pub fn insert_director(&mut self, director: Director) {
        self.directors.insert(director.id, director);
    }

    /// Insert a film and index it by director
    pub fn insert_film(&mut self, film: Film) {
        for &director in &film.directors {
            self.director_films.entry(director).or_default().push(film.id);
        }
        self.films.insert(film.id, film);
    }

    /// Insert a review and index it by film
    pub fn insert_review(&mut self, review: Review) {
        self.film_reviews
            .entry(review.film_id)
            .or_default()
            .push(review.id);
        self.reviews.insert(review.id, review);
    }

    /// Get counts (users, genres, directors, films, reviews) for debugging/validation
    pub fn counts(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.users.len(),
            self.genres.len(),
            self.directors.len(),
            self.films.len(),
            self.reviews.len(),
        )
    }
}
