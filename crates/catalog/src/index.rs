//! Loading a dataset directory into a `CatalogIndex`, and the `Catalog`
//! implementation the engagement core reads through.

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use engagement::{
    Catalog, DirectorId, EARLIEST_RELEASE_YEAR, FilmAttributes, FilmId, FilmRecord, GenreId,
    ReviewId, SearchScope, UserId,
};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

impl CatalogIndex {
    /// Load the catalog and its engagement snapshot from a directory
    ///
    /// Steps:
    /// 1. Parse all files in parallel
    /// 2. Build primary and secondary indices
    /// 3. Validate catalog integrity
    /// 4. Validate that the snapshot only references known entities
    ///
    /// `likes.dat` and `votes.dat` are optional; the catalog files are not.
    pub fn load_from_files(data_dir: &Path) -> Result<(Self, EngagementSnapshot)> {
        info!("Loading catalog from {:?}", data_dir);

        let genres_path = data_dir.join("genres.dat");
        let directors_path = data_dir.join("directors.dat");
        let users_path = data_dir.join("users.dat");
        let films_path = data_dir.join("films.dat");
        let reviews_path = data_dir.join("reviews.dat");
        let likes_path = data_dir.join("likes.dat");
        let votes_path = data_dir.join("votes.dat");

        // Parse the catalog files and the snapshot files in parallel
        let ((((genres, directors), users), (films, reviews)), (likes, votes)) = rayon::join(
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || {
                                rayon::join(
                                    || parser::parse_genres(&genres_path),
                                    || parser::parse_directors(&directors_path),
                                )
                            },
                            || parser::parse_users(&users_path),
                        )
                    },
                    || {
                        rayon::join(
                            || parser::parse_films(&films_path),
                            || parser::parse_reviews(&reviews_path),
                        )
                    },
                )
            },
            || {
                rayon::join(
                    || optional(parser::parse_likes(&likes_path)),
                    || optional(parser::parse_votes(&votes_path)),
                )
            },
        );

        let genres = genres?;
        let directors = directors?;
        let users = users?;
        let films = films?;
        let reviews = reviews?;
        let snapshot = EngagementSnapshot {
            likes: likes?,
            votes: votes?,
        };

        let mut index = CatalogIndex::new();
        for genre in genres {
            ensure_unique(index.genres.contains_key(&genre.id), "Genre", genre.id as u64)?;
            index.insert_genre(genre);
        }
        for director in directors {
            ensure_unique(
                index.directors.contains_key(&director.id),
                "Director",
                director.id as u64,
            )?;
            index.insert_director(director);
        }
        for user in users {
            ensure_unique(index.users.contains_key(&user.id), "User", user.id)?;
            index.insert_user(user);
        }
        for film in films {
            ensure_unique(index.films.contains_key(&film.id), "Film", film.id)?;
            index.insert_film(film);
        }
        for review in reviews {
            ensure_unique(index.reviews.contains_key(&review.id), "Review", review.id)?;
            index.insert_review(review);
        }

        index.validate()?;
        index.validate_snapshot(&snapshot)?;

        let (users, genres, directors, films, reviews) = index.counts();
        info!(
            "Loaded {} users, {} genres, {} directors, {} films, {} reviews, {} likes, {} votes",
            users,
            genres,
            directors,
            films,
            reviews,
            snapshot.likes.len(),
            snapshot.votes.len()
        );
        Ok((index, snapshot))
    }

    /// Validate catalog integrity
    ///
    /// Check that:
    /// - Every genre and director a film carries exists
    /// - Release years are not before the first film ever shown
    /// - Every review references an existing film and user
    pub fn validate(&self) -> Result<()> {
        for film in self.films.values() {
            if film.release_year < EARLIEST_RELEASE_YEAR {
                return Err(CatalogError::InvalidValue {
                    field: "releaseYear".to_string(),
                    value: film.release_year.to_string(),
                });
            }
            for genre in &film.genres {
                if !self.genres.contains_key(genre) {
                    return Err(missing("Genre", *genre as u64));
                }
            }
            for director in &film.directors {
                if !self.directors.contains_key(director) {
                    return Err(missing("Director", *director as u64));
                }
            }
        }
        for review in self.reviews.values() {
            if !self.films.contains_key(&review.film_id) {
                return Err(missing("Film", review.film_id));
            }
            if !self.users.contains_key(&review.user_id) {
                return Err(missing("User", review.user_id));
            }
        }
        Ok(())
    }

    /// Validate that every like and vote references existing entities
    pub fn validate_snapshot(&self, snapshot: &EngagementSnapshot) -> Result<()> {
        for like in &snapshot.likes {
            if !self.users.contains_key(&like.user_id) {
                return Err(missing("User", like.user_id));
            }
            if !self.films.contains_key(&like.film_id) {
                return Err(missing("Film", like.film_id));
            }
        }
        for vote in &snapshot.votes {
            if !self.reviews.contains_key(&vote.review_id) {
                return Err(missing("Review", vote.review_id));
            }
            if !self.users.contains_key(&vote.user_id) {
                return Err(missing("User", vote.user_id));
            }
        }
        Ok(())
    }
}

impl Catalog for CatalogIndex {
    fn user_exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    fn film_exists(&self, id: FilmId) -> bool {
        self.films.contains_key(&id)
    }

    fn review_exists(&self, id: ReviewId) -> bool {
        self.reviews.contains_key(&id)
    }

    fn genre_exists(&self, id: GenreId) -> bool {
        self.genres.contains_key(&id)
    }

    fn director_exists(&self, id: DirectorId) -> bool {
        self.directors.contains_key(&id)
    }

    fn film_attributes(&self, id: FilmId) -> Option<FilmAttributes> {
        self.films.get(&id).map(FilmRecord::attributes)
    }

    fn film_records(&self, ids: &[FilmId]) -> Vec<FilmRecord> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.films.get(id).cloned())
            .collect()
    }

    fn reviews(&self, film: Option<FilmId>) -> Vec<ReviewId> {
        match film {
            Some(film_id) => self.film_reviews.get(&film_id).cloned().unwrap_or_default(),
            None => self.reviews.keys().copied().collect(),
        }
    }

    fn films_by_director(&self, id: DirectorId) -> Vec<FilmId> {
        self.director_films.get(&id).cloned().unwrap_or_default()
    }

    fn search_films(&self, query: &str, scope: SearchScope) -> Vec<FilmId> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let matches = |text: &str| text.to_lowercase().contains(&needle);

        self.films
            .values()
            .filter(|film| {
                (scope.title && matches(&film.title))
                    || (scope.director
                        && film
                            .directors
                            .iter()
                            .filter_map(|id| self.directors.get(id))
                            .any(|director| matches(&director.name)))
            })
            .map(|film| film.id)
            .collect()
    }
}

/// Treat a missing optional file as empty
fn optional<T>(parsed: Result<Vec<T>>) -> Result<Vec<T>> {
    match parsed {
        Err(CatalogError::FileNotFound { .. }) => Ok(Vec::new()),
        other => other,
    }
}

fn ensure_unique(exists: bool, entity: &str, id: u64) -> Result<()> {
    if exists {
        Err(CatalogError::DuplicateId {
            entity: entity.to_string(),
            id,
        })
    } else {
        Ok(())
    }
}

fn missing(entity: &str, id: u64) -> CatalogError {
    CatalogError::MissingReference {
        entity: entity.to_string(),
        id,
    }
}
