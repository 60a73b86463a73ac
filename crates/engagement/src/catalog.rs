//! The collaborator the core consults about entities it does not own.
//!
//! Users, films, genres, directors and reviews live in the surrounding
//! application. The core asks whether they exist, what attributes a film
//! carries, which films match a director or a search, and for presentation
//! records of ranked film ids.

use crate::error::{EngagementError, Result};
use crate::types::{
    DirectorId, FilmAttributes, FilmId, FilmRecord, GenreId, ReviewId, SearchScope, UserId,
};

/// Existence gates and read access to the entity catalog.
///
/// `Send + Sync` so one catalog can be shared behind an `Arc` by every
/// component and by concurrent requests.
pub trait Catalog: Send + Sync {
    fn user_exists(&self, id: UserId) -> bool;

    fn film_exists(&self, id: FilmId) -> bool;

    fn review_exists(&self, id: ReviewId) -> bool;

    fn genre_exists(&self, id: GenreId) -> bool;

    fn director_exists(&self, id: DirectorId) -> bool;

    /// Genres and release year of a film, `None` if the film is unknown
    fn film_attributes(&self, id: FilmId) -> Option<FilmAttributes>;

    /// Presentation records for the given ids.
    ///
    /// Order of the result is unspecified and unknown ids are skipped.
    fn film_records(&self, ids: &[FilmId]) -> Vec<FilmRecord>;

    /// Ids of all reviews, or only those written about `film`
    fn reviews(&self, film: Option<FilmId>) -> Vec<ReviewId>;

    /// Ids of the films a director made, in no particular order
    fn films_by_director(&self, id: DirectorId) -> Vec<FilmId>;

    /// Ids of films whose title or director name (per `scope`) contains
    /// `query`, ignoring case. In no particular order.
    fn search_films(&self, query: &str, scope: SearchScope) -> Vec<FilmId>;

    fn require_user(&self, id: UserId) -> Result<()> {
        if self.user_exists(id) {
            Ok(())
        } else {
            Err(EngagementError::user_not_found(id))
        }
    }

    fn require_film(&self, id: FilmId) -> Result<()> {
        if self.film_exists(id) {
            Ok(())
        } else {
            Err(EngagementError::film_not_found(id))
        }
    }

    fn require_director(&self, id: DirectorId) -> Result<()> {
        if self.director_exists(id) {
            Ok(())
        } else {
            Err(EngagementError::director_not_found(id))
        }
    }

    fn require_review(&self, id: ReviewId) -> Result<()> {
        if self.review_exists(id) {
            Ok(())
        } else {
            Err(EngagementError::review_not_found(id))
        }
    }
}
