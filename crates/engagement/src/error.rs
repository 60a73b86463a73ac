//! Error types for the engagement core.
//!
//! Only two things can go wrong inside the core: something referenced does
//! not exist, or an argument is out of range. Read operations never fail on
//! an empty result; they return an empty collection instead.

use std::fmt;
use thiserror::Error;

use crate::types::{DirectorId, FilmId, ReviewId, UserId};

/// The kind of entity a `NotFound` error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Film,
    Review,
    Director,
    /// A (user, film) like edge
    Like,
    /// A (review, user) vote of a given polarity
    Vote,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "User",
            Entity::Film => "Film",
            Entity::Review => "Review",
            Entity::Director => "Director",
            Entity::Like => "Like",
            Entity::Vote => "Vote",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by engagement operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngagementError {
    /// Referenced entity doesn't exist, or a removal targets a missing edge/vote
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// Argument is out of range (non-positive limit, unknown filter value)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngagementError {
    pub fn user_not_found(id: UserId) -> Self {
        Self::NotFound {
            entity: Entity::User,
            id: id.to_string(),
        }
    }

    pub fn film_not_found(id: FilmId) -> Self {
        Self::NotFound {
            entity: Entity::Film,
            id: id.to_string(),
        }
    }

    pub fn review_not_found(id: ReviewId) -> Self {
        Self::NotFound {
            entity: Entity::Review,
            id: id.to_string(),
        }
    }

    pub fn director_not_found(id: DirectorId) -> Self {
        Self::NotFound {
            entity: Entity::Director,
            id: id.to_string(),
        }
    }

    pub fn like_not_found(user_id: UserId, film_id: FilmId) -> Self {
        Self::NotFound {
            entity: Entity::Like,
            id: format!("user {} -> film {}", user_id, film_id),
        }
    }

    pub fn vote_not_found(review_id: ReviewId, user_id: UserId) -> Self {
        Self::NotFound {
            entity: Entity::Vote,
            id: format!("review {} <- user {}", review_id, user_id),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngagementError>;
