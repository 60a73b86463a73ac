//! Core domain types shared by every crate in the workspace.
//!
//! This module defines the identifiers, records and enums that flow
//! between the engagement components and their collaborators:
//! - Type aliases for domain clarity (UserId, FilmId, ReviewId)
//! - Film records and the attributes the popularity filters read
//! - The fields a film search looks at
//! - Vote polarity and the per-(review, user) vote state
//! - Feed events for the activity ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{EngagementError, Result};

// =============================================================================
// Type Aliases
// =============================================================================
// These keep user ids, film ids and review ids apart in signatures

/// Unique identifier for a user
pub type UserId = u64;

/// Unique identifier for a film
pub type FilmId = u64;

/// Unique identifier for a review (an opinion entry about a film)
pub type ReviewId = u64;

/// Unique identifier for a genre
pub type GenreId = u32;

/// Unique identifier for a director
pub type DirectorId = u32;

/// Auto-incrementing identifier of a feed event
pub type EventId = u64;

/// Earliest release year a film can carry (the first public screening was in 1895)
pub const EARLIEST_RELEASE_YEAR: u16 = 1895;

// =============================================================================
// Film-related Types
// =============================================================================

/// The film attributes read by the popularity filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmAttributes {
    pub genres: BTreeSet<GenreId>,
    pub release_year: u16,
}

/// A film as materialized by the catalog for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmRecord {
    pub id: FilmId,
    pub title: String,
    pub release_year: u16,
    pub genres: BTreeSet<GenreId>,
    pub directors: BTreeSet<DirectorId>,
}

impl FilmRecord {
    /// Attributes of this film used for filtering
    pub fn attributes(&self) -> FilmAttributes {
        FilmAttributes {
            genres: self.genres.clone(),
            release_year: self.release_year,
        }
    }
}

/// Which film fields a text search looks at.
///
/// Parsed from a comma separated list of `title` and `director`; a blank
/// list searches titles only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchScope {
    pub title: bool,
    pub director: bool,
}

impl Default for SearchScope {
    fn default() -> Self {
        Self {
            title: true,
            director: false,
        }
    }
}

impl FromStr for SearchScope {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut scope = Self {
            title: false,
            director: false,
        };
        for field in s.split(',').map(str::trim) {
            match field {
                "title" => scope.title = true,
                "director" => scope.director = true,
                other => {
                    return Err(EngagementError::InvalidArgument(format!(
                        "unknown search field '{}', expected 'title' or 'director'",
                        other
                    )));
                }
            }
        }
        Ok(scope)
    }
}

// =============================================================================
// Review Votes
// =============================================================================

/// Polarity of a vote cast on a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Polarity {
    Like,
    Dislike,
}

impl Polarity {
    /// Contribution of one vote of this polarity to the usefulness score
    pub fn weight(self) -> i64 {
        match self {
            Polarity::Like => 1,
            Polarity::Dislike => -1,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Like => write!(f, "LIKE"),
            Polarity::Dislike => write!(f, "DISLIKE"),
        }
    }
}

/// The vote a single user holds on a single review.
///
/// A user can never hold a like and a dislike at the same time: the state
/// is one of three variants, and casting a vote replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VoteState {
    #[default]
    NoVote,
    Liked,
    Disliked,
}

impl From<Option<Polarity>> for VoteState {
    fn from(polarity: Option<Polarity>) -> Self {
        match polarity {
            None => VoteState::NoVote,
            Some(Polarity::Like) => VoteState::Liked,
            Some(Polarity::Dislike) => VoteState::Disliked,
        }
    }
}

// =============================================================================
// Feed Events
// =============================================================================

/// Kind of action a feed event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Like,
    Review,
    Friend,
}

/// What happened to the entity referenced by a feed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Add,
    Remove,
    Update,
}

/// An immutable, timestamped record of an action taken by a user.
///
/// `entity_id` is a film id for `Like`, a review id for `Review` and a user
/// id for `Friend` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    pub event_id: EventId,
    pub user_id: UserId,
    pub event_type: EventType,
    pub operation: Operation,
    pub entity_id: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_weight() {
        assert_eq!(Polarity::Like.weight(), 1);
        assert_eq!(Polarity::Dislike.weight(), -1);
    }

    #[test]
    fn test_vote_state_from_polarity() {
        assert_eq!(VoteState::from(None), VoteState::NoVote);
        assert_eq!(VoteState::from(Some(Polarity::Like)), VoteState::Liked);
        assert_eq!(VoteState::from(Some(Polarity::Dislike)), VoteState::Disliked);
    }

    #[test]
    fn test_search_scope_parsing() {
        assert_eq!("".parse::<SearchScope>().unwrap(), SearchScope::default());
        assert_eq!(
            "director".parse::<SearchScope>().unwrap(),
            SearchScope {
                title: false,
                director: true
            }
        );
        assert_eq!(
            "title, director".parse::<SearchScope>().unwrap(),
            SearchScope {
                title: true,
                director: true
            }
        );

        let err = "title,genre".parse::<SearchScope>().unwrap_err();
        assert!(matches!(err, EngagementError::InvalidArgument(_)));
    }

    #[test]
    fn test_feed_event_serializes_like_the_feed_api() {
        let event = FeedEvent {
            event_id: 7,
            user_id: 1,
            event_type: EventType::Like,
            operation: Operation::Remove,
            entity_id: 42,
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventId"], 7);
        assert_eq!(json["eventType"], "LIKE");
        assert_eq!(json["operation"], "REMOVE");
        assert_eq!(json["entityId"], 42);
    }
}
