//! # Engagement Crate
//!
//! The social-engagement state of the system: who likes which film, how
//! users voted on reviews, and what each user did over time.
//!
//! ## Main Components
//!
//! - **index**: `EngagementIndex`, the bidirectional user <-> film like graph
//! - **opinion**: `OpinionScorer`, one vote per (review, user) and the net usefulness score
//! - **ledger**: `ActivityLedger`, the append-only feed event log
//! - **catalog**: the `Catalog` trait through which existence gates and film
//!   attributes are read from the surrounding application
//! - **types** / **error**: shared ids, records and the error type
//!
//! ## Example Usage
//!
//! ```ignore
//! use engagement::{ActivityLedger, EngagementIndex, EventType, Operation, OpinionScorer, Polarity};
//!
//! let index = EngagementIndex::new();
//! index.add_like(1, 10);
//! assert_eq!(index.like_count(10), 1);
//!
//! let scorer = OpinionScorer::new();
//! scorer.vote(5, 1, Polarity::Like);
//! assert_eq!(scorer.score_of(5), 1);
//!
//! let ledger = ActivityLedger::new();
//! ledger.record(1, EventType::Like, Operation::Add, 10);
//! ```
//!
//! Every component is `Send + Sync` and meant to be shared behind an `Arc`.
//! Existence of users, films and reviews is checked by the caller through
//! [`Catalog`] before a mutation reaches these components.

pub mod catalog;
pub mod error;
pub mod index;
pub mod ledger;
pub mod opinion;
pub mod types;

// Re-export commonly used types for convenience
pub use catalog::Catalog;
pub use error::{EngagementError, Entity, Result};
pub use index::{EngagementIndex, LikeGraph};
pub use ledger::{ActivityLedger, Clock};
pub use opinion::OpinionScorer;
pub use types::{
    // Type aliases
    DirectorId,
    EventId,
    FilmId,
    GenreId,
    ReviewId,
    UserId,
    // Records
    FeedEvent,
    FilmAttributes,
    FilmRecord,
    SearchScope,
    // Enums
    EventType,
    Operation,
    Polarity,
    VoteState,
    // Constants
    EARLIEST_RELEASE_YEAR,
};
