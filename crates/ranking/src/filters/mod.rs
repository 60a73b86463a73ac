//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_liked;
pub mod genre;
pub mod release_year;

// Re-export for convenience
pub use already_liked::AlreadyLikedFilter;
pub use genre::GenreFilter;
pub use release_year::ReleaseYearFilter;
