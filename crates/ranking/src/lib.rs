//! # Ranking Crate
//!
//! Derived views over the like graph: global popularity and personalized
//! recommendations, both expressed as scored candidates that flow through a
//! composable filter pipeline.
//!
//! ## Main Components
//!
//! - **popularity**: `PopularityRanker`, films by distinct-liker count, plus
//!   common films, director filmographies and title/director search
//! - **recommend**: `RecommendationEngine`, user-based collaborative filtering
//! - **filter_pipeline**: `FilterPipeline`, chains filters in order
//! - **filters**: genre, release year and already-liked filters
//! - **types**: `Candidate` and `RankingContext`
//!
//! ## Example Usage
//!
//! ```ignore
//! use ranking::{PopularityRanker, RecommendationEngine};
//!
//! let ranker = PopularityRanker::new(index.clone(), catalog.clone());
//! let top_comedies = ranker.popular(Some(5), Some(comedy_id), None)?;
//!
//! let engine = RecommendationEngine::new(index.clone());
//! let for_ann = engine.recommend(ann_id)?;
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod popularity;
pub mod recommend;
pub mod traits;
pub mod types;

pub use filter_pipeline::FilterPipeline;
pub use filters::{AlreadyLikedFilter, GenreFilter, ReleaseYearFilter};
pub use popularity::{DEFAULT_POPULAR_LIMIT, FilmOrder, PopularityRanker};
pub use recommend::RecommendationEngine;
pub use traits::Filter;
pub use types::{Candidate, RankingContext, by_rank};
