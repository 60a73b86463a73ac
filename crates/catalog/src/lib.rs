//! # Catalog Crate
//!
//! The entity catalog the engagement core consults: users, genres,
//! directors, films and reviews, loaded from a directory of `.dat` files together with the
//! likes and votes persisted next to them.
//!
//! ## Main Components
//!
//! - **types**: Catalog records (User, Genre, Director, Film, Review) and `CatalogIndex`
//! - **parser**: Parse the `::` separated `.dat` files into Rust structs
//! - **index**: Load and validate a dataset; implement `engagement::Catalog`
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::CatalogIndex;
//! use engagement::Catalog;
//! use std::path::Path;
//!
//! let (catalog, snapshot) = CatalogIndex::load_from_files(Path::new("data/sample"))?;
//!
//! assert!(catalog.film_exists(1));
//! println!("{} likes to replay", snapshot.likes.len());
//! ```

// Public modules
pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use types::{
    CatalogIndex, Director, EngagementSnapshot, Film, Genre, LikeRecord, Review, User, VoteRecord,
};
