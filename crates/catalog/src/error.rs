//! Failures while loading a dataset directory.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A required `.dat` file is absent
    #[error("Dataset file not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A line did not split into the expected fields or a field did not parse
    #[error("{file}:{line}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field parsed but is out of range, e.g. a release year before 1895
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// A review, like or vote names an entity the catalog does not hold
    #[error("{entity} {id} is referenced but does not exist")]
    MissingReference { entity: String, id: u64 },

    #[error("Duplicate {entity} id {id}")]
    DuplicateId { entity: String, id: u64 },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
