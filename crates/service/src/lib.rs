//! Service crate for the cinegraph engagement core.
//!
//! `EngagementService` is the facade request handlers call: it gates ids
//! against the catalog, applies mutations, records feed events, and runs
//! the ranking derivations off the async runtime.

pub mod config;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use service::{EngagementService, PurgeSummary};
