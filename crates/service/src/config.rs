use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables of the engagement service, every field optional in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Films returned by `popular` when the caller gives no limit
    #[serde(default = "default_popular_limit")]
    pub default_popular_limit: usize,

    /// Reviews returned by `most_useful_reviews` when the caller gives no count
    #[serde(default = "default_review_count")]
    pub default_review_count: usize,

    /// Cap on recommendation lists, uncapped when absent
    #[serde(default)]
    pub recommendation_limit: Option<usize>,

    /// Shared likes needed for another user to count as a neighbor
    #[serde(default = "default_min_neighbor_overlap")]
    pub min_neighbor_overlap: usize,
}

fn default_popular_limit() -> usize {
    ranking::DEFAULT_POPULAR_LIMIT
}

fn default_review_count() -> usize {
    10
}

fn default_min_neighbor_overlap() -> usize {
    1
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_popular_limit: default_popular_limit(),
            default_review_count: default_review_count(),
            recommendation_limit: None,
            min_neighbor_overlap: default_min_neighbor_overlap(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}
