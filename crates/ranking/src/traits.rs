//! The seam between rankers and the filters they apply.

use crate::types::{Candidate, RankingContext};
use engagement::Result;

/// A step that narrows a ranked candidate list.
///
/// Implementations keep the relative order of the candidates they retain,
/// so a list sorted before filtering is still sorted after. `Send + Sync`
/// lets a pipeline be built once and shared across request threads.
pub trait Filter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Consume the candidates and return the ones that pass
    fn apply(&self, candidates: Vec<Candidate>, context: &RankingContext)
    -> Result<Vec<Candidate>>;
}
