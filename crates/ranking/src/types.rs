//! Candidate and context types shared by the rankers and the filters.

use engagement::{FilmId, UserId};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A film proposed by a ranker, with the integer score it was ranked by.
///
/// Popularity scores are like counts; recommendation scores are summed
/// neighbor overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub film_id: FilmId,
    pub score: u64,
}

impl Candidate {
    pub fn new(film_id: FilmId, score: u64) -> Self {
        Self { film_id, score }
    }
}

/// Ranking order: descending score, ties broken by ascending film id
pub fn by_rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.cmp(&a.score).then_with(|| a.film_id.cmp(&b.film_id))
}

/// Who the ranking is for, and what they already like
#[derive(Debug, Clone, Default)]
pub struct RankingContext {
    pub user_id: Option<UserId>,
    pub liked_films: HashSet<FilmId>,
}

impl RankingContext {
    /// Context of an anonymous (global) ranking
    pub fn global() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId, liked_films: HashSet<FilmId>) -> Self {
        Self {
            user_id: Some(user_id),
            liked_films,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new(1, 3);
        assert_eq!(candidate.film_id, 1);
        assert_eq!(candidate.score, 3);
    }

    #[test]
    fn test_rank_order_breaks_ties_by_id() {
        let mut candidates = vec![
            Candidate::new(4, 1),
            Candidate::new(9, 2),
            Candidate::new(3, 1),
        ];
        candidates.sort_by(by_rank);

        let ids: Vec<FilmId> = candidates.iter().map(|c| c.film_id).collect();
        assert_eq!(ids, vec![9, 3, 4]);
    }
}
