//! Recommendation Engine - user-based collaborative filtering
//!
//! "Users who like what you like also like these films"
//!
//! ## Algorithm
//! 1. Take the films the target user likes (`L(u)`); none means no recommendations
//! 2. Every other user sharing at least `min_overlap` of those films is a
//!    neighbor, weighted by the size of the overlap
//! 3. Each neighbor adds its weight to every film it likes
//! 4. Drop films the target user already likes
//! 5. Sort by score DESC, film id ASC
//!
//! Both aggregation passes run on rayon with per-thread maps merged at the
//! end. The whole derivation reads one consistent view of the like graph.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::AlreadyLikedFilter;
use crate::types::{Candidate, RankingContext, by_rank};
use engagement::{EngagementIndex, FilmId, LikeGraph, Result, UserId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Generates personalized film recommendations from the like graph
pub struct RecommendationEngine {
    /// Shared like graph
    index: Arc<EngagementIndex>,

    /// Minimum number of shared likes for another user to count as a neighbor
    min_overlap: usize,
}

impl RecommendationEngine {
    pub fn new(index: Arc<EngagementIndex>) -> Self {
        Self {
            index,
            min_overlap: 1,
        }
    }

    /// Configure the minimum overlap for neighbors (default: 1, never below 1)
    pub fn with_min_overlap(mut self, min_overlap: usize) -> Self {
        self.min_overlap = min_overlap.max(1);
        self
    }

    /// Recommended film ids for a user, best first. Uncapped.
    pub fn recommend(&self, user_id: UserId) -> Result<Vec<FilmId>> {
        Ok(self
            .candidates(user_id)?
            .into_iter()
            .map(|c| c.film_id)
            .collect())
    }

    /// Scored recommendation candidates for a user, best first
    #[instrument(skip(self))]
    pub fn candidates(&self, user_id: UserId) -> Result<Vec<Candidate>> {
        let (liked, scores) = {
            let graph = self.index.graph();
            let Some(liked) = graph.films_of(user_id) else {
                debug!("User {} likes nothing, no recommendations", user_id);
                return Ok(Vec::new());
            };

            // Step 1: Weigh neighbors by overlap
            let neighbors = self.find_neighbors(&graph, user_id, liked);
            debug!("Found {} neighbors", neighbors.len());

            // Step 2: Let each neighbor vote for its films
            let scores = candidate_scores(&graph, &neighbors);
            (liked.clone(), scores)
        };

        // Step 3: Convert to candidates, drop what the user already likes, sort
        let candidates: Vec<Candidate> = scores
            .into_iter()
            .map(|(film_id, score)| Candidate::new(film_id, score))
            .collect();

        let context = RankingContext::for_user(user_id, liked);
        let mut candidates = FilterPipeline::new()
            .add_filter(AlreadyLikedFilter)
            .apply(candidates, &context)?;
        candidates.sort_by(by_rank);

        debug!("Generated {} recommendations", candidates.len());
        Ok(candidates)
    }

    /// Overlap weight of every other user sharing enough liked films
    fn find_neighbors(
        &self,
        graph: &LikeGraph<'_>,
        user_id: UserId,
        liked: &HashSet<FilmId>,
    ) -> HashMap<UserId, u64> {
        let overlaps = liked
            .par_iter()
            .fold(HashMap::new, |mut local: HashMap<UserId, u64>, &film_id| {
                if let Some(likers) = graph.likers_of(film_id) {
                    for &other in likers {
                        if other != user_id {
                            *local.entry(other).or_insert(0) += 1;
                        }
                    }
                }
                local
            })
            .reduce(HashMap::new, merge_counts);

        let min_overlap = self.min_overlap as u64;
        overlaps
            .into_iter()
            .filter(|(_, overlap)| *overlap >= min_overlap)
            .collect()
    }
}

/// Summed neighbor weight per film
fn candidate_scores(
    graph: &LikeGraph<'_>,
    neighbors: &HashMap<UserId, u64>,
) -> HashMap<FilmId, u64> {
    neighbors
        .par_iter()
        .fold(HashMap::new, |mut local: HashMap<FilmId, u64>, (&neighbor, &weight)| {
            for &film_id in graph.films_of(neighbor).into_iter().flatten() {
                *local.entry(film_id).or_insert(0) += weight;
            }
            local
        })
        .reduce(HashMap::new, merge_counts)
}

/// Merge per-thread counts; user ids and film ids share the `u64` key type
fn merge_counts(mut acc: HashMap<u64, u64>, local: HashMap<u64, u64>) -> HashMap<u64, u64> {
    for (key, count) in local {
        *acc.entry(key).or_insert(0) += count;
    }
    acc
}
