//! OpinionScorer - one vote per (review, user) and the net usefulness score.
//!
//! Votes of a review are kept in a tally stored in a `DashMap` keyed by
//! review id. Every mutation holds the entry lock of that review while it
//! replaces the vote, recounts the tally and stores the derived score, so
//! concurrent votes on the same review cannot lose updates. Votes on
//! different reviews proceed in parallel.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{EngagementError, Result};
use crate::types::{Polarity, ReviewId, UserId, VoteState};

/// Votes cast on one review and the score derived from them
#[derive(Debug, Default, Clone)]
struct ReviewTally {
    votes: HashMap<UserId, Polarity>,
    score: i64,
}

impl ReviewTally {
    /// Recount likes minus dislikes from the stored votes
    fn recompute(&mut self) {
        self.score = self.votes.values().map(|polarity| polarity.weight()).sum();
    }
}

/// Maintains review votes and usefulness scores
#[derive(Debug, Default)]
pub struct OpinionScorer {
    tallies: DashMap<ReviewId, ReviewTally>,
}

impl OpinionScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cast (or replace) the user's vote on a review.
    ///
    /// Switching LIKE to DISLIKE moves the score by exactly -2. Returns the
    /// recomputed score.
    pub fn vote(&self, review_id: ReviewId, user_id: UserId, polarity: Polarity) -> i64 {
        let mut tally = self.tallies.entry(review_id).or_default();
        let previous = tally.votes.insert(user_id, polarity);
        tally.recompute();

        debug!(
            review_id,
            user_id,
            %polarity,
            replaced = previous.is_some(),
            score = tally.score,
            "vote recorded"
        );
        tally.score
    }

    /// Retract the user's vote of the given polarity.
    ///
    /// Returns `NotFound` if the user holds no vote of that polarity on the
    /// review (no vote at all, or a vote of the opposite polarity); the
    /// stored vote is kept in that case. Returns the recomputed score.
    /// A review left without votes is dropped from the map.
    pub fn retract_vote(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        polarity: Polarity,
    ) -> Result<i64> {
        let Entry::Occupied(mut entry) = self.tallies.entry(review_id) else {
            return Err(EngagementError::vote_not_found(review_id, user_id));
        };

        let tally = entry.get_mut();
        if tally.votes.get(&user_id) != Some(&polarity) {
            return Err(EngagementError::vote_not_found(review_id, user_id));
        }
        tally.votes.remove(&user_id);
        tally.recompute();
        let score = tally.score;

        if tally.votes.is_empty() {
            entry.remove();
        }

        debug!(review_id, user_id, %polarity, score, "vote retracted");
        Ok(score)
    }

    /// Current usefulness score, 0 if the review has no votes
    pub fn score_of(&self, review_id: ReviewId) -> i64 {
        self.tallies.get(&review_id).map_or(0, |tally| tally.score)
    }

    /// The vote the user currently holds on the review
    pub fn vote_of(&self, review_id: ReviewId, user_id: UserId) -> VoteState {
        let polarity = self
            .tallies
            .get(&review_id)
            .and_then(|tally| tally.votes.get(&user_id).copied());
        VoteState::from(polarity)
    }

    /// Order reviews by descending score, ties by ascending id, keeping at most `count`
    pub fn rank(&self, review_ids: &[ReviewId], count: usize) -> Vec<(ReviewId, i64)> {
        let mut ranked: Vec<(ReviewId, i64)> = review_ids
            .iter()
            .map(|&review_id| (review_id, self.score_of(review_id)))
            .collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.dedup_by_key(|(review_id, _)| *review_id);
        ranked.truncate(count);
        ranked
    }

    /// Drop every vote on a review. Returns the number of votes dropped.
    pub fn remove_review(&self, review_id: ReviewId) -> usize {
        self.tallies
            .remove(&review_id)
            .map_or(0, |(_, tally)| tally.votes.len())
    }

    /// Drop every vote cast by a user and rescore the affected reviews.
    /// Returns the number of votes dropped.
    pub fn remove_user(&self, user_id: UserId) -> usize {
        let mut removed = 0;
        self.tallies.retain(|_, tally| {
            if tally.votes.remove(&user_id).is_some() {
                tally.recompute();
                removed += 1;
            }
            !tally.votes.is_empty()
        });
        removed
    }
}
