//! EngagementIndex - the bidirectional user <-> film like graph.
//!
//! Both directions live behind one `RwLock`, so a like edge is inserted
//! into (or removed from) both maps inside a single critical section.
//! Readers never see an edge that is present in one direction only, and
//! concurrent add/remove of the same edge resolves to whichever write took
//! the lock last.
//!
//! `add_like_with` and `remove_like_with` run a caller's step (the feed
//! append) inside that same critical section.
//!
//! Derivations that need several lookups over a consistent state take a
//! [`LikeGraph`] view with [`EngagementIndex::graph`].

use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{EngagementError, Result};
use crate::types::{FilmId, UserId};

#[derive(Debug, Default)]
struct Adjacency {
    /// Films liked by each user
    films_by_user: HashMap<UserId, HashSet<FilmId>>,
    /// Users who liked each film
    users_by_film: HashMap<FilmId, HashSet<UserId>>,
}

impl Adjacency {
    fn insert(&mut self, user_id: UserId, film_id: FilmId) -> bool {
        let created = self
            .films_by_user
            .entry(user_id)
            .or_default()
            .insert(film_id);
        self.users_by_film
            .entry(film_id)
            .or_default()
            .insert(user_id);
        created
    }

    fn remove(&mut self, user_id: UserId, film_id: FilmId) -> bool {
        let removed = match self.films_by_user.get_mut(&user_id) {
            Some(films) => films.remove(&film_id),
            None => false,
        };
        if !removed {
            return false;
        }

        if self.films_by_user.get(&user_id).is_some_and(HashSet::is_empty) {
            self.films_by_user.remove(&user_id);
        }
        if let Some(users) = self.users_by_film.get_mut(&film_id) {
            users.remove(&user_id);
            if users.is_empty() {
                self.users_by_film.remove(&film_id);
            }
        }
        true
    }
}

/// Tracks which users like which films
#[derive(Debug, Default)]
pub struct EngagementIndex {
    adjacency: RwLock<Adjacency>,
}

impl EngagementIndex {
    /// Creates a new, empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the like edge (user, film).
    ///
    /// Idempotent: liking a film twice keeps a single edge. Returns `true`
    /// if the edge was newly created.
    pub fn add_like(&self, user_id: UserId, film_id: FilmId) -> bool {
        self.add_like_with(user_id, film_id, |created| created)
    }

    /// Insert the like edge and run `then` before the write lock is released.
    ///
    /// `then` receives whether the edge was newly created. Whatever it
    /// records is ordered with the edge change: two writers on the same
    /// edge run their `then` in the order their changes were applied.
    /// `then` must not touch this index.
    pub fn add_like_with<R>(
        &self,
        user_id: UserId,
        film_id: FilmId,
        then: impl FnOnce(bool) -> R,
    ) -> R {
        let mut adjacency = self.adjacency.write();
        let created = adjacency.insert(user_id, film_id);
        debug!(user_id, film_id, created, "like edge inserted");
        then(created)
    }

    /// Remove the like edge (user, film).
    ///
    /// Returns `NotFound` if the user does not like the film; the index is
    /// left untouched in that case.
    pub fn remove_like(&self, user_id: UserId, film_id: FilmId) -> Result<()> {
        self.remove_like_with(user_id, film_id, || ())
    }

    /// Remove the like edge and run `then` before the write lock is released.
    ///
    /// `then` only runs when an edge was removed. Same ordering guarantee
    /// and restriction as [`add_like_with`](Self::add_like_with).
    pub fn remove_like_with<R>(
        &self,
        user_id: UserId,
        film_id: FilmId,
        then: impl FnOnce() -> R,
    ) -> Result<R> {
        let mut adjacency = self.adjacency.write();
        if !adjacency.remove(user_id, film_id) {
            return Err(EngagementError::like_not_found(user_id, film_id));
        }
        debug!(user_id, film_id, "like edge removed");
        Ok(then())
    }

    /// Whether the user currently likes the film
    pub fn likes(&self, user_id: UserId, film_id: FilmId) -> bool {
        self.adjacency
            .read()
            .films_by_user
            .get(&user_id)
            .is_some_and(|films| films.contains(&film_id))
    }

    /// Films liked by a user (empty if the user liked nothing)
    pub fn films_liked_by(&self, user_id: UserId) -> HashSet<FilmId> {
        self.adjacency
            .read()
            .films_by_user
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Users who liked a film (empty if nobody did)
    pub fn users_who_liked(&self, film_id: FilmId) -> HashSet<UserId> {
        self.adjacency
            .read()
            .users_by_film
            .get(&film_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of distinct users who liked a film
    pub fn like_count(&self, film_id: FilmId) -> usize {
        self.adjacency
            .read()
            .users_by_film
            .get(&film_id)
            .map_or(0, HashSet::len)
    }

    /// Remove every edge touching a user. Returns the number of edges removed.
    pub fn remove_user(&self, user_id: UserId) -> usize {
        let mut adjacency = self.adjacency.write();
        let films: Vec<FilmId> = adjacency
            .films_by_user
            .get(&user_id)
            .map(|films| films.iter().copied().collect())
            .unwrap_or_default();
        films
            .into_iter()
            .filter(|&film_id| adjacency.remove(user_id, film_id))
            .count()
    }

    /// Remove every edge touching a film. Returns the number of edges removed.
    pub fn remove_film(&self, film_id: FilmId) -> usize {
        let mut adjacency = self.adjacency.write();
        let users: Vec<UserId> = adjacency
            .users_by_film
            .get(&film_id)
            .map(|users| users.iter().copied().collect())
            .unwrap_or_default();
        users
            .into_iter()
            .filter(|&user_id| adjacency.remove(user_id, film_id))
            .count()
    }

    /// Total number of like edges
    pub fn edge_count(&self) -> usize {
        self.adjacency
            .read()
            .films_by_user
            .values()
            .map(HashSet::len)
            .sum()
    }

    /// A consistent read view over the whole graph.
    ///
    /// Writers wait while the view is alive, so hold it only for the length
    /// of one derivation.
    pub fn graph(&self) -> LikeGraph<'_> {
        LikeGraph {
            adjacency: self.adjacency.read(),
        }
    }
}

/// Read-locked view of the like graph
pub struct LikeGraph<'a> {
    adjacency: RwLockReadGuard<'a, Adjacency>,
}

impl LikeGraph<'_> {
    /// Films liked by a user, `None` if the user liked nothing
    pub fn films_of(&self, user_id: UserId) -> Option<&HashSet<FilmId>> {
        self.adjacency.films_by_user.get(&user_id)
    }

    /// Users who liked a film, `None` if nobody did
    pub fn likers_of(&self, film_id: FilmId) -> Option<&HashSet<UserId>> {
        self.adjacency.users_by_film.get(&film_id)
    }

    pub fn like_count(&self, film_id: FilmId) -> usize {
        self.likers_of(film_id).map_or(0, HashSet::len)
    }

    /// Every film with at least one like, paired with its like count
    pub fn like_counts(&self) -> impl Iterator<Item = (FilmId, usize)> + '_ {
        self.adjacency
            .users_by_film
            .iter()
            .map(|(&film_id, users)| (film_id, users.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_like_is_idempotent() {
        let index = EngagementIndex::new();

        assert!(index.add_like(1, 10));
        assert!(!index.add_like(1, 10));

        assert_eq!(index.films_liked_by(1).len(), 1);
        assert_eq!(index.like_count(10), 1);
        assert_eq!(index.edge_count(), 1);
    }

    #[test]
    fn test_both_directions_are_maintained() {
        let index = EngagementIndex::new();
        index.add_like(1, 10);
        index.add_like(1, 11);
        index.add_like(2, 10);

        assert_eq!(index.films_liked_by(1), HashSet::from([10, 11]));
        assert_eq!(index.users_who_liked(10), HashSet::from([1, 2]));
        assert_eq!(index.like_count(10), 2);
        assert_eq!(index.like_count(11), 1);
        assert!(index.likes(2, 10));
        assert!(!index.likes(2, 11));
    }

    #[test]
    fn test_empty_queries() {
        let index = EngagementIndex::new();

        assert!(index.films_liked_by(999).is_empty());
        assert!(index.users_who_liked(999).is_empty());
        assert_eq!(index.like_count(999), 0);
    }

    #[test]
    fn test_remove_missing_like_is_not_found() {
        let index = EngagementIndex::new();
        index.add_like(1, 10);

        let err = index.remove_like(1, 11).unwrap_err();
        assert!(err.is_not_found());
        let err = index.remove_like(2, 10).unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(index.like_count(10), 1);
    }

    #[test]
    fn test_add_then_remove_restores_state() {
        let index = EngagementIndex::new();
        index.add_like(1, 10);
        let before = index.films_liked_by(1);

        index.add_like(1, 20);
        index.remove_like(1, 20).unwrap();

        assert_eq!(index.films_liked_by(1), before);
        assert_eq!(index.like_count(20), 0);
        assert!(index.graph().likers_of(20).is_none());
    }

    #[test]
    fn test_callbacks_see_the_edge_change() {
        let index = EngagementIndex::new();

        assert!(index.add_like_with(1, 10, |created| created));
        assert!(!index.add_like_with(1, 10, |created| created));

        let mut ran = false;
        index.remove_like_with(1, 10, || ran = true).unwrap();
        assert!(ran);

        // No edge left: the callback is skipped
        let err = index
            .remove_like_with(1, 10, || panic!("ran without an edge"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_graph_like_counts_skip_unliked_films() {
        let index = EngagementIndex::new();
        index.add_like(1, 10);
        index.add_like(2, 10);
        index.add_like(1, 11);
        index.remove_like(1, 11).unwrap();

        let graph = index.graph();
        let counts: Vec<(FilmId, usize)> = graph.like_counts().collect();
        assert_eq!(counts, vec![(10, 2)]);
    }

    #[test]
    fn test_remove_user_and_film() {
        let index = EngagementIndex::new();
        index.add_like(1, 10);
        index.add_like(1, 11);
        index.add_like(2, 10);

        assert_eq!(index.remove_user(1), 2);
        assert!(index.films_liked_by(1).is_empty());
        assert_eq!(index.users_who_liked(10), HashSet::from([2]));

        assert_eq!(index.remove_film(10), 1);
        assert_eq!(index.edge_count(), 0);
    }

    #[test]
    fn test_concurrent_likes_keep_directions_consistent() {
        use rayon::prelude::*;

        let index = Arc::new(EngagementIndex::new());
        (0..200u64).into_par_iter().for_each(|i| {
            let user_id = i % 20;
            let film_id = i % 7;
            index.add_like(user_id, film_id);
            if i % 3 == 0 {
                let _ = index.remove_like(user_id, film_id);
            }
        });

        let graph = index.graph();
        for (film_id, count) in graph.like_counts() {
            let likers = graph.likers_of(film_id).unwrap();
            assert_eq!(likers.len(), count);
            for user_id in likers {
                assert!(graph.films_of(*user_id).unwrap().contains(&film_id));
            }
        }
    }
}
