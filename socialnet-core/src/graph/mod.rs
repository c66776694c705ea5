//! Follow-graph manager
//!
//! Maintains directed follow edges between users. Each edge is stored twice,
//! once in the follower's "following" set and once in the followee's
//! "followers" set, and both sides are always written in one store
//! transaction.

use crate::api::{FollowStatus, ListStatus, UnfollowStatus, UserListResponse};
use crate::model::{UserId, UserSummary};
use crate::storage::{SocialStore, StoreError, WriteOutcome};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Business logic over the follow edges of the relational store
pub struct FollowGraph {
    store: Arc<dyn SocialStore>,
}

impl FollowGraph {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Make `follower` follow `followee`
    ///
    /// The membership check and the write are not serialized. Two racing
    /// calls for the same pair both pass the check; the loser hits the
    /// store's primary key and is reported as `AlreadyFollowed`.
    pub fn follow(&self, follower: UserId, followee: UserId) -> Result<FollowStatus, StoreError> {
        if !self.both_exist(follower, followee, "follow")? {
            debug!(%follower, %followee, "follow: user not found");
            return Ok(FollowStatus::UserNotFound);
        }

        let following = self.following_ids(follower, followee, "follow")?;
        if following.contains(&followee) {
            debug!(%follower, %followee, "follow: already followed");
            return Ok(FollowStatus::AlreadyFollowed);
        }

        match self.store.insert_follow(follower, followee) {
            Ok(WriteOutcome::Applied) => {
                info!(%follower, %followee, "follow edge created");
                Ok(FollowStatus::Ok)
            }
            Ok(WriteOutcome::Unchanged) => {
                debug!(%follower, %followee, "follow: edge created concurrently");
                Ok(FollowStatus::AlreadyFollowed)
            }
            Err(e) => {
                error!(%follower, %followee, error = %e, "follow: failed to write edge");
                Err(e)
            }
        }
    }

    /// Remove the edge from `follower` to `followee`
    pub fn unfollow(
        &self,
        follower: UserId,
        followee: UserId,
    ) -> Result<UnfollowStatus, StoreError> {
        if !self.both_exist(follower, followee, "unfollow")? {
            debug!(%follower, %followee, "unfollow: user not found");
            return Ok(UnfollowStatus::UserNotFound);
        }

        let following = self.following_ids(follower, followee, "unfollow")?;
        if !following.contains(&followee) {
            debug!(%follower, %followee, "unfollow: not followed");
            return Ok(UnfollowStatus::NotFollowed);
        }

        match self.store.delete_follow(follower, followee) {
            Ok(WriteOutcome::Applied) => {
                info!(%follower, %followee, "follow edge removed");
                Ok(UnfollowStatus::Ok)
            }
            Ok(WriteOutcome::Unchanged) => Ok(UnfollowStatus::NotFollowed),
            Err(e) => {
                error!(%follower, %followee, error = %e, "unfollow: failed to remove edge");
                Err(e)
            }
        }
    }

    /// Everyone following `user_id`, in the order they followed
    pub fn list_followers(&self, user_id: UserId) -> Result<UserListResponse, StoreError> {
        self.list(user_id, "list_followers", |store| store.followers(user_id))
    }

    /// Everyone `user_id` follows, in the order they were followed
    pub fn list_following(&self, user_id: UserId) -> Result<UserListResponse, StoreError> {
        self.list(user_id, "list_following", |store| store.following(user_id))
    }

    fn list<F>(
        &self,
        user_id: UserId,
        op: &'static str,
        query: F,
    ) -> Result<UserListResponse, StoreError>
    where
        F: FnOnce(&dyn SocialStore) -> Result<Vec<UserSummary>, StoreError>,
    {
        let exists = self.store.user_exists(user_id).inspect_err(|e| {
            error!(op, %user_id, error = %e, "failed to look up user");
        })?;
        if !exists {
            debug!(op, %user_id, "user not found");
            return Ok(UserListResponse::user_not_found());
        }

        let users = query(self.store.as_ref()).inspect_err(|e| {
            error!(op, %user_id, error = %e, "failed to read follow edges");
        })?;

        Ok(UserListResponse {
            status: ListStatus::Ok,
            users,
        })
    }

    fn both_exist(&self, a: UserId, b: UserId, op: &'static str) -> Result<bool, StoreError> {
        let exists = |id: UserId| {
            self.store.user_exists(id).inspect_err(|e| {
                error!(op, follower = %a, followee = %b, error = %e, "failed to look up user");
            })
        };
        Ok(exists(a)? && exists(b)?)
    }

    fn following_ids(
        &self,
        follower: UserId,
        followee: UserId,
        op: &'static str,
    ) -> Result<Vec<UserId>, StoreError> {
        self.store.following_ids(follower).inspect_err(|e| {
            error!(op, %follower, %followee, error = %e, "failed to read following set");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqlSocialStore;
    use crate::test_utils::{assert_follow_symmetry, seed_users, UnavailableStore};

    fn graph_with_users(n: usize) -> (FollowGraph, Arc<SqlSocialStore>, Vec<UserId>) {
        let store = Arc::new(SqlSocialStore::memory().unwrap());
        let ids = seed_users(store.as_ref(), n);
        (FollowGraph::new(store.clone()), store, ids)
    }

    #[test]
    fn test_follow_writes_both_sides() {
        let (graph, store, ids) = graph_with_users(2);

        assert_eq!(graph.follow(ids[0], ids[1]).unwrap(), FollowStatus::Ok);

        let followers = graph.list_followers(ids[1]).unwrap();
        assert_eq!(followers.status, ListStatus::Ok);
        assert_eq!(followers.users.len(), 1);
        assert_eq!(followers.users[0].user_id, ids[0]);

        let following = graph.list_following(ids[0]).unwrap();
        assert_eq!(following.users[0].user_id, ids[1]);

        assert_follow_symmetry(store.as_ref(), &ids);
    }

    #[test]
    fn test_duplicate_follow_is_reported() {
        let (graph, store, ids) = graph_with_users(2);

        graph.follow(ids[0], ids[1]).unwrap();
        assert_eq!(
            graph.follow(ids[0], ids[1]).unwrap(),
            FollowStatus::AlreadyFollowed
        );
        assert_eq!(store.following_ids(ids[0]).unwrap(), vec![ids[1]]);
    }

    #[test]
    fn test_follow_unknown_user() {
        let (graph, store, ids) = graph_with_users(1);
        let missing = UserId(9999);

        assert_eq!(
            graph.follow(ids[0], missing).unwrap(),
            FollowStatus::UserNotFound
        );
        assert_eq!(
            graph.follow(missing, ids[0]).unwrap(),
            FollowStatus::UserNotFound
        );
        assert!(store.following_ids(ids[0]).unwrap().is_empty());
    }

    #[test]
    fn test_unfollow_removes_both_sides() {
        let (graph, store, ids) = graph_with_users(2);
        graph.follow(ids[0], ids[1]).unwrap();

        assert_eq!(graph.unfollow(ids[0], ids[1]).unwrap(), UnfollowStatus::Ok);
        assert!(graph.list_followers(ids[1]).unwrap().users.is_empty());
        assert!(graph.list_following(ids[0]).unwrap().users.is_empty());
        assert_follow_symmetry(store.as_ref(), &ids);
    }

    #[test]
    fn test_unfollow_twice_reports_not_followed() {
        let (graph, _store, ids) = graph_with_users(2);
        graph.follow(ids[0], ids[1]).unwrap();
        graph.unfollow(ids[0], ids[1]).unwrap();

        assert_eq!(
            graph.unfollow(ids[0], ids[1]).unwrap(),
            UnfollowStatus::NotFollowed
        );
    }

    #[test]
    fn test_unfollow_unknown_user() {
        let (graph, _store, ids) = graph_with_users(1);

        assert_eq!(
            graph.unfollow(ids[0], UserId(42)).unwrap(),
            UnfollowStatus::UserNotFound
        );
    }

    #[test]
    fn test_followers_in_insertion_order() {
        let (graph, _store, ids) = graph_with_users(4);
        graph.follow(ids[3], ids[0]).unwrap();
        graph.follow(ids[1], ids[0]).unwrap();
        graph.follow(ids[2], ids[0]).unwrap();

        let order: Vec<UserId> = graph
            .list_followers(ids[0])
            .unwrap()
            .users
            .into_iter()
            .map(|u| u.user_id)
            .collect();
        assert_eq!(order, vec![ids[3], ids[1], ids[2]]);
    }

    #[test]
    fn test_list_for_unknown_user() {
        let (graph, _store, _ids) = graph_with_users(0);

        assert_eq!(
            graph.list_followers(UserId(7)).unwrap().status,
            ListStatus::UserNotFound
        );
        assert_eq!(
            graph.list_following(UserId(7)).unwrap().status,
            ListStatus::UserNotFound
        );
    }

    #[test]
    fn test_self_follow_is_a_plain_edge() {
        let (graph, store, ids) = graph_with_users(1);

        assert_eq!(graph.follow(ids[0], ids[0]).unwrap(), FollowStatus::Ok);
        assert_eq!(store.followers(ids[0]).unwrap()[0].user_id, ids[0]);
    }

    #[test]
    fn test_store_failures_propagate() {
        let graph = FollowGraph::new(Arc::new(UnavailableStore));

        assert!(matches!(
            graph.follow(UserId(1), UserId(2)),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            graph.unfollow(UserId(1), UserId(2)),
            Err(StoreError::Unavailable(_))
        ));
        assert!(graph.list_followers(UserId(1)).is_err());
        assert!(graph.list_following(UserId(1)).is_err());
    }
}
