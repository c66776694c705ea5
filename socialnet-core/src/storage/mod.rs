//! Relational store for users, posts and the follow graph
//!
//! Everything above this module talks to persistence through the
//! [`SocialStore`] repository trait. [`SqlSocialStore`] is the SQLite
//! implementation backed by an r2d2 connection pool.

pub mod migrations;
pub mod sql_store;

pub use migrations::{migrate, CURRENT_SCHEMA_VERSION};
pub use sql_store::SqlSocialStore;

use crate::model::{
    Comment, NewComment, NewPost, NewUser, Post, PostId, User, UserId, UserSummary,
};

/// Infrastructure failures raised by a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a write that may find its target already in the requested state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row(s) were written or removed
    Applied,
    /// Nothing changed: the row already existed (insert) or was absent (delete)
    Unchanged,
}

/// Result of inserting a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInsert {
    Created(User),
    UsernameTaken,
}

/// Repository interface over the relational store
///
/// Implementations must write both sides of a follow edge as one unit:
/// after any call returns, `followee` is in `followers(follower)`'s mirror
/// exactly when `follower` lists `followee` in `following`.
pub trait SocialStore: Send + Sync {
    // ===== Users =====

    fn insert_user(&self, user: &NewUser) -> Result<UserInsert, StoreError>;

    fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError>;

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    fn update_user(&self, user: &User) -> Result<(), StoreError>;

    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError>;

    // ===== Follow graph =====

    /// Ids the user follows, in the order the edges were created
    fn following_ids(&self, user_id: UserId) -> Result<Vec<UserId>, StoreError>;

    /// Users the user follows, in the order the edges were created
    fn following(&self, user_id: UserId) -> Result<Vec<UserSummary>, StoreError>;

    /// Users following the user, in the order the edges were created
    fn followers(&self, user_id: UserId) -> Result<Vec<UserSummary>, StoreError>;

    /// Insert the edge and its mirror atomically. `Unchanged` when the edge
    /// already exists.
    fn insert_follow(&self, follower: UserId, followee: UserId)
        -> Result<WriteOutcome, StoreError>;

    /// Remove the edge and its mirror atomically. `Unchanged` when neither
    /// side existed.
    fn delete_follow(&self, follower: UserId, followee: UserId)
        -> Result<WriteOutcome, StoreError>;

    // ===== Feed =====

    /// Post ids authored by everyone the user follows: followees in edge
    /// order, each followee's posts in stored order. One query.
    fn followee_post_ids(&self, user_id: UserId) -> Result<Vec<PostId>, StoreError>;

    // ===== Posts =====

    fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError>;

    fn get_post(&self, post_id: PostId) -> Result<Option<Post>, StoreError>;

    fn update_post(&self, post: &Post) -> Result<(), StoreError>;

    /// Delete a post with its likes and comments. `Unchanged` when absent.
    fn delete_post(&self, post_id: PostId) -> Result<WriteOutcome, StoreError>;

    /// `Unchanged` when the user already likes the post
    fn insert_like(&self, user_id: UserId, post_id: PostId) -> Result<WriteOutcome, StoreError>;

    fn like_count(&self, post_id: PostId) -> Result<u64, StoreError>;

    fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StoreError>;

    fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError>;
}
