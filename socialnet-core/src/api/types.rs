//! Request, response and status types of the two service surfaces
//!
//! Statuses are domain outcomes and travel inside successful responses.
//! Infrastructure failures never appear here; they surface as
//! [`ServiceError`](super::ServiceError).

use crate::model::{Comment, CommentId, Post, PostId, PostUpdate, UserId, UserSummary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ===== Users =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateUserStatus {
    Ok,
    UsernameTaken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub status: CreateUserStatus,
    pub user: Option<UserSummary>,
}

/// Partial profile edit; only present fields are applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditUserRequest {
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditUserStatus {
    Ok,
    UserNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticateStatus {
    Ok,
    UserNotFound,
    WrongPassword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateUserResponse {
    pub status: AuthenticateStatus,
    pub user_id: Option<UserId>,
}

// ===== Follow graph =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowRequest {
    pub follower_id: UserId,
    pub followee_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowStatus {
    Ok,
    UserNotFound,
    AlreadyFollowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnfollowStatus {
    Ok,
    UserNotFound,
    NotFollowed,
}

/// Request addressed to a single user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListStatus {
    Ok,
    UserNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListResponse {
    pub status: ListStatus,
    pub users: Vec<UserSummary>,
}

impl UserListResponse {
    pub fn user_not_found() -> Self {
        Self {
            status: ListStatus::UserNotFound,
            users: Vec::new(),
        }
    }
}

// ===== Posts =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Ok,
    UserNotFound,
    PostNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub user_id: UserId,
    pub content_text: String,
    pub content_image_path: Option<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostResponse {
    pub status: PostStatus,
    pub post_id: Option<PostId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest {
    pub post_id: PostId,
}

/// A post together with its engagement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: Post,
    pub like_count: u64,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPostResponse {
    pub status: PostStatus,
    pub detail: Option<PostDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPostRequest {
    pub post_id: PostId,
    #[serde(flatten)]
    pub update: PostUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikePostRequest {
    pub user_id: UserId,
    pub post_id: PostId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostCommentRequest {
    pub user_id: UserId,
    pub post_id: PostId,
    pub content_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostCommentResponse {
    pub status: PostStatus,
    pub comment_id: Option<CommentId>,
}

// ===== Newsfeed =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsfeedStatus {
    Ok,
    UserNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateNewsfeedResponse {
    pub status: NewsfeedStatus,
    pub post_ids: Vec<PostId>,
}

impl GenerateNewsfeedResponse {
    pub fn ok(post_ids: Vec<PostId>) -> Self {
        Self {
            status: NewsfeedStatus::Ok,
            post_ids,
        }
    }

    pub fn user_not_found() -> Self {
        Self {
            status: NewsfeedStatus::UserNotFound,
            post_ids: Vec::new(),
        }
    }
}
