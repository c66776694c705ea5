//! Posts, comments and likes

use super::types::{CommentId, PostId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A post owned by its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub content_text: String,
    pub content_image_path: Option<String>,
    pub visible: bool,

    /// Set once on insert, never updated
    pub created_at: Timestamp,
}

impl Post {
    /// Apply a partial edit; absent fields are left untouched
    pub fn apply(&mut self, update: PostUpdate) {
        if let Some(text) = update.content_text {
            self.content_text = text;
        }
        if let Some(image) = update.content_image_path {
            self.content_image_path = Some(image);
        }
        if let Some(visible) = update.visible {
            self.visible = visible;
        }
    }
}

/// Fields required to insert a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub user_id: UserId,
    pub content_text: String,
    pub content_image_path: Option<String>,
    pub visible: bool,
}

/// Partial post edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub content_text: Option<String>,
    pub content_image_path: Option<String>,
    pub visible: Option<bool>,
}

/// An append-only comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub content_text: String,
}

/// Fields required to insert a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    pub content_text: String,
}
