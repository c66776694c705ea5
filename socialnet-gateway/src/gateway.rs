//! Command handlers translating gateway requests into service calls
//!
//! Every handler makes exactly one service call and turns the returned
//! status into either a [`Reply`] or a [`GatewayError`]. The gateway holds
//! no state between commands.

use crate::error::{GatewayError, GatewayResult};
use crate::session::Session;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use socialnet_core::api::*;
use socialnet_core::model::{PostId, PostUpdate, UserId};
use tracing::debug;

/// Body printed for a successful command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Message { message: String },
    Data(Value),
}

impl Reply {
    pub fn message(message: impl Into<String>) -> Self {
        Reply::Message {
            message: message.into(),
        }
    }

    pub fn data<T: Serialize>(value: &T) -> GatewayResult<Self> {
        Ok(Reply::Data(serde_json::to_value(value)?))
    }
}

/// Registration fields
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Profile fields to change; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub password: Option<String>,
}

/// New post fields
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub content_text: String,
    pub content_image_path: Option<String>,
    pub visible: bool,
}

/// Front end over the two services
pub struct Gateway<U, N> {
    users: U,
    feed: N,
}

impl<U: UserAndPostApi, N: NewsfeedApi> Gateway<U, N> {
    pub fn new(users: U, feed: N) -> Self {
        Self { users, feed }
    }

    pub fn create_user(&self, registration: Registration) -> GatewayResult<Reply> {
        let response = self.users.create_user(CreateUserRequest {
            first_name: registration.first_name,
            last_name: registration.last_name,
            date_of_birth: registration.date_of_birth,
            email: registration.email,
            username: registration.username,
            password: registration.password,
        })?;

        match (response.status, response.user) {
            (CreateUserStatus::Ok, Some(user)) => Ok(Reply::message(format!(
                "Successfully created user with id: {}",
                user.user_id
            ))),
            (CreateUserStatus::Ok, None) => Err(GatewayError::bad_request("user not created")),
            (CreateUserStatus::UsernameTaken, _) => {
                Err(GatewayError::bad_request("username already taken"))
            }
        }
    }

    /// Check credentials; on success the reply carries the session id
    pub fn login(&self, username: &str, password: &str) -> GatewayResult<Reply> {
        let response = self.users.authenticate_user(AuthenticateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;

        match (response.status, response.user_id) {
            (AuthenticateStatus::Ok, Some(user_id)) => {
                debug!(%user_id, "login succeeded");
                Reply::data(&serde_json::json!({ "message": "ok", "session": user_id }))
            }
            (AuthenticateStatus::Ok, None) | (AuthenticateStatus::UserNotFound, _) => {
                Err(GatewayError::bad_request("not found"))
            }
            (AuthenticateStatus::WrongPassword, _) => {
                Err(GatewayError::bad_request("wrong password"))
            }
        }
    }

    pub fn edit_user(&self, session: &Session, edit: ProfileEdit) -> GatewayResult<Reply> {
        let user_id = session.require()?;
        let status = self.users.edit_user(EditUserRequest {
            user_id,
            first_name: edit.first_name,
            last_name: edit.last_name,
            date_of_birth: edit.date_of_birth,
            password: edit.password,
        })?;

        match status {
            EditUserStatus::Ok => Ok(Reply::message(format!(
                "Successfully edited user with id: {}",
                user_id
            ))),
            EditUserStatus::UserNotFound => Err(GatewayError::bad_request("user not found")),
        }
    }

    pub fn follow(&self, session: &Session, followee_id: UserId) -> GatewayResult<Reply> {
        let follower_id = session.require()?;
        let status = self.users.follow(FollowRequest {
            follower_id,
            followee_id,
        })?;

        match status {
            FollowStatus::Ok => Ok(Reply::message("follow user successfully")),
            FollowStatus::AlreadyFollowed => Ok(Reply::message("user already followed")),
            FollowStatus::UserNotFound => Err(GatewayError::bad_request("user not found")),
        }
    }

    pub fn unfollow(&self, session: &Session, followee_id: UserId) -> GatewayResult<Reply> {
        let follower_id = session.require()?;
        let status = self.users.unfollow(FollowRequest {
            follower_id,
            followee_id,
        })?;

        match status {
            UnfollowStatus::Ok => Ok(Reply::message("unfollow user successfully")),
            UnfollowStatus::NotFollowed => Ok(Reply::message("user not followed")),
            UnfollowStatus::UserNotFound => Err(GatewayError::bad_request("user not found")),
        }
    }

    /// Followers of `user_id`, or of the session user when omitted
    pub fn followers(&self, session: &Session, user_id: Option<UserId>) -> GatewayResult<Reply> {
        let user_id = Self::target(session, user_id)?;
        let response = self.users.get_follower_list(UserRequest { user_id })?;
        Self::user_list(response)
    }

    /// Users `user_id` follows, or the session user when omitted
    pub fn following(&self, session: &Session, user_id: Option<UserId>) -> GatewayResult<Reply> {
        let user_id = Self::target(session, user_id)?;
        let response = self.users.get_following_list(UserRequest { user_id })?;
        Self::user_list(response)
    }

    pub fn create_post(&self, session: &Session, draft: PostDraft) -> GatewayResult<Reply> {
        let user_id = session.require()?;
        let response = self.users.create_post(CreatePostRequest {
            user_id,
            content_text: draft.content_text,
            content_image_path: draft.content_image_path,
            visible: draft.visible,
        })?;

        match (response.status, response.post_id) {
            (PostStatus::Ok, Some(post_id)) => Ok(Reply::message(format!(
                "create post successfully with id: {}",
                post_id
            ))),
            (PostStatus::UserNotFound, _) => Err(GatewayError::bad_request("user not found")),
            _ => Err(GatewayError::bad_request("post not created")),
        }
    }

    pub fn get_post(&self, post_id: PostId) -> GatewayResult<Reply> {
        let response = self.users.get_post(PostRequest { post_id })?;
        match (response.status, response.detail) {
            (PostStatus::Ok, Some(detail)) => Reply::data(&detail),
            _ => Err(GatewayError::bad_request("post not found")),
        }
    }

    pub fn edit_post(
        &self,
        session: &Session,
        post_id: PostId,
        update: PostUpdate,
    ) -> GatewayResult<Reply> {
        session.require()?;
        let status = self.users.edit_post(EditPostRequest { post_id, update })?;
        Self::post_status(status, format!("edit post successfully with id: {}", post_id))
    }

    pub fn delete_post(&self, session: &Session, post_id: PostId) -> GatewayResult<Reply> {
        session.require()?;
        let status = self.users.delete_post(PostRequest { post_id })?;
        Self::post_status(status, format!("delete post successfully with id: {}", post_id))
    }

    pub fn like_post(&self, session: &Session, post_id: PostId) -> GatewayResult<Reply> {
        let user_id = session.require()?;
        let status = self.users.like_post(LikePostRequest { user_id, post_id })?;
        Self::post_status(status, format!("like post successfully with id: {}", post_id))
    }

    pub fn comment_post(
        &self,
        session: &Session,
        post_id: PostId,
        content_text: String,
    ) -> GatewayResult<Reply> {
        let user_id = session.require()?;
        let response = self.users.create_post_comment(CreatePostCommentRequest {
            user_id,
            post_id,
            content_text,
        })?;

        match (response.status, response.comment_id) {
            (PostStatus::Ok, Some(comment_id)) => Ok(Reply::message(format!(
                "create comment successfully with id: {}",
                comment_id
            ))),
            (PostStatus::UserNotFound, _) => Err(GatewayError::bad_request("user not found")),
            (PostStatus::PostNotFound, _) => Err(GatewayError::bad_request("post not found")),
            (PostStatus::Ok, None) => Err(GatewayError::bad_request("comment not created")),
        }
    }

    /// Feed of `user_id`, or of the session user when omitted
    pub fn newsfeed(&self, session: &Session, user_id: Option<UserId>) -> GatewayResult<Reply> {
        let user_id = Self::target(session, user_id)?;
        let response = self.feed.generate_newsfeed(UserRequest { user_id })?;

        match response.status {
            NewsfeedStatus::Ok => Reply::data(&response.post_ids),
            NewsfeedStatus::UserNotFound => Err(GatewayError::bad_request("user not found")),
        }
    }

    fn target(session: &Session, user_id: Option<UserId>) -> GatewayResult<UserId> {
        match user_id {
            Some(user_id) => Ok(user_id),
            None => session.require(),
        }
    }

    fn user_list(response: UserListResponse) -> GatewayResult<Reply> {
        match response.status {
            ListStatus::Ok => Reply::data(&response.users),
            ListStatus::UserNotFound => Err(GatewayError::bad_request("user not found")),
        }
    }

    fn post_status(status: PostStatus, success: String) -> GatewayResult<Reply> {
        match status {
            PostStatus::Ok => Ok(Reply::message(success)),
            PostStatus::UserNotFound => Err(GatewayError::bad_request("user not found")),
            PostStatus::PostNotFound => Err(GatewayError::bad_request("post not found")),
        }
    }
}
