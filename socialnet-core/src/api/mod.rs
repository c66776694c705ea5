//! Service surfaces of the two backends
//!
//! [`UserAndPostApi`] and [`NewsfeedApi`] are implemented three ways: by the
//! in-process services in this module, by the RPC stubs in
//! [`crate::rpc::remote`], and by [`crate::replica::ReplicaSet`], which
//! spreads calls across several implementations of the same trait.

mod newsfeed;
mod types;
mod user_and_post;

pub use newsfeed::NewsfeedService;
pub use types::*;
pub use user_and_post::UserAndPostService;

use crate::rpc::{RpcError, TransportError};
use crate::storage::StoreError;

/// Infrastructure failure of a service call
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote error: {0}")]
    Remote(#[from] RpcError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Wire names of the service methods
pub mod methods {
    pub const CREATE_USER: &str = "create_user";
    pub const EDIT_USER: &str = "edit_user";
    pub const AUTHENTICATE_USER: &str = "authenticate_user";
    pub const FOLLOW: &str = "follow";
    pub const UNFOLLOW: &str = "unfollow";
    pub const GET_FOLLOWER_LIST: &str = "get_follower_list";
    pub const GET_FOLLOWING_LIST: &str = "get_following_list";
    pub const CREATE_POST: &str = "create_post";
    pub const GET_POST: &str = "get_post";
    pub const EDIT_POST: &str = "edit_post";
    pub const DELETE_POST: &str = "delete_post";
    pub const LIKE_POST: &str = "like_post";
    pub const CREATE_POST_COMMENT: &str = "create_post_comment";
    pub const GENERATE_NEWSFEED: &str = "generate_newsfeed";
}

/// Identity and content service: users, posts and the follow graph
pub trait UserAndPostApi: Send + Sync {
    fn create_user(&self, req: CreateUserRequest) -> ServiceResult<CreateUserResponse>;

    fn edit_user(&self, req: EditUserRequest) -> ServiceResult<EditUserStatus>;

    fn authenticate_user(
        &self,
        req: AuthenticateUserRequest,
    ) -> ServiceResult<AuthenticateUserResponse>;

    fn follow(&self, req: FollowRequest) -> ServiceResult<FollowStatus>;

    fn unfollow(&self, req: FollowRequest) -> ServiceResult<UnfollowStatus>;

    fn get_follower_list(&self, req: UserRequest) -> ServiceResult<UserListResponse>;

    fn get_following_list(&self, req: UserRequest) -> ServiceResult<UserListResponse>;

    fn create_post(&self, req: CreatePostRequest) -> ServiceResult<CreatePostResponse>;

    fn get_post(&self, req: PostRequest) -> ServiceResult<GetPostResponse>;

    fn edit_post(&self, req: EditPostRequest) -> ServiceResult<PostStatus>;

    fn delete_post(&self, req: PostRequest) -> ServiceResult<PostStatus>;

    fn like_post(&self, req: LikePostRequest) -> ServiceResult<PostStatus>;

    fn create_post_comment(
        &self,
        req: CreatePostCommentRequest,
    ) -> ServiceResult<CreatePostCommentResponse>;
}

/// Feed-generation service
pub trait NewsfeedApi: Send + Sync {
    fn generate_newsfeed(&self, req: UserRequest) -> ServiceResult<GenerateNewsfeedResponse>;
}
