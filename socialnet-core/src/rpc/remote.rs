//! Client stubs implementing the service traits over RPC

use super::client::{DialOptions, RpcClient};
use super::protocol::TransportError;
use crate::api::*;

/// [`UserAndPostApi`] served by a remote process
#[derive(Debug)]
pub struct RemoteUserAndPost {
    client: RpcClient,
}

impl RemoteUserAndPost {
    pub fn dial(addr: &str, options: &DialOptions) -> Result<Self, TransportError> {
        Ok(Self {
            client: RpcClient::dial(addr, options)?,
        })
    }

    pub fn addr(&self) -> &str {
        self.client.addr()
    }
}

impl UserAndPostApi for RemoteUserAndPost {
    fn create_user(&self, req: CreateUserRequest) -> ServiceResult<CreateUserResponse> {
        self.client.call(methods::CREATE_USER, &req)
    }

    fn edit_user(&self, req: EditUserRequest) -> ServiceResult<EditUserStatus> {
        self.client.call(methods::EDIT_USER, &req)
    }

    fn authenticate_user(
        &self,
        req: AuthenticateUserRequest,
    ) -> ServiceResult<AuthenticateUserResponse> {
        self.client.call(methods::AUTHENTICATE_USER, &req)
    }

    fn follow(&self, req: FollowRequest) -> ServiceResult<FollowStatus> {
        self.client.call(methods::FOLLOW, &req)
    }

    fn unfollow(&self, req: FollowRequest) -> ServiceResult<UnfollowStatus> {
        self.client.call(methods::UNFOLLOW, &req)
    }

    fn get_follower_list(&self, req: UserRequest) -> ServiceResult<UserListResponse> {
        self.client.call(methods::GET_FOLLOWER_LIST, &req)
    }

    fn get_following_list(&self, req: UserRequest) -> ServiceResult<UserListResponse> {
        self.client.call(methods::GET_FOLLOWING_LIST, &req)
    }

    fn create_post(&self, req: CreatePostRequest) -> ServiceResult<CreatePostResponse> {
        self.client.call(methods::CREATE_POST, &req)
    }

    fn get_post(&self, req: PostRequest) -> ServiceResult<GetPostResponse> {
        self.client.call(methods::GET_POST, &req)
    }

    fn edit_post(&self, req: EditPostRequest) -> ServiceResult<PostStatus> {
        self.client.call(methods::EDIT_POST, &req)
    }

    fn delete_post(&self, req: PostRequest) -> ServiceResult<PostStatus> {
        self.client.call(methods::DELETE_POST, &req)
    }

    fn like_post(&self, req: LikePostRequest) -> ServiceResult<PostStatus> {
        self.client.call(methods::LIKE_POST, &req)
    }

    fn create_post_comment(
        &self,
        req: CreatePostCommentRequest,
    ) -> ServiceResult<CreatePostCommentResponse> {
        self.client.call(methods::CREATE_POST_COMMENT, &req)
    }
}

/// [`NewsfeedApi`] served by a remote process
#[derive(Debug)]
pub struct RemoteNewsfeed {
    client: RpcClient,
}

impl RemoteNewsfeed {
    pub fn dial(addr: &str, options: &DialOptions) -> Result<Self, TransportError> {
        Ok(Self {
            client: RpcClient::dial(addr, options)?,
        })
    }

    pub fn addr(&self) -> &str {
        self.client.addr()
    }
}

impl NewsfeedApi for RemoteNewsfeed {
    fn generate_newsfeed(&self, req: UserRequest) -> ServiceResult<GenerateNewsfeedResponse> {
        self.client.call(methods::GENERATE_NEWSFEED, &req)
    }
}
