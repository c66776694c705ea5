use super::*;
use crate::content::{PostManager, UserManager};
use crate::graph::FollowGraph;
use crate::storage::SocialStore;
use std::sync::Arc;

/// In-process user-and-post service over a relational store
pub struct UserAndPostService {
    users: UserManager,
    posts: PostManager,
    graph: FollowGraph,
}

impl UserAndPostService {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self {
            users: UserManager::new(store.clone()),
            posts: PostManager::new(store.clone()),
            graph: FollowGraph::new(store),
        }
    }
}

impl UserAndPostApi for UserAndPostService {
    fn create_user(&self, req: CreateUserRequest) -> ServiceResult<CreateUserResponse> {
        self.users.create_user(req)
    }

    fn edit_user(&self, req: EditUserRequest) -> ServiceResult<EditUserStatus> {
        self.users.edit_user(req)
    }

    fn authenticate_user(
        &self,
        req: AuthenticateUserRequest,
    ) -> ServiceResult<AuthenticateUserResponse> {
        self.users.authenticate_user(req)
    }

    fn follow(&self, req: FollowRequest) -> ServiceResult<FollowStatus> {
        Ok(self.graph.follow(req.follower_id, req.followee_id)?)
    }

    fn unfollow(&self, req: FollowRequest) -> ServiceResult<UnfollowStatus> {
        Ok(self.graph.unfollow(req.follower_id, req.followee_id)?)
    }

    fn get_follower_list(&self, req: UserRequest) -> ServiceResult<UserListResponse> {
        Ok(self.graph.list_followers(req.user_id)?)
    }

    fn get_following_list(&self, req: UserRequest) -> ServiceResult<UserListResponse> {
        Ok(self.graph.list_following(req.user_id)?)
    }

    fn create_post(&self, req: CreatePostRequest) -> ServiceResult<CreatePostResponse> {
        Ok(self.posts.create_post(req)?)
    }

    fn get_post(&self, req: PostRequest) -> ServiceResult<GetPostResponse> {
        Ok(self.posts.get_post(req.post_id)?)
    }

    fn edit_post(&self, req: EditPostRequest) -> ServiceResult<PostStatus> {
        Ok(self.posts.edit_post(req)?)
    }

    fn delete_post(&self, req: PostRequest) -> ServiceResult<PostStatus> {
        Ok(self.posts.delete_post(req.post_id)?)
    }

    fn like_post(&self, req: LikePostRequest) -> ServiceResult<PostStatus> {
        Ok(self.posts.like_post(req)?)
    }

    fn create_post_comment(
        &self,
        req: CreatePostCommentRequest,
    ) -> ServiceResult<CreatePostCommentResponse> {
        Ok(self.posts.create_post_comment(req)?)
    }
}
