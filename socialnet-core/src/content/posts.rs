use crate::api::{
    CreatePostCommentRequest, CreatePostCommentResponse, CreatePostRequest, CreatePostResponse,
    EditPostRequest, GetPostResponse, LikePostRequest, PostDetail, PostStatus,
};
use crate::model::{NewComment, NewPost, PostId, UserId};
use crate::storage::{SocialStore, StoreError, WriteOutcome};
use std::sync::Arc;
use tracing::{debug, info};

/// Posts with their likes and comments
///
/// When a request names both a user and a post, an unknown user is
/// reported before an unknown post.
pub struct PostManager {
    store: Arc<dyn SocialStore>,
}

impl PostManager {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    pub fn create_post(&self, req: CreatePostRequest) -> Result<CreatePostResponse, StoreError> {
        if !self.store.user_exists(req.user_id)? {
            debug!(user_id = %req.user_id, "create post: user not found");
            return Ok(CreatePostResponse {
                status: PostStatus::UserNotFound,
                post_id: None,
            });
        }

        let post = self.store.insert_post(&NewPost {
            user_id: req.user_id,
            content_text: req.content_text,
            content_image_path: req.content_image_path,
            visible: req.visible,
        })?;
        info!(post_id = %post.id, user_id = %post.user_id, "post created");

        Ok(CreatePostResponse {
            status: PostStatus::Ok,
            post_id: Some(post.id),
        })
    }

    pub fn get_post(&self, post_id: PostId) -> Result<GetPostResponse, StoreError> {
        let Some(post) = self.store.get_post(post_id)? else {
            return Ok(GetPostResponse {
                status: PostStatus::PostNotFound,
                detail: None,
            });
        };

        let like_count = self.store.like_count(post_id)?;
        let comments = self.store.comments(post_id)?;

        Ok(GetPostResponse {
            status: PostStatus::Ok,
            detail: Some(PostDetail {
                post,
                like_count,
                comments,
            }),
        })
    }

    pub fn edit_post(&self, req: EditPostRequest) -> Result<PostStatus, StoreError> {
        let Some(mut post) = self.store.get_post(req.post_id)? else {
            debug!(post_id = %req.post_id, "edit post: post not found");
            return Ok(PostStatus::PostNotFound);
        };

        post.apply(req.update);
        self.store.update_post(&post)?;
        info!(post_id = %post.id, "post updated");

        Ok(PostStatus::Ok)
    }

    pub fn delete_post(&self, post_id: PostId) -> Result<PostStatus, StoreError> {
        match self.store.delete_post(post_id)? {
            WriteOutcome::Applied => {
                info!(%post_id, "post deleted");
                Ok(PostStatus::Ok)
            }
            WriteOutcome::Unchanged => {
                debug!(%post_id, "delete post: post not found");
                Ok(PostStatus::PostNotFound)
            }
        }
    }

    /// Liking a post twice leaves a single like and still reports `Ok`
    pub fn like_post(&self, req: LikePostRequest) -> Result<PostStatus, StoreError> {
        if let Some(status) = self.check_user_and_post(req.user_id, req.post_id)? {
            return Ok(status);
        }

        if self.store.insert_like(req.user_id, req.post_id)? == WriteOutcome::Unchanged {
            debug!(user_id = %req.user_id, post_id = %req.post_id, "like post: already liked");
        }

        Ok(PostStatus::Ok)
    }

    pub fn create_post_comment(
        &self,
        req: CreatePostCommentRequest,
    ) -> Result<CreatePostCommentResponse, StoreError> {
        if let Some(status) = self.check_user_and_post(req.user_id, req.post_id)? {
            return Ok(CreatePostCommentResponse {
                status,
                comment_id: None,
            });
        }

        let comment = self.store.insert_comment(&NewComment {
            post_id: req.post_id,
            user_id: req.user_id,
            content_text: req.content_text,
        })?;
        info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");

        Ok(CreatePostCommentResponse {
            status: PostStatus::Ok,
            comment_id: Some(comment.id),
        })
    }

    fn check_user_and_post(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<PostStatus>, StoreError> {
        if !self.store.user_exists(user_id)? {
            return Ok(Some(PostStatus::UserNotFound));
        }
        if self.store.get_post(post_id)?.is_none() {
            return Ok(Some(PostStatus::PostNotFound));
        }
        Ok(None)
    }
}
