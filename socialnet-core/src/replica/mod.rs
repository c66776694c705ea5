//! Replica-selection client
//!
//! A [`ReplicaSet`] holds one client per configured host and forwards each
//! call to a replica chosen by its [`ReplicaSelector`]. The set is fixed at
//! construction; there is no health tracking, stickiness or retry, and a
//! failing replica's transport error reaches the caller unchanged.

use crate::api::*;
use crate::rpc::{DialOptions, RemoteNewsfeed, RemoteUserAndPost, TransportError};
use rand::Rng;
use tracing::{info, trace};

#[derive(Debug, thiserror::Error)]
pub enum ReplicaError {
    #[error("No replica hosts configured")]
    Empty,

    #[error("Failed to dial replica {host}: {source}")]
    Dial {
        host: String,
        #[source]
        source: TransportError,
    },
}

/// Strategy choosing which replica serves a call
pub trait ReplicaSelector: Send + Sync {
    /// Index in `0..len`. `len` is never zero.
    fn select(&self, len: usize) -> usize;
}

/// Uniformly random choice, independent per call
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl ReplicaSelector for RandomSelector {
    fn select(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Immutable set of interchangeable replicas
pub struct ReplicaSet<C> {
    replicas: Vec<C>,
    selector: Box<dyn ReplicaSelector>,
}

impl<C> ReplicaSet<C> {
    /// Dial every host, failing on an empty list or on the first host that
    /// cannot be reached
    pub fn connect<F>(hosts: &[String], mut dial: F) -> Result<Self, ReplicaError>
    where
        F: FnMut(&str) -> Result<C, TransportError>,
    {
        if hosts.is_empty() {
            return Err(ReplicaError::Empty);
        }

        let mut replicas = Vec::with_capacity(hosts.len());
        for host in hosts {
            let replica = dial(host).map_err(|source| ReplicaError::Dial {
                host: host.clone(),
                source,
            })?;
            replicas.push(replica);
        }

        info!(replicas = replicas.len(), hosts = ?hosts, "replica set connected");
        Self::from_replicas(replicas)
    }

    pub fn from_replicas(replicas: Vec<C>) -> Result<Self, ReplicaError> {
        if replicas.is_empty() {
            return Err(ReplicaError::Empty);
        }

        Ok(Self {
            replicas,
            selector: Box::new(RandomSelector),
        })
    }

    pub fn with_selector(mut self, selector: impl ReplicaSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Replica for the next call
    pub fn pick(&self) -> &C {
        let index = self.selector.select(self.replicas.len()) % self.replicas.len();
        trace!(replica = index, "replica selected");
        &self.replicas[index]
    }
}

impl ReplicaSet<RemoteUserAndPost> {
    pub fn dial_user_and_post(hosts: &[String], options: &DialOptions) -> Result<Self, ReplicaError> {
        Self::connect(hosts, |host| RemoteUserAndPost::dial(host, options))
    }
}

impl ReplicaSet<RemoteNewsfeed> {
    pub fn dial_newsfeed(hosts: &[String], options: &DialOptions) -> Result<Self, ReplicaError> {
        Self::connect(hosts, |host| RemoteNewsfeed::dial(host, options))
    }
}

impl<C: UserAndPostApi> UserAndPostApi for ReplicaSet<C> {
    fn create_user(&self, req: CreateUserRequest) -> ServiceResult<CreateUserResponse> {
        self.pick().create_user(req)
    }

    fn edit_user(&self, req: EditUserRequest) -> ServiceResult<EditUserStatus> {
        self.pick().edit_user(req)
    }

    fn authenticate_user(
        &self,
        req: AuthenticateUserRequest,
    ) -> ServiceResult<AuthenticateUserResponse> {
        self.pick().authenticate_user(req)
    }

    fn follow(&self, req: FollowRequest) -> ServiceResult<FollowStatus> {
        self.pick().follow(req)
    }

    fn unfollow(&self, req: FollowRequest) -> ServiceResult<UnfollowStatus> {
        self.pick().unfollow(req)
    }

    fn get_follower_list(&self, req: UserRequest) -> ServiceResult<UserListResponse> {
        self.pick().get_follower_list(req)
    }

    fn get_following_list(&self, req: UserRequest) -> ServiceResult<UserListResponse> {
        self.pick().get_following_list(req)
    }

    fn create_post(&self, req: CreatePostRequest) -> ServiceResult<CreatePostResponse> {
        self.pick().create_post(req)
    }

    fn get_post(&self, req: PostRequest) -> ServiceResult<GetPostResponse> {
        self.pick().get_post(req)
    }

    fn edit_post(&self, req: EditPostRequest) -> ServiceResult<PostStatus> {
        self.pick().edit_post(req)
    }

    fn delete_post(&self, req: PostRequest) -> ServiceResult<PostStatus> {
        self.pick().delete_post(req)
    }

    fn like_post(&self, req: LikePostRequest) -> ServiceResult<PostStatus> {
        self.pick().like_post(req)
    }

    fn create_post_comment(
        &self,
        req: CreatePostCommentRequest,
    ) -> ServiceResult<CreatePostCommentResponse> {
        self.pick().create_post_comment(req)
    }
}

impl<C: NewsfeedApi> NewsfeedApi for ReplicaSet<C> {
    fn generate_newsfeed(&self, req: UserRequest) -> ServiceResult<GenerateNewsfeedResponse> {
        self.pick().generate_newsfeed(req)
    }
}
