//! Test doubles for the store, cache and clock

use crate::cache::{CacheError, CacheStore, Clock};
use crate::model::{
    Comment, NewComment, NewPost, NewUser, Post, PostId, User, UserId, UserSummary,
};
use crate::storage::{SocialStore, StoreError, UserInsert, WriteOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Store wrapper counting every call that reaches it
pub struct CountingStore {
    inner: Arc<dyn SocialStore>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn SocialStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    fn inner(&self) -> &dyn SocialStore {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.as_ref()
    }
}

impl SocialStore for CountingStore {
    fn insert_user(&self, user: &NewUser) -> Result<UserInsert, StoreError> {
        self.inner().insert_user(user)
    }

    fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        self.inner().get_user(user_id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.inner().find_user_by_username(username)
    }

    fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner().update_user(user)
    }

    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError> {
        self.inner().user_exists(user_id)
    }

    fn following_ids(&self, user_id: UserId) -> Result<Vec<UserId>, StoreError> {
        self.inner().following_ids(user_id)
    }

    fn following(&self, user_id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        self.inner().following(user_id)
    }

    fn followers(&self, user_id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        self.inner().followers(user_id)
    }

    fn insert_follow(
        &self,
        follower: UserId,
        followee: UserId,
    ) -> Result<WriteOutcome, StoreError> {
        self.inner().insert_follow(follower, followee)
    }

    fn delete_follow(
        &self,
        follower: UserId,
        followee: UserId,
    ) -> Result<WriteOutcome, StoreError> {
        self.inner().delete_follow(follower, followee)
    }

    fn followee_post_ids(&self, user_id: UserId) -> Result<Vec<PostId>, StoreError> {
        self.inner().followee_post_ids(user_id)
    }

    fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        self.inner().insert_post(post)
    }

    fn get_post(&self, post_id: PostId) -> Result<Option<Post>, StoreError> {
        self.inner().get_post(post_id)
    }

    fn update_post(&self, post: &Post) -> Result<(), StoreError> {
        self.inner().update_post(post)
    }

    fn delete_post(&self, post_id: PostId) -> Result<WriteOutcome, StoreError> {
        self.inner().delete_post(post_id)
    }

    fn insert_like(&self, user_id: UserId, post_id: PostId) -> Result<WriteOutcome, StoreError> {
        self.inner().insert_like(user_id, post_id)
    }

    fn like_count(&self, post_id: PostId) -> Result<u64, StoreError> {
        self.inner().like_count(post_id)
    }

    fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        self.inner().insert_comment(comment)
    }

    fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        self.inner().comments(post_id)
    }
}

/// Store whose every call fails
pub struct UnavailableStore;

impl UnavailableStore {
    fn fail<T>() -> Result<T, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

impl SocialStore for UnavailableStore {
    fn insert_user(&self, _user: &NewUser) -> Result<UserInsert, StoreError> {
        Self::fail()
    }

    fn get_user(&self, _user_id: UserId) -> Result<Option<User>, StoreError> {
        Self::fail()
    }

    fn find_user_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
        Self::fail()
    }

    fn update_user(&self, _user: &User) -> Result<(), StoreError> {
        Self::fail()
    }

    fn user_exists(&self, _user_id: UserId) -> Result<bool, StoreError> {
        Self::fail()
    }

    fn following_ids(&self, _user_id: UserId) -> Result<Vec<UserId>, StoreError> {
        Self::fail()
    }

    fn following(&self, _user_id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        Self::fail()
    }

    fn followers(&self, _user_id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        Self::fail()
    }

    fn insert_follow(&self, _a: UserId, _b: UserId) -> Result<WriteOutcome, StoreError> {
        Self::fail()
    }

    fn delete_follow(&self, _a: UserId, _b: UserId) -> Result<WriteOutcome, StoreError> {
        Self::fail()
    }

    fn followee_post_ids(&self, _user_id: UserId) -> Result<Vec<PostId>, StoreError> {
        Self::fail()
    }

    fn insert_post(&self, _post: &NewPost) -> Result<Post, StoreError> {
        Self::fail()
    }

    fn get_post(&self, _post_id: PostId) -> Result<Option<Post>, StoreError> {
        Self::fail()
    }

    fn update_post(&self, _post: &Post) -> Result<(), StoreError> {
        Self::fail()
    }

    fn delete_post(&self, _post_id: PostId) -> Result<WriteOutcome, StoreError> {
        Self::fail()
    }

    fn insert_like(&self, _user_id: UserId, _post_id: PostId) -> Result<WriteOutcome, StoreError> {
        Self::fail()
    }

    fn like_count(&self, _post_id: PostId) -> Result<u64, StoreError> {
        Self::fail()
    }

    fn insert_comment(&self, _comment: &NewComment) -> Result<Comment, StoreError> {
        Self::fail()
    }

    fn comments(&self, _post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        Self::fail()
    }
}

/// Cache backend that rejects every operation
#[derive(Default)]
pub struct FailingCache {
    attempts: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations attempted so far
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

impl CacheStore for FailingCache {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.fail()
    }

    fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        self.fail()
    }

    fn delete(&self, _key: &str) -> Result<(), CacheError> {
        self.fail()
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.start + offset
    }
}
