/*
    social_graph.rs - Service-level tests for the follow graph and posts

    Drives the in-process services over a shared in-memory store:
    - Follow, post, feed and unfollow as one user journey
    - Status outcomes for unknown users and posts
    - Symmetry of the two adjacency tables under random operation sequences
*/

use proptest::prelude::*;
use socialnet_core::api::*;
use socialnet_core::config::{CacheBackend, Config};
use socialnet_core::graph::FollowGraph;
use socialnet_core::metrics::NoopSink;
use socialnet_core::model::{PostId, UserId};
use socialnet_core::newsfeed::NewsfeedGenerator;
use socialnet_core::storage::{SocialStore, SqlSocialStore};
use socialnet_core::test_utils::{assert_follow_symmetry, assert_no_edge, seed_users};
use std::collections::HashSet;
use std::sync::Arc;

struct Services {
    store: Arc<SqlSocialStore>,
    users: UserAndPostService,
    feed: NewsfeedService,
}

fn services() -> Services {
    let store = Arc::new(SqlSocialStore::memory().unwrap());
    let mut config = Config::default();
    config.cache.backend = CacheBackend::Memory;
    let generator =
        NewsfeedGenerator::from_config(&config, store.clone(), Arc::new(NoopSink)).unwrap();

    Services {
        users: UserAndPostService::new(store.clone()),
        feed: NewsfeedService::new(generator),
        store,
    }
}

fn follow(s: &Services, follower: UserId, followee: UserId) -> FollowStatus {
    s.users
        .follow(FollowRequest {
            follower_id: follower,
            followee_id: followee,
        })
        .unwrap()
}

fn create_post(s: &Services, author: UserId, text: &str) -> CreatePostResponse {
    s.users
        .create_post(CreatePostRequest {
            user_id: author,
            content_text: text.to_string(),
            content_image_path: None,
            visible: true,
        })
        .unwrap()
}

/// Scenario:
/// 1. user 1 follows user 2
/// 2. user 2 posts
/// 3. user 1's feed holds exactly that post
/// 4. a repeated follow is rejected
/// 5. after unfollowing, user 2 has no followers
#[test]
fn test_follow_post_feed_unfollow_journey() {
    let s = services();
    let ids = seed_users(s.store.as_ref(), 2);
    let (u1, u2) = (ids[0], ids[1]);

    assert_eq!(follow(&s, u1, u2), FollowStatus::Ok);

    let created = create_post(&s, u2, "hello");
    assert_eq!(created.status, PostStatus::Ok);
    let post_id = created.post_id.unwrap();

    let feed = s.feed.generate_newsfeed(UserRequest { user_id: u1 }).unwrap();
    assert_eq!(feed.status, NewsfeedStatus::Ok);
    assert_eq!(feed.post_ids, vec![post_id]);

    assert_eq!(follow(&s, u1, u2), FollowStatus::AlreadyFollowed);

    let status = s
        .users
        .unfollow(FollowRequest {
            follower_id: u1,
            followee_id: u2,
        })
        .unwrap();
    assert_eq!(status, UnfollowStatus::Ok);

    let followers = s.users.get_follower_list(UserRequest { user_id: u2 }).unwrap();
    assert_eq!(followers.status, ListStatus::Ok);
    assert!(followers.users.is_empty());
    assert_no_edge(s.store.as_ref(), u1, u2);
}

#[test]
fn test_unknown_users_are_reported() {
    let s = services();
    let ids = seed_users(s.store.as_ref(), 1);
    let ghost = UserId(9999);

    assert_eq!(follow(&s, ids[0], ghost), FollowStatus::UserNotFound);
    assert_eq!(follow(&s, ghost, ids[0]), FollowStatus::UserNotFound);

    let unfollow = s
        .users
        .unfollow(FollowRequest {
            follower_id: ghost,
            followee_id: ids[0],
        })
        .unwrap();
    assert_eq!(unfollow, UnfollowStatus::UserNotFound);

    let following = s.users.get_following_list(UserRequest { user_id: ghost }).unwrap();
    assert_eq!(following.status, ListStatus::UserNotFound);
    assert!(following.users.is_empty());

    let feed = s.feed.generate_newsfeed(UserRequest { user_id: ghost }).unwrap();
    assert_eq!(feed.status, NewsfeedStatus::UserNotFound);
    assert!(feed.post_ids.is_empty());

    assert_eq!(create_post(&s, ghost, "nobody").status, PostStatus::UserNotFound);
}

#[test]
fn test_unfollow_without_edge() {
    let s = services();
    let ids = seed_users(s.store.as_ref(), 2);

    let status = s
        .users
        .unfollow(FollowRequest {
            follower_id: ids[0],
            followee_id: ids[1],
        })
        .unwrap();
    assert_eq!(status, UnfollowStatus::NotFollowed);
}

#[test]
fn test_post_lifecycle_with_likes_and_comments() {
    let s = services();
    let ids = seed_users(s.store.as_ref(), 2);
    let (author, reader) = (ids[0], ids[1]);

    let post_id = create_post(&s, author, "first draft").post_id.unwrap();

    let like = LikePostRequest {
        user_id: reader,
        post_id,
    };
    assert_eq!(s.users.like_post(like).unwrap(), PostStatus::Ok);
    // A second like by the same user is accepted but not counted twice
    assert_eq!(s.users.like_post(like).unwrap(), PostStatus::Ok);

    let comment = s
        .users
        .create_post_comment(CreatePostCommentRequest {
            user_id: reader,
            post_id,
            content_text: "nice".to_string(),
        })
        .unwrap();
    assert_eq!(comment.status, PostStatus::Ok);
    assert!(comment.comment_id.is_some());

    let edit = s
        .users
        .edit_post(EditPostRequest {
            post_id,
            update: socialnet_core::model::PostUpdate {
                content_text: Some("final".to_string()),
                ..Default::default()
            },
        })
        .unwrap();
    assert_eq!(edit, PostStatus::Ok);

    let fetched = s.users.get_post(PostRequest { post_id }).unwrap();
    assert_eq!(fetched.status, PostStatus::Ok);
    let detail = fetched.detail.unwrap();
    assert_eq!(detail.post.content_text, "final");
    assert_eq!(detail.like_count, 1);
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].content_text, "nice");

    assert_eq!(s.users.delete_post(PostRequest { post_id }).unwrap(), PostStatus::Ok);
    assert_eq!(
        s.users.delete_post(PostRequest { post_id }).unwrap(),
        PostStatus::PostNotFound
    );
    assert_eq!(
        s.users.get_post(PostRequest { post_id }).unwrap().status,
        PostStatus::PostNotFound
    );
}

#[test]
fn test_like_checks_user_before_post() {
    let s = services();
    let status = s
        .users
        .like_post(LikePostRequest {
            user_id: UserId(404),
            post_id: PostId(404),
        })
        .unwrap();
    assert_eq!(status, PostStatus::UserNotFound);

    let ids = seed_users(s.store.as_ref(), 1);
    let status = s
        .users
        .like_post(LikePostRequest {
            user_id: ids[0],
            post_id: PostId(404),
        })
        .unwrap();
    assert_eq!(status, PostStatus::PostNotFound);
}

#[test]
fn test_account_lifecycle() {
    let s = services();
    let req = socialnet_core::test_utils::create_user_request("alice", "s3cret");

    let created = s.users.create_user(req.clone()).unwrap();
    assert_eq!(created.status, CreateUserStatus::Ok);
    let user_id = created.user.unwrap().user_id;

    let duplicate = s.users.create_user(req).unwrap();
    assert_eq!(duplicate.status, CreateUserStatus::UsernameTaken);

    let login = |password: &str| {
        s.users
            .authenticate_user(AuthenticateUserRequest {
                username: "alice".to_string(),
                password: password.to_string(),
            })
            .unwrap()
    };

    let ok = login("s3cret");
    assert_eq!(ok.status, AuthenticateStatus::Ok);
    assert_eq!(ok.user_id, Some(user_id));
    assert_eq!(login("wrong").status, AuthenticateStatus::WrongPassword);

    let edited = s
        .users
        .edit_user(EditUserRequest {
            user_id,
            first_name: Some("Alicia".to_string()),
            last_name: None,
            date_of_birth: None,
            password: Some("n3w".to_string()),
        })
        .unwrap();
    assert_eq!(edited, EditUserStatus::Ok);
    assert_eq!(login("s3cret").status, AuthenticateStatus::WrongPassword);
    assert_eq!(login("n3w").status, AuthenticateStatus::Ok);

    let missing = s
        .users
        .authenticate_user(AuthenticateUserRequest {
            username: "bob".to_string(),
            password: "x".to_string(),
        })
        .unwrap();
    assert_eq!(missing.status, AuthenticateStatus::UserNotFound);
    assert_eq!(missing.user_id, None);
}

const GRAPH_USERS: usize = 4;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Property: the follower and following tables always mirror each other,
    // and match a plain set of edges driven by the same operations
    #[test]
    fn prop_follow_tables_stay_symmetric(
        ops in prop::collection::vec((0..GRAPH_USERS, 0..GRAPH_USERS, any::<bool>()), 0..40),
    ) {
        let store = Arc::new(SqlSocialStore::memory().unwrap());
        let ids = seed_users(store.as_ref(), GRAPH_USERS);
        let graph = FollowGraph::new(store.clone());
        let mut model: HashSet<(UserId, UserId)> = HashSet::new();

        for (a, b, is_follow) in ops {
            let (follower, followee) = (ids[a], ids[b]);
            if is_follow {
                let status = graph.follow(follower, followee).unwrap();
                let expected = if model.insert((follower, followee)) {
                    FollowStatus::Ok
                } else {
                    FollowStatus::AlreadyFollowed
                };
                prop_assert_eq!(status, expected);
            } else {
                let status = graph.unfollow(follower, followee).unwrap();
                let expected = if model.remove(&(follower, followee)) {
                    UnfollowStatus::Ok
                } else {
                    UnfollowStatus::NotFollowed
                };
                prop_assert_eq!(status, expected);
            }
        }

        assert_follow_symmetry(store.as_ref(), &ids);

        for &user in &ids {
            let actual: HashSet<UserId> = store.following_ids(user).unwrap().into_iter().collect();
            let expected: HashSet<UserId> = model
                .iter()
                .filter(|(f, _)| *f == user)
                .map(|(_, e)| *e)
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
