//! Custom assertions for tests

use crate::model::UserId;
use crate::storage::SocialStore;

/// Assert that every follow edge among `users` is recorded on both sides
///
/// For each user `a`: every `b` in `following(a)` lists `a` among its
/// followers, and every follower `f` of `a` lists `a` in its following set.
pub fn assert_follow_symmetry(store: &dyn SocialStore, users: &[UserId]) {
    for &a in users {
        let following = store
            .following_ids(a)
            .unwrap_or_else(|e| panic!("following({}) failed: {}", a, e));
        for b in following {
            let followers = store
                .followers(b)
                .unwrap_or_else(|e| panic!("followers({}) failed: {}", b, e));
            assert!(
                followers.iter().any(|f| f.user_id == a),
                "{} follows {} but is missing from its followers",
                a,
                b
            );
        }

        let followers = store
            .followers(a)
            .unwrap_or_else(|e| panic!("followers({}) failed: {}", a, e));
        for f in followers {
            let following = store
                .following_ids(f.user_id)
                .unwrap_or_else(|e| panic!("following({}) failed: {}", f.user_id, e));
            assert!(
                following.contains(&a),
                "{} is listed as a follower of {} but does not follow it",
                f.user_id,
                a
            );
        }
    }
}

/// Assert that `follower -> followee` exists on neither side
pub fn assert_no_edge(store: &dyn SocialStore, follower: UserId, followee: UserId) {
    let following = store
        .following_ids(follower)
        .unwrap_or_else(|e| panic!("following({}) failed: {}", follower, e));
    assert!(!following.contains(&followee), "{} still follows {}", follower, followee);

    let followers = store
        .followers(followee)
        .unwrap_or_else(|e| panic!("followers({}) failed: {}", followee, e));
    assert!(
        followers.iter().all(|f| f.user_id != follower),
        "{} still listed as a follower of {}",
        follower,
        followee
    );
}
