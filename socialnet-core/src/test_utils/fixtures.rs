//! Test fixtures for creating common test objects

use crate::api::CreateUserRequest;
use crate::model::{NewPost, NewUser, UserId};
use crate::storage::{SocialStore, UserInsert};
use chrono::NaiveDate;

/// Registration request with fixed profile fields
pub fn create_user_request(username: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        first_name: "Test".to_string(),
        last_name: username.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
        email: format!("{}@example.com", username),
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// User row with placeholder credentials, for tests that never log in
pub fn new_user(username: &str) -> NewUser {
    NewUser {
        hashed_password: "not-a-real-hash".to_string(),
        salt: "not-a-real-salt".to_string(),
        first_name: "Test".to_string(),
        last_name: username.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
        email: format!("{}@example.com", username),
        username: username.to_string(),
    }
}

pub fn new_post(author: UserId, text: &str) -> NewPost {
    NewPost {
        user_id: author,
        content_text: text.to_string(),
        content_image_path: None,
        visible: true,
    }
}

/// Insert `count` users named `user1`, `user2`, ... and return their ids
///
/// Panics if the store fails or a name is already taken.
pub fn seed_users(store: &dyn SocialStore, count: usize) -> Vec<UserId> {
    (1..=count)
        .map(|n| {
            let username = format!("user{}", n);
            match store.insert_user(&new_user(&username)) {
                Ok(UserInsert::Created(user)) => user.id,
                Ok(UserInsert::UsernameTaken) => panic!("username {} already taken", username),
                Err(e) => panic!("failed to seed {}: {}", username, e),
            }
        })
        .collect()
}
