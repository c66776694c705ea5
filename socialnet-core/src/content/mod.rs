//! Users and posts
//!
//! Registration, credential checks and profile edits live in
//! [`UserManager`]; posts with their likes and comments in [`PostManager`].

mod posts;
mod users;

pub use posts::PostManager;
pub use users::UserManager;
