//! Data model shared by the services
//!
//! Users, posts, comments and the identifiers that tie them together. Follow
//! edges and likes have no payload and live only as store associations.

pub mod post;
pub mod types;
pub mod user;

pub use post::{Comment, NewComment, NewPost, Post, PostUpdate};
pub use types::{CommentId, PostId, Timestamp, UserId};
pub use user::{NewUser, User, UserSummary};
