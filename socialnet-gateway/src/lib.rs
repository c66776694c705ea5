//! Gateway of the social network
//!
//! Translates commands into calls against the user-and-post and newsfeed
//! services. The `socialnet` binary wires a [`Gateway`] over replica sets
//! dialed from configuration; tests wire it over in-process services.

pub mod error;
pub mod gateway;
pub mod session;

pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, PostDraft, ProfileEdit, Registration, Reply};
pub use session::Session;
