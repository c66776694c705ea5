use crate::error::{GatewayError, GatewayResult};
use socialnet_core::model::UserId;

/// Caller identity for one command
///
/// A successful login yields the user id, which the caller passes back with
/// `--session` on later commands. Nothing is verified beyond presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<UserId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The session's user, or `Unauthorized` when there is none
    pub fn require(&self) -> GatewayResult<UserId> {
        self.user_id.ok_or(GatewayError::Unauthorized)
    }
}

impl From<Option<i64>> for Session {
    fn from(id: Option<i64>) -> Self {
        Self {
            user_id: id.map(UserId),
        }
    }
}
