//! Authorization rules. Each check takes the username proven by the bearer
//! token and the resource being touched.

use tracing::warn;

use messagely_types::models::MessageDetail;

use crate::error::ApiError;

/// Only the sender and the recipient may read a message.
pub fn ensure_can_view(requester: &str, message: &MessageDetail) -> Result<(), ApiError> {
    if requester == message.from_user.username || requester == message.to_user.username {
        return Ok(());
    }
    warn!("{} denied access to message {}", requester, message.id);
    Err(ApiError::Unauthorized)
}

/// Only the recipient may mark a message read.
pub fn ensure_can_mark_read(requester: &str, message: &MessageDetail) -> Result<(), ApiError> {
    if requester == message.to_user.username {
        return Ok(());
    }
    warn!("{} tried to mark message {} read", requester, message.id);
    Err(ApiError::Unauthorized)
}

/// Users may only act as themselves.
pub fn ensure_same_user(requester: &str, username: &str) -> Result<(), ApiError> {
    if requester == username {
        return Ok(());
    }
    warn!("{} tried to act as {}", requester, username);
    Err(ApiError::Unauthorized)
}
