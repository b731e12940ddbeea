//! Authenticated caller of a request
//!
//! Produced once by the authentication middleware and passed down through
//! request extensions. Never mutated after creation.

use uuid::Uuid;

use super::user_id::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    /// Session row the presented token is bound to
    pub session_id: Uuid,
}

impl Principal {
    pub fn new(user_id: UserId, session_id: Uuid) -> Self {
        Self {
            user_id,
            session_id,
        }
    }
}
