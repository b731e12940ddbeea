//! Auth Session Entity
//!
//! One row per live login. The bearer token names this row; deleting the row
//! revokes the token.

use chrono::{DateTime, Utc};
use platform::client::ClientMeta;
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(user_id: UserId, client: &ClientMeta) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            ip_address: client.ip_string(),
            user_agent: client.user_agent.clone(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn belongs_to(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_records_client() {
        let user_id = UserId::new();
        let client = ClientMeta::new(Some("203.0.113.9".parse().unwrap()), Some("curl/8".into()));
        let session = AuthSession::new(user_id, &client);

        assert!(session.belongs_to(&user_id));
        assert!(!session.belongs_to(&UserId::new()));
        assert_eq!(session.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(session.user_agent.as_deref(), Some("curl/8"));
        assert_eq!(session.created_at, session.last_activity_at);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let user_id = UserId::new();
        let a = AuthSession::new(user_id, &ClientMeta::default());
        let b = AuthSession::new(user_id, &ClientMeta::default());
        assert_ne!(a.session_id, b.session_id);
    }
}
