//! Bearer token seam
//!
//! A token carries the user id and the id of the session row it was minted
//! for. Its signature and expiry are necessary but never sufficient: the
//! session row decides.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: Uuid,
    /// Session id
    pub sid: Uuid,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(user_id: UserId, session_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id.into_uuid(),
            sid: session_id,
            iat: issued_at.timestamp(),
            exp: issued_at
                .checked_add_signed(ttl)
                .map_or(i64::MAX, |at| at.timestamp()),
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }
}

/// Signs and verifies bearer tokens
///
/// `decode` rejects bad signatures and expired claims; session liveness is
/// the caller's job.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, claims: &TokenClaims) -> AuthResult<String>;

    fn decode(&self, token: &str) -> AuthResult<TokenClaims>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_expiry() {
        let now = Utc::now();
        let claims = TokenClaims::new(UserId::new(), Uuid::new_v4(), now, Duration::hours(1));

        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_claims_user_id() {
        let user_id = UserId::new();
        let claims = TokenClaims::new(user_id, Uuid::new_v4(), Utc::now(), Duration::minutes(1));
        assert_eq!(claims.user_id(), user_id);
    }
}
