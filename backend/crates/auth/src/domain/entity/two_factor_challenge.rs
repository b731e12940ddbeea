//! Two-factor sign-in challenge
//!
//! Issued after a correct password when the account has 2FA enabled. The
//! caller receives the plain key; only its SHA-256 digest and the expiry are
//! stored, as two separate fields, next to a count of wrong codes.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::{random_token, sha256, to_base64_url};

/// Random bytes in a challenge key
pub const CHALLENGE_KEY_BYTES: usize = 32;

/// Stored half of a challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorChallenge {
    pub key_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong codes presented so far
    pub failed_attempts: u32,
}

/// A freshly issued challenge and the key handed to the client
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub key: String,
    pub challenge: TwoFactorChallenge,
}

impl TwoFactorChallenge {
    /// New random key valid for `ttl` from `now`
    pub fn issue(ttl: Duration, now: DateTime<Utc>) -> IssuedChallenge {
        let key = random_token(CHALLENGE_KEY_BYTES);
        let expires_at = now
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let challenge = Self::for_key(&key, expires_at);
        IssuedChallenge { key, challenge }
    }

    pub fn for_key(key: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            key_hash: Self::digest(key),
            expires_at,
            failed_attempts: 0,
        }
    }

    /// Lookup form of a presented key
    pub fn digest(key: &str) -> String {
        to_base64_url(&sha256(key.as_bytes()))
    }

    /// Presented after its expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Count one wrong code; `true` once `max_attempts` is reached
    pub fn record_failure(&mut self, max_attempts: u32) -> bool {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.failed_attempts >= max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_stores_digest_not_key() {
        let now = Utc::now();
        let issued = TwoFactorChallenge::issue(Duration::minutes(5), now);

        let challenge = &issued.challenge;
        assert_ne!(challenge.key_hash, issued.key);
        assert_eq!(challenge.key_hash, TwoFactorChallenge::digest(&issued.key));
        assert_eq!(challenge.expires_at, now + Duration::minutes(5));
        assert_eq!(challenge.failed_attempts, 0);
    }

    #[test]
    fn test_keys_are_unique() {
        let now = Utc::now();
        let a = TwoFactorChallenge::issue(Duration::minutes(5), now);
        let b = TwoFactorChallenge::issue(Duration::minutes(5), now);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let challenge = TwoFactorChallenge::for_key("k", now);

        assert!(!challenge.is_expired_at(now - Duration::seconds(1)));
        assert!(!challenge.is_expired_at(now));
        assert!(challenge.is_expired_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn test_record_failure_until_limit() {
        let mut challenge = TwoFactorChallenge::for_key("k", Utc::now());

        assert!(!challenge.record_failure(3));
        assert!(!challenge.record_failure(3));
        assert!(challenge.record_failure(3));
        assert_eq!(challenge.failed_attempts, 3);
    }

    #[test]
    fn test_key_with_dashes_is_opaque() {
        // Keys are never split, so separator characters carry no meaning
        let expires = Utc::now();
        let a = TwoFactorChallenge::for_key("abc-123", expires);
        let b = TwoFactorChallenge::for_key("abc", expires);
        assert_ne!(a.key_hash, b.key_hash);
    }
}
