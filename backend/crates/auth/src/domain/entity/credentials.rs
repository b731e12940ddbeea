//! Credentials Entity
//!
//! Password hash and two-factor state for a user, kept apart from the
//! `User` record so that profile reads never load secrets.

use chrono::{DateTime, Utc};

use super::two_factor_challenge::TwoFactorChallenge;
use crate::domain::value_object::{
    totp_secret::TotpSecret, user_id::UserId, user_password::UserPassword,
};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: UserId,
    pub password_hash: UserPassword,
    pub two_factor_enabled: bool,
    /// Set on enrollment
    pub two_factor_secret: Option<TotpSecret>,
    /// Pending sign-in challenge; at most one per user
    pub two_factor_challenge: Option<TwoFactorChallenge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(user_id: UserId, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            two_factor_enabled: false,
            two_factor_secret: None,
            two_factor_challenge: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Enrolled secret, if sign-in must go through a challenge
    pub fn enrolled_secret(&self) -> Option<&TotpSecret> {
        self.two_factor_secret
            .as_ref()
            .filter(|_| self.two_factor_enabled)
    }

    pub fn requires_two_factor(&self) -> bool {
        self.enrolled_secret().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn credentials() -> Credentials {
        let raw = RawPassword::candidate("Violet-Harbor-2031".to_string());
        Credentials::new(UserId::new(), UserPassword::from_raw(&raw, None).unwrap())
    }

    #[test]
    fn test_two_factor_requires_flag_and_secret() {
        let mut creds = credentials();
        assert!(!creds.requires_two_factor());

        creds.two_factor_secret = Some(TotpSecret::generate());
        assert!(!creds.requires_two_factor());

        creds.two_factor_enabled = true;
        assert!(creds.requires_two_factor());

        creds.two_factor_secret = None;
        assert!(!creds.requires_two_factor());
    }
}
