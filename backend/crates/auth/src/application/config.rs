//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing key for bearer tokens (32 bytes)
    pub token_secret: [u8; 32],
    /// Lifetime of a bearer token. The session row can end it sooner.
    pub token_ttl: Duration,
    /// Lifetime of a two-factor challenge key
    pub two_factor_ttl: Duration,
    /// Wrong codes a challenge survives before it is cleared
    pub two_factor_max_attempts: u32,
    /// Issuer shown in authenticator apps
    pub totp_issuer: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            token_ttl: Duration::from_secs(12 * 3600),    // 12 hours
            two_factor_ttl: Duration::from_secs(5 * 60), // 5 minutes
            two_factor_max_attempts: 5,
            totp_issuer: "Admin API".to_string(),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    pub fn new(token_secret: [u8; 32]) -> Self {
        Self {
            token_secret,
            ..Default::default()
        }
    }

    /// Config with a random token secret (tokens die with the process)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        to_chrono(self.token_ttl)
    }

    pub fn two_factor_ttl(&self) -> chrono::Duration {
        to_chrono(self.two_factor_ttl)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.token_ttl(), chrono::Duration::hours(12));
        assert_eq!(config.two_factor_ttl(), chrono::Duration::minutes(5));
        assert_eq!(config.two_factor_max_attempts, 5);
        assert!(config.pepper().is_none());
    }

    #[test]
    fn test_random_secrets_differ() {
        let a = AuthConfig::with_random_secret();
        let b = AuthConfig::with_random_secret();
        assert_ne!(a.token_secret, b.token_secret);
        assert_ne!(a.token_secret, [0u8; 32]);
    }
}
