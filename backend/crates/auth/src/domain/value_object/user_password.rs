//! User Password Value Object
//!
//! Domain wrapper over `platform::password`.
//!
//! ## Usage
//! ```rust
//! use auth::domain::value_object::user_password::{RawPassword, UserPassword};
//!
//! let chosen = RawPassword::new("Violet-Harbor-2031".to_string()).unwrap();
//! let stored = UserPassword::from_raw(&chosen, None).unwrap();
//!
//! let typed = RawPassword::candidate("Violet-Harbor-2031".to_string());
//! assert!(stored.verify(&typed, None));
//! ```

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{
    ClearTextPassword, HashedPassword, PasswordHashError, PasswordPolicyError,
};
use std::fmt;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// A newly chosen password; the policy applies
    ///
    /// Policy failures are 422 errors whose message is shown next to the
    /// password field.
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| {
            let message = match e {
                PasswordPolicyError::Blank => "The password field is required.".to_string(),
                PasswordPolicyError::TooShort { min } => {
                    format!("The password must be at least {min} characters.")
                }
                PasswordPolicyError::TooLong { max } => {
                    format!("The password may not be greater than {max} characters.")
                }
                PasswordPolicyError::ControlCharacter => {
                    "The password contains invalid characters.".to_string()
                }
                PasswordPolicyError::Predictable => {
                    "The password is too easy to guess.".to_string()
                }
            };
            AppError::unprocessable(message)
        })?;

        Ok(Self(clear_text))
    }

    /// A password typed to prove identity; only normalized
    pub fn candidate(raw: String) -> Self {
        Self(ClearTextPassword::candidate(raw))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id PHC hash, the only form a password is persisted in
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        let hashed = raw.inner().hash(pepper).map_err(|e: PasswordHashError| {
            AppError::internal("Password hashing failed").with_source(e)
        })?;

        Ok(Self(hashed))
    }

    /// From the stored PHC string
    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|e| AppError::internal("Invalid password hash in database").with_source(e))?;

        Ok(Self(hashed))
    }

    /// Get PHC string for database storage
    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// `pepper` must match the one used when hashing
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

impl fmt::Display for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[HASHED_PASSWORD]")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_password_policy() {
        assert!(RawPassword::new("Violet-Harbor-2031".to_string()).is_ok());

        use platform::password::MIN_PASSWORD_LENGTH;
        let short = "a1!".repeat(MIN_PASSWORD_LENGTH / 3);
        let err = RawPassword::new(short).unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.message(), "The password must be at least 8 characters.");

        assert!(RawPassword::new("password123".to_string()).is_err());
        assert!(RawPassword::new("".to_string()).is_err());
    }

    #[test]
    fn test_candidate_verifies_without_policy() {
        // Accounts created under a looser policy can still sign in
        let legacy = RawPassword::candidate("abc123".to_string());
        let stored = UserPassword::from_raw(&legacy, None).unwrap();
        let same = RawPassword::candidate("abc123".to_string());
        let other = RawPassword::candidate("abc124".to_string());
        assert!(stored.verify(&same, None));
        assert!(!stored.verify(&other, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let raw = RawPassword::new("Violet-Harbor-2031".to_string()).unwrap();
        let pepper = b"app_secret_pepper";
        let hashed = UserPassword::from_raw(&raw, Some(pepper)).unwrap();

        assert!(hashed.verify(&raw, Some(pepper)));
        assert!(!hashed.verify(&raw, None));
        assert!(!hashed.verify(&raw, Some(b"wrong")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let raw = RawPassword::new("Violet-Harbor-2031".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();

        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, None));
        assert!(UserPassword::from_phc_string("not-a-hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("SecretPassword-77".to_string()).unwrap();
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("Secret"));

        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        assert!(format!("{:?}", hashed).contains("HASH"));
    }
}
