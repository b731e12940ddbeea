//! User Name Value Object
//!
//! Display name shown in the admin UI. Not an identifier: it is not unique
//! and is never used to sign in.
//!
//! ## Invariants
//! - NFKC normalized, surrounding whitespace trimmed
//! - 3 to 100 characters after normalization
//! - No control characters

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Minimum length for user name (in characters)
pub const USER_NAME_MIN_LENGTH: usize = 3;

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let normalized: String = raw.as_ref().nfkc().collect();
        let name = normalized.trim();

        if name.is_empty() {
            return Err(AppError::unprocessable("The name field is required."));
        }

        let len = name.chars().count();
        if !(USER_NAME_MIN_LENGTH..=USER_NAME_MAX_LENGTH).contains(&len) {
            return Err(AppError::unprocessable(format!(
                "The name must be between {} and {} characters.",
                USER_NAME_MIN_LENGTH, USER_NAME_MAX_LENGTH
            )));
        }

        if name.chars().any(char::is_control) {
            return Err(AppError::unprocessable(
                "The name may not contain control characters.",
            ));
        }

        Ok(Self(name.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_db(self) -> String {
        self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_trims_and_normalizes() {
        let name = UserName::new("  \u{FF21}nna Smith ").unwrap();
        assert_eq!(name.as_str(), "Anna Smith");
    }

    #[test]
    fn test_user_name_length_bounds() {
        assert!(UserName::new("Al").is_err());
        assert!(UserName::new("Ali").is_ok());
        assert!(UserName::new("x".repeat(USER_NAME_MAX_LENGTH)).is_ok());
        assert!(UserName::new("x".repeat(USER_NAME_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_user_name_rejects_control_characters() {
        assert!(UserName::new("Bad\u{0007}Name").is_err());
    }

    #[test]
    fn test_user_name_counts_characters_not_bytes() {
        // 3 characters, 9 bytes
        assert!(UserName::new("山田太").is_ok());
    }
}
