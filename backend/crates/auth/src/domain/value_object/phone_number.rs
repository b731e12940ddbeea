//! Phone Number Value Object
//!
//! The second login identifier. Stored as typed, minus spaces and dashes,
//! so lookups compare like with like.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Digits with an optional leading `+`; spaces and dashes are dropped
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let compact: String = raw
            .as_ref()
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();

        if compact.is_empty() {
            return Err(AppError::unprocessable("The phone number field is required."));
        }

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::unprocessable(
                "The phone number may only contain digits and a leading +.",
            ));
        }

        if digits.len() < PHONE_MIN_DIGITS || compact.len() > PHONE_MAX_LENGTH {
            return Err(AppError::unprocessable(format!(
                "The phone number must be between {} and {} characters.",
                PHONE_MIN_DIGITS, PHONE_MAX_LENGTH
            )));
        }

        Ok(Self(compact))
    }

    pub fn from_db(phone: impl Into<String>) -> Self {
        Self(phone.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_db(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_compacts_separators() {
        let phone = PhoneNumber::new(" +62 812-3456-789 ").unwrap();
        assert_eq!(phone.as_str(), "+628123456789");
    }

    #[test]
    fn test_phone_rejects_letters_and_short_numbers() {
        assert!(PhoneNumber::new("0812abc999").is_err());
        assert!(PhoneNumber::new("12345").is_err());
        assert!(PhoneNumber::new("+").is_err());
        assert!(PhoneNumber::new("").is_err());
        assert!(PhoneNumber::new("1".repeat(21)).is_err());
    }
}
