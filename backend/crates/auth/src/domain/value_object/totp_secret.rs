//! TOTP Secret Value Object
//!
//! Per-user two-factor secret. RFC 6238 with authenticator-app defaults:
//! SHA-1, 6 digits, 30 second step, one step of clock skew either way.

use kernel::error::app_error::{AppError, AppResult};
use std::fmt;
use totp_rs::{Algorithm, Secret, TOTP};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const TOTP_SKEW: u8 = 1;

/// `:` separates issuer from account in the otpauth label
fn label(value: &str) -> String {
    value.replace(':', "_")
}

/// Base32 secret, as stored and as shown to the user during enrollment
#[derive(Clone, PartialEq, Eq)]
pub struct TotpSecret {
    secret_base32: String,
}

impl TotpSecret {
    /// Generate a new random 160-bit secret
    pub fn generate() -> Self {
        Self {
            secret_base32: Secret::generate_secret().to_encoded().to_string(),
        }
    }

    /// Create from a base32-encoded string (from database)
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_base32 = secret.into();
        Secret::Encoded(secret_base32.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?;

        Ok(Self { secret_base32 })
    }

    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    fn to_totp(&self, issuer: &str, account_name: &str) -> AppResult<TOTP> {
        let bytes = Secret::Encoded(self.secret_base32.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            bytes,
            Some(label(issuer)),
            label(account_name),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Check `code` at `unix_time` (seconds)
    pub fn verify_at(
        &self,
        code: &str,
        issuer: &str,
        account_name: &str,
        unix_time: u64,
    ) -> AppResult<bool> {
        let totp = self.to_totp(issuer, account_name)?;
        Ok(totp.check(code.trim(), unix_time))
    }

    /// Code for `unix_time` (seconds), as an authenticator app would show it
    pub fn code_at(&self, issuer: &str, account_name: &str, unix_time: u64) -> AppResult<String> {
        Ok(self.to_totp(issuer, account_name)?.generate(unix_time))
    }

    /// Base64 PNG of the enrollment QR code
    pub fn qr_code(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        self.to_totp(issuer, account_name)?
            .get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to generate QR code: {}", e)))
    }

    /// `otpauth://totp/...` enrollment URI
    pub fn otpauth_url(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        Ok(self.to_totp(issuer, account_name)?.get_url())
    }
}

impl fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "Admin API";
    const ACCOUNT: &str = "ops@example.com";

    #[test]
    fn test_generated_secret_is_base32() {
        let secret = TotpSecret::generate();
        assert!(!secret.as_base32().is_empty());
        assert!(TotpSecret::from_base32(secret.as_base32()).is_ok());
    }

    #[test]
    fn test_code_verifies_within_skew() {
        let secret = TotpSecret::generate();
        let now = 1_700_000_000;
        let code = secret.code_at(ISSUER, ACCOUNT, now).unwrap();

        assert!(secret.verify_at(&code, ISSUER, ACCOUNT, now).unwrap());
        assert!(secret.verify_at(&code, ISSUER, ACCOUNT, now + TOTP_STEP).unwrap());
        assert!(!secret.verify_at(&code, ISSUER, ACCOUNT, now + 10 * TOTP_STEP).unwrap());
    }

    #[test]
    fn test_other_secret_rejects_code() {
        let secret = TotpSecret::generate();
        let other = TotpSecret::generate();
        let now = 1_700_000_000;
        let code = secret.code_at(ISSUER, ACCOUNT, now).unwrap();
        assert!(!other.verify_at(&code, ISSUER, ACCOUNT, now).unwrap());
    }

    #[test]
    fn test_invalid_base32_is_rejected() {
        assert!(TotpSecret::from_base32("not base32 !!").is_err());
    }

    #[test]
    fn test_enrollment_artifacts() {
        let secret = TotpSecret::generate();
        let url = secret.otpauth_url(ISSUER, ACCOUNT).unwrap();
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains(secret.as_base32()));
        assert!(!secret.qr_code(ISSUER, ACCOUNT).unwrap().is_empty());
    }

    #[test]
    fn test_colon_in_account_name() {
        let secret = TotpSecret::generate();
        let account = "a:b@example.com";
        let now = 1_700_000_000;

        let url = secret.otpauth_url("Admin: API", account).unwrap();
        assert!(url.starts_with("otpauth://totp/"));
        let code = secret.code_at(ISSUER, account, now).unwrap();
        assert!(secret.verify_at(&code, ISSUER, account, now).unwrap());
        assert!(!secret.qr_code(ISSUER, account).unwrap().is_empty());
    }

    #[test]
    fn test_debug_redaction() {
        let secret = TotpSecret::generate();
        assert!(!format!("{:?}", secret).contains(secret.as_base32()));
    }
}
