//! Password Hashing and Verification
//!
//! Passwords are NFKC-normalized before they are checked, hashed or compared.
//! Only newly chosen passwords go through the policy (length in code points,
//! no control characters, nothing predictable). Hashes are Argon2id PHC
//! strings, optionally peppered. Clear text is zeroized on drop.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Minimum password length in code points
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in code points
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Reasons a newly chosen password is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password is blank")]
    Blank,

    #[error("Password is shorter than {min} characters")]
    TooShort { min: usize },

    #[error("Password is longer than {max} characters")]
    TooLong { max: usize },

    /// Control characters other than tab and newline
    #[error("Password contains control characters")]
    ControlCharacter,

    #[error("Password is predictable")]
    Predictable,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, zeroized on drop
///
/// Two ways in: [`ClearTextPassword::new`] applies the policy and is used for
/// passwords being chosen; [`ClearTextPassword::candidate`] only normalizes
/// and is used for passwords being checked against a stored hash, so that
/// credentials created under an older policy still verify.
///
/// Not `Clone`, and `Debug` is redacted.
///
/// ## Examples
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let chosen = ClearTextPassword::new("Tr0ub4dor&3-horse".to_string()).unwrap();
/// let hashed = chosen.hash(None).unwrap();
/// assert!(hashed.verify(&ClearTextPassword::candidate("Tr0ub4dor&3-horse".to_string()), None));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Normalize (NFKC), then apply the policy to the normalized text
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();
        check_policy(&normalized)?;
        Ok(Self(normalized))
    }

    /// Normalize without applying the policy, for comparison against a hash
    pub fn candidate(raw: String) -> Self {
        Self(raw.nfkc().collect())
    }

    /// Get the password as bytes for hashing
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash with Argon2id (default parameters) and a fresh 16-byte salt
    ///
    /// `pepper` is appended to the password bytes before hashing and must be
    /// supplied again on every verification.
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let password_bytes = peppered(self, pepper);
        let salt = SaltString::generate(OsRng);
        // m=19456 (19 MiB), t=2, p=1
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(&password_bytes, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format, safe to store
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Parse a stored PHC string
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();

        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash (constant-time compare inside argon2)
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };
        let password_bytes = peppered(password, pepper);

        Argon2::default()
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Password bytes with the pepper appended
fn peppered(password: &ClearTextPassword, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
    let mut bytes = password.as_bytes().to_vec();
    if let Some(p) = pepper {
        bytes.extend_from_slice(p);
    }
    Zeroizing::new(bytes)
}

fn check_policy(password: &str) -> Result<(), PasswordPolicyError> {
    if password.trim().is_empty() {
        return Err(PasswordPolicyError::Blank);
    }

    match password.chars().count() {
        n if n < MIN_PASSWORD_LENGTH => Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        }),
        n if n > MAX_PASSWORD_LENGTH => Err(PasswordPolicyError::TooLong {
            max: MAX_PASSWORD_LENGTH,
        }),
        _ if password
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\t' | '\n')) =>
        {
            Err(PasswordPolicyError::ControlCharacter)
        }
        _ if is_predictable(password) => Err(PasswordPolicyError::Predictable),
        _ => Ok(()),
    }
}

/// Keyboard rows scanned for runs of [`KEYBOARD_RUN`] or more keys
const KEYBOARD_ROWS: [&str; 4] = ["1234567890", "qwertyuiop", "asdfghjkl", "zxcvbnm"];
const KEYBOARD_RUN: usize = 6;

/// Words that stay guessable whatever digits or symbols follow them
const DENYLIST: [&str; 12] = [
    "password", "passw0rd", "letmein", "welcome", "admin", "administrator", "iloveyou",
    "sunshine", "football", "baseball", "dragon", "trustno1",
];

/// Repeated characters, alphabet or digit runs, keyboard runs, denylisted words
fn is_predictable(password: &str) -> bool {
    let folded: Vec<char> = password
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    // "aaaaaaaa", "abcdefgh", "87654321": every step is the same 0 or +-1
    if folded.len() >= 4 {
        let step = |w: &[char]| w[1] as i64 - w[0] as i64;
        let first = step(&folded[..2]);
        if first.abs() <= 1 && folded.windows(2).all(|w| step(w) == first) {
            return true;
        }
    }

    let joined: String = folded.iter().collect();
    let on_keyboard = KEYBOARD_ROWS.iter().any(|row| {
        let keys: Vec<char> = row.chars().collect();
        keys.windows(KEYBOARD_RUN).any(|run| {
            let run: String = run.iter().collect();
            joined.contains(&run)
        })
    });
    if on_keyboard {
        return true;
    }

    let stem = joined.trim_end_matches(|c: char| c.is_ascii_digit());
    DENYLIST.contains(&stem) || DENYLIST.contains(&joined.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refused(raw: &str) -> PasswordPolicyError {
        ClearTextPassword::new(raw.to_string()).unwrap_err()
    }

    #[test]
    fn test_length_counts_code_points() {
        assert_eq!(refused("Ab3$xyz"), PasswordPolicyError::TooShort { min: 8 });
        assert_eq!(
            refused(&"Zq7!".repeat(33)),
            PasswordPolicyError::TooLong { max: 128 }
        );
        // Eight multibyte characters are long enough
        assert!(ClearTextPassword::new("ÄÖÜäöüßé".to_string()).is_ok());
    }

    #[test]
    fn test_blank_and_control_characters() {
        assert_eq!(refused(""), PasswordPolicyError::Blank);
        assert_eq!(refused(" \t  \n   "), PasswordPolicyError::Blank);
        assert_eq!(
            refused("Maple\u{0007}Street-90"),
            PasswordPolicyError::ControlCharacter
        );
        assert!(ClearTextPassword::new("Maple Street\t90".to_string()).is_ok());
    }

    #[test]
    fn test_predictable_passwords() {
        for raw in [
            "password123",
            "Welcome2024",
            "zzzzzzzzzz",
            "a-b-c-d-e-f-g-h",
            "98765432",
            "myqwertyuiop!",
            "ASDFGH-Plus-7",
        ] {
            assert_eq!(refused(raw), PasswordPolicyError::Predictable, "{raw}");
        }

        for raw in ["Violet-Harbor-2031", "Tr0ub4dor&3-horse", "パスワード安全です!"] {
            assert!(ClearTextPassword::new(raw.to_string()).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_verify_requires_same_pepper() {
        let password = ClearTextPassword::candidate("Violet-Harbor-2031".to_string());
        let plain = password.hash(None).unwrap();
        let peppered = password.hash(Some(b"pepper-one")).unwrap();

        assert!(plain.verify(&password, None));
        assert!(!plain.verify(&password, Some(b"pepper-one")));
        assert!(peppered.verify(&password, Some(b"pepper-one")));
        assert!(!peppered.verify(&password, Some(b"pepper-two")));
        assert!(!peppered.verify(&password, None));

        let other = ClearTextPassword::candidate("Violet-Harbor-2032".to_string());
        assert!(!plain.verify(&other, None));
    }

    #[test]
    fn test_stored_hash_is_argon2id_phc() {
        let hashed = ClearTextPassword::candidate("Violet-Harbor-2031".to_string())
            .hash(None)
            .unwrap();
        assert!(hashed.as_phc_string().starts_with("$argon2id$"));

        let reloaded = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert_eq!(reloaded, hashed);
        assert!(matches!(
            HashedPassword::from_phc_string("plain text, not a hash"),
            Err(PasswordHashError::InvalidHashFormat)
        ));
    }

    #[test]
    fn test_formatting_hides_secrets() {
        let password = ClearTextPassword::candidate("hunter2-but-longer".to_string());
        let shown = format!("{password:?}");
        assert!(!shown.contains("hunter2"));

        let hashed = password.hash(None).unwrap();
        assert!(!format!("{hashed:?}").contains("argon2"));
    }

    #[test]
    fn test_candidate_skips_policy_but_normalizes() {
        // Too short for the policy, still usable for verification
        let short = ClearTextPassword::candidate("abc".to_string());
        assert_eq!(short.as_bytes(), b"abc");

        // Fullwidth letters fold to ASCII under NFKC
        let wide = ClearTextPassword::candidate("\u{FF21}\u{FF22}".to_string());
        assert_eq!(wide.as_bytes(), b"AB");
    }

    #[test]
    fn test_hash_verifies_normalized_equivalent() {
        let chosen = ClearTextPassword::new("\u{FF21}bsolute-Zebra-42".to_string()).unwrap();
        let hashed = chosen.hash(None).unwrap();
        let typed = ClearTextPassword::candidate("Absolute-Zebra-42".to_string());
        assert!(hashed.verify(&typed, None));
    }
}
