//! Role name: trimmed, 1 to 100 characters.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const ROLE_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            return Err(AppError::unprocessable("The name field is required."));
        }
        if name.chars().count() > ROLE_NAME_MAX_LENGTH {
            return Err(AppError::unprocessable(format!(
                "The name may not be greater than {} characters.",
                ROLE_NAME_MAX_LENGTH
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_bounds() {
        assert_eq!(RoleName::new(" Admin ").unwrap().as_str(), "Admin");
        assert!(RoleName::new("A").is_ok());
        assert!(RoleName::new("   ").is_err());
        assert!(RoleName::new("r".repeat(ROLE_NAME_MAX_LENGTH + 1)).is_err());
    }
}
