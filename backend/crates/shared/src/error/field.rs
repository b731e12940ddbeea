//! Per-field validation errors
//!
//! Collected while checking a request and rendered as the `errors` member of
//! the response body.

use std::collections::BTreeMap;

use serde::Serialize;

/// Field name to list of messages, in field-name order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field shorthand
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_groups_by_field() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email field is required.");
        errors.add("email", "The email must be a valid email address.");
        errors.add("name", "The name field is required.");

        assert_eq!(errors.get("email").map(<[String]>::len), Some(2));
        assert!(errors.contains("name"));
        assert!(!errors.contains("password"));
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(FieldErrors::single("login", "required").into_result().is_err());
    }

    #[test]
    fn test_serializes_as_map() {
        let errors = FieldErrors::single("otp", "The otp field is required.");
        let json = serde_json::to_value(&errors).unwrap();
        let expected = serde_json::json!({ "otp": ["The otp field is required."] });
        assert_eq!(json, expected);
    }
}
