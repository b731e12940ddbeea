//! User Entity
//!
//! Identity and status of an account. Credentials live in
//! [`Credentials`](super::credentials::Credentials).

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, phone_number::PhoneNumber, user_id::UserId, user_name::UserName,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub name: UserName,
    /// Unique, login identifier
    pub email: Email,
    /// Unique when present, login identifier
    pub phone_number: Option<PhoneNumber>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete marker; deleted users never appear in lookups
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: UserName, email: Email, phone_number: Option<PhoneNumber>) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            name,
            email,
            phone_number,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Active and not soft-deleted
    pub fn can_sign_in(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    pub fn update_profile(
        &mut self,
        name: UserName,
        email: Email,
        phone_number: Option<PhoneNumber>,
    ) {
        self.name = name;
        self.email = email;
        self.phone_number = phone_number;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            UserName::new("Dana Scully").unwrap(),
            Email::new("dana@example.com").unwrap(),
            None,
        )
    }

    #[test]
    fn test_new_user_can_sign_in() {
        assert!(user().can_sign_in());
    }

    #[test]
    fn test_inactive_or_deleted_user_cannot_sign_in() {
        let mut inactive = user();
        inactive.is_active = false;
        assert!(!inactive.can_sign_in());

        let mut deleted = user();
        deleted.deleted_at = Some(Utc::now());
        assert!(!deleted.can_sign_in());
    }
}
