//! Value Object Module

pub mod email;
pub mod permission_set;
pub mod phone_number;
pub mod principal;
pub mod role_name;
pub mod totp_secret;
pub mod user_id;
pub mod user_name;
pub mod user_password;
