//! Entities

pub mod auth_session;
pub mod catalog;
pub mod credentials;
pub mod two_factor_challenge;
pub mod user;
