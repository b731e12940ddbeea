//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, SHA-256, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B style policy)
//! - Client metadata and bearer-token extraction from request headers

pub mod client;
pub mod crypto;
pub mod password;
