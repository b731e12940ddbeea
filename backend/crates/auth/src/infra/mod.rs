//! Infrastructure Layer
//!
//! Store implementations and the bearer token codec.

pub mod memory;
pub mod postgres;
pub mod token;

pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;
pub use token::JwtTokenCodec;
