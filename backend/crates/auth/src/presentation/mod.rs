//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, middleware, and router.

pub mod admin_handlers;
pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use router::{auth_router, auth_router_with_codec};
