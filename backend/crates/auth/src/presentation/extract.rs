//! Request Extractors

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts};
use axum::http::request::Parts;
use platform::client::{ClientMeta, extract_client_meta};

use crate::domain::value_object::principal::Principal;
use crate::error::AuthError;

/// JSON body whose rejection renders as a validation error
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AuthError))]
pub struct AppJson<T>(pub T);

/// Path parameters whose rejection renders as `NotFound`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AuthError))]
pub struct AppPath<T>(pub T);

/// Client address and user agent of the request
#[derive(Debug, Clone)]
pub struct Client(pub ClientMeta);

impl<S> FromRequestParts<S> for Client
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent when the server is not run with connect info (tests)
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(Client(extract_client_meta(&parts.headers, direct_ip)))
    }
}

/// Set by the authentication middleware
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or(AuthError::Unauthorized)
    }
}
