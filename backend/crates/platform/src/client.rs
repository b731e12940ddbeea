//! Client identification utilities
//!
//! Request metadata recorded alongside a session, and bearer-token extraction.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Longest user agent kept; anything beyond is cut at a char boundary
pub const MAX_USER_AGENT_LENGTH: usize = 512;

/// Client metadata stored with each session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// User-Agent header, truncated to [`MAX_USER_AGENT_LENGTH`]
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    /// Get IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Build [`ClientMeta`] from request headers and the peer address
pub fn extract_client_meta(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> ClientMeta {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .map(truncate_user_agent);

    ClientMeta::new(extract_client_ip(headers, direct_ip), user_agent)
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

/// Token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively. Returns `None` when the header is
/// absent, uses another scheme, or carries an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn truncate_user_agent(ua: &str) -> String {
    match ua.char_indices().nth(MAX_USER_AGENT_LENGTH) {
        Some((cut, _)) => ua[..cut].to_string(),
        None => ua.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_meta() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );
        let direct: IpAddr = "10.1.2.3".parse().unwrap();

        let meta = extract_client_meta(&headers, Some(direct));
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0 Test Browser"));
        assert_eq!(meta.ip_string().as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn test_missing_user_agent_is_none() {
        let meta = extract_client_meta(&HeaderMap::new(), None);
        assert_eq!(meta, ClientMeta::default());
    }

    #[test]
    fn test_long_user_agent_is_truncated() {
        let mut headers = HeaderMap::new();
        let long = "a".repeat(MAX_USER_AGENT_LENGTH + 40);
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());

        let meta = extract_client_meta(&headers, None);
        let length = meta.user_agent.map(|ua| ua.len());
        assert_eq!(length, Some(MAX_USER_AGENT_LENGTH));
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer xyz"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("xyz"));
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_forms() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
