//! Process configuration read from the environment

use anyhow::{Context, bail};
use auth::AuthConfig;
use axum::http::HeaderValue;
use base64::Engine;
use base64::engine::general_purpose;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// First administrator, created at startup when the email is free
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

pub struct ApiConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<HeaderValue>,
    pub auth: AuthConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let frontend_origins: Vec<HeaderValue> = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                origin.parse::<HeaderValue>().with_context(|| {
                    format!("FRONTEND_ORIGINS entry {origin:?} is not a header value")
                })
            })
            .collect::<anyhow::Result<_>>()?;

        Ok(Self {
            database_url,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from_str(DEFAULT_BIND_ADDR)?)?,
            frontend_origins,
            auth: auth_config()?,
            bootstrap_admin: bootstrap_admin()?,
        })
    }
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = match env::var("AUTH_TOKEN_SECRET") {
        Ok(encoded) => AuthConfig::new(decode_secret(&encoded)?),
        Err(_) => {
            tracing::warn!("AUTH_TOKEN_SECRET is not set; tokens will not survive a restart");
            AuthConfig::with_random_secret()
        }
    };

    if let Some(secs) = parse_opt::<u64>("AUTH_TOKEN_TTL_SECS")? {
        config.token_ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = parse_opt::<u64>("AUTH_TWO_FACTOR_TTL_SECS")? {
        config.two_factor_ttl = Duration::from_secs(secs);
    }
    if let Some(attempts) = parse_opt::<u32>("AUTH_TWO_FACTOR_MAX_ATTEMPTS")? {
        if attempts == 0 {
            bail!("AUTH_TWO_FACTOR_MAX_ATTEMPTS must be at least 1");
        }
        config.two_factor_max_attempts = attempts;
    }
    if let Ok(issuer) = env::var("AUTH_TOTP_ISSUER") {
        if issuer.trim().is_empty() || issuer.contains(':') {
            bail!("AUTH_TOTP_ISSUER must be non-empty and must not contain ':'");
        }
        config.totp_issuer = issuer;
    }
    if let Ok(pepper) = env::var("AUTH_PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    Ok(config)
}

fn decode_secret(encoded: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .context("AUTH_TOKEN_SECRET is not valid base64")?;
    let Ok(secret) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        bail!(
            "AUTH_TOKEN_SECRET must decode to 32 bytes, got {}",
            bytes.len()
        );
    };
    Ok(secret)
}

fn bootstrap_admin() -> anyhow::Result<Option<BootstrapAdmin>> {
    let Ok(email) = env::var("BOOTSTRAP_ADMIN_EMAIL") else {
        return Ok(None);
    };
    let password = env::var("BOOTSTRAP_ADMIN_PASSWORD")
        .context("BOOTSTRAP_ADMIN_PASSWORD must be set with BOOTSTRAP_ADMIN_EMAIL")?;
    let name = env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

    Ok(Some(BootstrapAdmin {
        email,
        password,
        name,
    }))
}

fn parse_opt<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value {raw:?}")),
        Err(_) => Ok(None),
    }
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(name)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_secret_requires_32_bytes() {
        let encoded = general_purpose::STANDARD.encode([9u8; 32]);
        assert_eq!(decode_secret(&encoded).unwrap(), [9u8; 32]);

        let short = general_purpose::STANDARD.encode([9u8; 16]);
        assert!(decode_secret(&short).is_err());
        assert!(decode_secret("not base64!").is_err());
    }
}
