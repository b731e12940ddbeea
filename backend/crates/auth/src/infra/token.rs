//! JWT Token Codec
//!
//! HS256 JSON Web Tokens. Signature and `exp` are checked here, with no
//! leeway; session liveness is checked by the session service.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::domain::token::{TokenClaims, TokenCodec};
use crate::error::{AuthError, AuthResult};

/// Upper bound on accepted token length
const MAX_TOKEN_LENGTH: usize = 1024;

pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenCodec {
    pub fn new(secret: [u8; 32]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn encode(&self, claims: &TokenClaims) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    fn decode(&self, token: &str) -> AuthResult<TokenClaims> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(AuthError::Unauthorized);
        }

        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("Token expired"),
                    _ => tracing::debug!(error = %e, "Token rejected"),
                }
                Err(AuthError::Unauthorized)
            }
        }
    }
}
