//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` response envelope.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, field::FieldErrors, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown login, wrong password, or an account that may not sign in
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired or revoked bearer token
    #[error("Unauthenticated")]
    Unauthorized,

    /// Authenticated principal lacks the named permission
    #[error("Missing permission: {0}")]
    Forbidden(String),

    /// Malformed input, reported per field
    #[error("The given data was invalid")]
    Validation(FieldErrors),

    /// Two-factor key unknown, superseded or already used
    #[error("Two-factor challenge not found")]
    ChallengeNotFound,

    /// Two-factor key presented after its expiry
    #[error("Two-factor challenge expired")]
    ChallengeExpired,

    /// One-time code does not match the enrolled secret
    #[error("Invalid two-factor code")]
    InvalidCode,

    /// Uniqueness violation on a user field (`email`, `phone_number`)
    #[error("The {field} has already been taken")]
    Conflict { field: &'static str },

    /// Target of an administrative operation does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 2FA operation on an account without 2FA
    #[error("Two-factor authentication is not enabled")]
    TwoFactorNotEnabled,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        AuthError::Validation(FieldErrors::single(field, message))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::Unauthorized
            | AuthError::ChallengeExpired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) | AuthError::ChallengeNotFound => StatusCode::FORBIDDEN,
            AuthError::Validation(_)
            | AuthError::InvalidCode
            | AuthError::Conflict { .. }
            | AuthError::TwoFactorNotEnabled => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::Unauthorized
            | AuthError::ChallengeExpired => ErrorKind::Unauthorized,
            AuthError::Forbidden(_) | AuthError::ChallengeNotFound => ErrorKind::Forbidden,
            AuthError::Validation(_)
            | AuthError::InvalidCode
            | AuthError::Conflict { .. }
            | AuthError::TwoFactorNotEnabled => ErrorKind::UnprocessableEntity,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures keep their detail out of the message.
    pub fn into_app_error(self) -> AppError {
        match self {
            AuthError::Validation(fields) => AppError::validation(fields),
            AuthError::Conflict { field } => AppError::validation(FieldErrors::single(
                field,
                format!("The {} has already been taken.", field.replace('_', " ")),
            )),
            AuthError::InvalidCode => AppError::unprocessable("Invalid two-factor code")
                .with_fields(FieldErrors::single("otp", "The code is invalid.")),
            AuthError::Unauthorized => AppError::unauthorized("Session expired or not found")
                .with_action("Sign in again"),
            AuthError::ChallengeExpired => AppError::unauthorized("Two-factor challenge expired")
                .with_action("Sign in again"),
            AuthError::Database(e) => AppError::internal("Internal server error").with_source(e),
            AuthError::Internal(_) => AppError::internal("Internal server error"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::Forbidden(permission) => {
                tracing::info!(%permission, "Request denied: missing permission");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::invalid_field("body", rejection.body_text())
    }
}

/// A path id that does not parse names nothing
impl From<PathRejection> for AuthError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameter");
        AuthError::NotFound("Resource")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AuthError::InvalidCredentials, 401),
            (AuthError::Unauthorized, 401),
            (AuthError::Forbidden("view-users".into()), 403),
            (AuthError::Validation(FieldErrors::new()), 422),
            (AuthError::ChallengeNotFound, 403),
            (AuthError::ChallengeExpired, 401),
            (AuthError::InvalidCode, 422),
            (AuthError::Conflict { field: "email" }, 422),
            (AuthError::NotFound("User"), 404),
            (AuthError::TwoFactorNotEnabled, 422),
            (AuthError::Internal("boom".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
            assert_eq!(err.kind().status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn test_conflict_becomes_field_error() {
        let err = AuthError::Conflict {
            field: "phone_number",
        };
        let app = err.into_app_error();
        assert_eq!(app.status_code(), 422);
        let messages = app.fields().and_then(|f| f.get("phone_number")).unwrap();
        assert_eq!(messages, ["The phone number has already been taken."]);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let app = AuthError::Internal("connection string leaked".into()).into_app_error();
        assert_eq!(app.status_code(), 500);
        assert_eq!(app.message(), "Internal server error");
    }

    #[test]
    fn test_into_response_status() {
        let response = AuthError::ChallengeExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let err = AuthError::invalid_field("login", "The login field is required.");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
