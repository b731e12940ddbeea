//! Error Conversions
//!
//! Feature-gated glue between [`AppError`] and the database / HTTP stacks.

#[cfg(any(feature = "axum", test))]
use super::app_error::AppError;

// ============================================================================
// SQLx helpers (feature-gated)
// ============================================================================

/// Name of the violated constraint when `err` is a unique violation (23505)
///
/// Callers use the constraint name to decide which input field collided.
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
#[cfg(feature = "sqlx")]
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

/// RFC 7807 style body. `errors` only appears for per-field validation failures.
#[cfg(any(feature = "axum", test))]
fn problem_body(err: &AppError) -> serde_json::Value {
    let mut body = serde_json::json!({
        "type": format!("https://httpstatuses.io/{}", err.status_code()),
        "title": err.kind().as_str(),
        "status": err.status_code(),
        "detail": err.message(),
    });
    if let Some(action) = err.action() {
        body["action"] = serde_json::Value::from(action);
    }
    if let Some(fields) = err.fields() {
        body["errors"] = serde_json::to_value(fields).unwrap_or_default();
    }
    body
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(problem_body(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::field::FieldErrors;

    #[test]
    fn test_single_message_body() {
        let body = problem_body(&AppError::forbidden("Missing permission: view-users"));
        assert_eq!(body["status"], 403);
        assert_eq!(body["title"], "Forbidden");
        assert_eq!(body["detail"], "Missing permission: view-users");
        assert!(body.get("errors").is_none());
        assert!(body.get("action").is_none());
    }

    #[test]
    fn test_validation_body_has_field_map() {
        let taken = "The email has already been taken.";
        let err = AppError::validation(FieldErrors::single("email", taken));
        let body = problem_body(&err);
        assert_eq!(body["status"], 422);
        assert_eq!(body["errors"]["email"][0], taken);
    }

    #[test]
    fn test_action_is_rendered() {
        let err = AppError::unauthorized("Session expired").with_action("Sign in again");
        let body = problem_body(&err);
        assert_eq!(body["action"], "Sign in again");
    }
}
