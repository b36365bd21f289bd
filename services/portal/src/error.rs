//! Custom error types for the portal service

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for portal route handlers
#[derive(Error, Debug)]
pub enum PortalError {
    /// No valid session on a request that requires one
    #[error("Unauthorized")]
    Unauthorized,

    /// Valid session, but the role does not permit the operation
    #[error("Forbidden")]
    Forbidden,

    /// Throttle limit reached; carries the wait hint for the client
    #[error("Too many requests")]
    RateLimited { retry_after_ms: u64 },

    /// Invalid request payload, with a field-level message
    #[error("{0}")]
    Validation(String),

    /// Conflict with existing data, e.g. a duplicate email
    #[error("{0}")]
    Conflict(String),

    /// Requested record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            PortalError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            PortalError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            PortalError::RateLimited { retry_after_ms } => {
                let retry_after_secs = retry_after_ms.div_ceil(1000).max(1);
                let body = Json(json!({
                    "error": format!(
                        "Too many requests. Please try again in {} seconds.",
                        retry_after_secs
                    ),
                    "retry_after_ms": retry_after_ms,
                }));
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after_secs.to_string())],
                    body,
                )
                    .into_response();
            }
            PortalError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            PortalError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            PortalError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            PortalError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for portal handler results
pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = PortalError::RateLimited {
            retry_after_ms: 1500,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok());
        assert_eq!(retry_after, Some("2"));
    }

    #[test]
    fn auth_errors_map_to_http_statuses() {
        assert_eq!(
            PortalError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PortalError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            PortalError::NotFound("Inquiry").into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
