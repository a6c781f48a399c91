//! Shared HTTP plumbing: response envelope, error mapping, extractors

pub mod caller;
pub mod validated_json;

pub use caller::{CallerRejection, USER_ID_HEADER, USER_ROLE_HEADER};
pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response envelope
///
/// Every REST endpoint wraps its payload in this envelope.
/// On success: `{"success": true, "data": {...}}`,
/// on error: `{"success": false, "data": null, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` if the request succeeded
    pub success: bool,
    /// Payload, `null` on error
    pub data: Option<T>,
    /// Error description, omitted on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Empty response for operations without return data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmptyData {}

/// Error side of every handler result, rendered with the same envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 for malformed query, path or body input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let status = status_for(&e);
        if e.is_transient() {
            // Storage details stay in the log.
            tracing::error!(error = %e, "Storage failure while handling request");
            return Self::new(status, "Storage temporarily unavailable, retry later");
        }
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

/// Handler result: the success envelope or an [`ApiError`].
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap `data` in a success envelope.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// HTTP status for a domain error.
pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) | DomainError::InvalidSlot(_) => StatusCode::BAD_REQUEST,
        DomainError::SlotUnavailable(_)
        | DomainError::Conflict(_)
        | DomainError::AlreadyTerminal { .. } => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        let cases = [
            (DomainError::not_found("Booking", "id", "b1"), StatusCode::NOT_FOUND),
            (DomainError::InvalidSlot("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::SlotUnavailable("x".into()), StatusCode::CONFLICT),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Storage("db down".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let err = ApiError::from(DomainError::Storage("secret dsn".into()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message.contains("secret"));

        let err = ApiError::from(DomainError::SlotUnavailable("S1@09:00".into()));
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(err.message.contains("S1@09:00"));
    }
}
