//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use formwright_types::error::FormError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Form load, save, or publish errors.
    Form(FormError),
    /// Malformed request.
    Validation(String),
}

impl From<FormError> for AppError {
    fn from(e: FormError) -> Self {
        AppError::Form(e)
    }
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Form(FormError::NotFound) => (StatusCode::NOT_FOUND, "FORM_NOT_FOUND"),
            // Unpublished forms are indistinguishable from missing ones.
            AppError::Form(FormError::NotPublic) => (StatusCode::NOT_FOUND, "FORM_NOT_FOUND"),
            AppError::Form(FormError::EmptyTitle) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Form(FormError::NotSaved) => (StatusCode::CONFLICT, "FORM_NOT_SAVED"),
            AppError::Form(_) => (StatusCode::INTERNAL_SERVER_ERROR, "FORM_ERROR"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Form(FormError::NotPublic) => "Form not found".to_string(),
            AppError::Form(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": self.message(),
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_public_looks_like_not_found() {
        let err = AppError::from(FormError::NotPublic);
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "FORM_NOT_FOUND"));
        assert_eq!(err.message(), "Form not found");
    }

    #[test]
    fn storage_error_is_internal() {
        let err = AppError::from(FormError::StorageError("disk full".into()));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn empty_title_is_bad_request() {
        let err = AppError::from(FormError::EmptyTitle);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
