//! REST API handler modules.

pub mod form;
pub mod public;

use axum::Json;
use serde_json::{Value, json};

use formwright_types::form::FormId;

use crate::http::error::AppError;

/// GET /health - Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Parse a path segment as a form ID. A malformed ID is reported as a
/// missing form.
pub(crate) fn parse_form_id(raw: &str) -> Result<FormId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Form(formwright_types::error::FormError::NotFound))
}
