//! Public form delivery. Serves only published forms.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use formwright_types::form::{FormId, SchemaDocument};

use super::parse_form_id;
use crate::http::error::AppError;
use crate::state::AppState;

/// What a respondent's renderer needs: no owner, no timestamps.
#[derive(Debug, Serialize)]
pub struct PublicForm {
    pub id: FormId,
    pub title: String,
    pub description: String,
    pub schema: SchemaDocument,
}

/// GET /public/form/{id} - The schema of a published form.
pub async fn get_public_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicForm>, AppError> {
    let form = state.form_service.public_form(&parse_form_id(&id)?).await?;
    Ok(Json(PublicForm {
        id: form.id,
        title: form.payload.name,
        description: form.payload.description,
        schema: form.payload.schema,
    }))
}
