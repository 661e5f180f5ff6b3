//! Form CRUD handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use formwright_core::sync::{default_wizard_page, needs_wizard_seed, payload_from_record};
use formwright_types::form::{
    Component, DisplayMode, FormPayload, FormRecord, Settings, StoredForm, public_url,
};

use super::parse_form_id;
use crate::http::error::AppError;
use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct FormRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display: DisplayMode,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub settings: Settings,
}

impl FormRequest {
    /// Normalize into a persisted payload. An empty wizard gets its first
    /// page, as the builder would.
    fn into_payload(self, is_public: bool, user_id: Option<String>) -> FormPayload {
        let mut record = FormRecord::new(self.title);
        record.description = self.description;
        record.display = self.display;
        record.components = self.components;
        record.settings = self.settings;
        record.is_public = is_public;
        if needs_wizard_seed(&record, record.display) {
            record.components.push(default_wizard_page());
        }
        payload_from_record(&record, user_id)
    }
}

fn form_response(
    state: &AppState,
    form: StoredForm,
    start: Instant,
) -> Json<ApiResponse<StoredForm>> {
    let elapsed = start.elapsed().as_millis() as u64;
    let id = form.id;
    let is_public = form.payload.is_public;

    let mut resp = ApiResponse::success(form, request_id(), elapsed)
        .with_link("self", &format!("/api/v1/forms/{id}"));
    if is_public {
        resp = resp.with_link("public", &public_url(&state.config.origin, &id));
    }
    Json(resp)
}

/// GET /api/v1/forms - List forms, most recently updated first.
pub async fn list_forms(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StoredForm>>>, AppError> {
    let start = Instant::now();
    let forms = state.form_service.list_forms().await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(forms, request_id(), elapsed).with_link("self", "/api/v1/forms"),
    ))
}

/// POST /api/v1/forms - Create a form. New forms start unpublished.
pub async fn create_form(
    State(state): State<AppState>,
    Json(body): Json<FormRequest>,
) -> Result<Json<ApiResponse<StoredForm>>, AppError> {
    let start = Instant::now();
    let payload = body.into_payload(false, state.user.clone());
    let form = state.form_service.create_form(&payload).await?;
    Ok(form_response(&state, form, start))
}

/// GET /api/v1/forms/{id} - Get a form by ID.
pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredForm>>, AppError> {
    let start = Instant::now();
    let form = state.form_service.get_form(&parse_form_id(&id)?).await?;
    Ok(form_response(&state, form, start))
}

/// PUT /api/v1/forms/{id} - Replace a form's definition. The public flag
/// is kept; use the publish routes to change it.
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FormRequest>,
) -> Result<Json<ApiResponse<StoredForm>>, AppError> {
    let start = Instant::now();
    let id = parse_form_id(&id)?;
    let current = state.form_service.get_form(&id).await?;

    let payload = body.into_payload(current.payload.is_public, state.user.clone());
    let form = state.form_service.update_form(&id, &payload).await?;
    Ok(form_response(&state, form, start))
}

/// POST /api/v1/forms/{id}/publish - Publish a form.
pub async fn publish_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredForm>>, AppError> {
    set_public(state, id, true).await
}

/// DELETE /api/v1/forms/{id}/publish - Withdraw a published form.
pub async fn unpublish_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredForm>>, AppError> {
    set_public(state, id, false).await
}

async fn set_public(
    state: AppState,
    id: String,
    is_public: bool,
) -> Result<Json<ApiResponse<StoredForm>>, AppError> {
    let start = Instant::now();
    let id = parse_form_id(&id)?;
    let form = state.form_service.set_public(&id, is_public).await?;
    tracing::info!(%id, is_public, "Form visibility changed");
    Ok(form_response(&state, form, start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_types::error::FormError;
    use serde_json::json;

    fn request(value: serde_json::Value) -> FormRequest {
        serde_json::from_value(value).unwrap()
    }

    async fn create(state: &AppState, body: serde_json::Value) -> StoredForm {
        let Json(resp) = create_form(State(state.clone()), Json(request(body)))
            .await
            .unwrap();
        resp.data.unwrap()
    }

    #[tokio::test]
    async fn create_defaults_to_form_display() {
        let state = AppState::ephemeral();
        let form = create(&state, json!({ "title": "Contact" })).await;

        assert_eq!(form.payload.display_type, DisplayMode::Form);
        assert!(form.payload.schema.components.is_empty());
        assert_eq!(form.payload.schema.kind, "form");
        assert!(!form.payload.is_public);
    }

    #[tokio::test]
    async fn create_empty_wizard_is_seeded() {
        let state = AppState::ephemeral();
        let form = create(&state, json!({ "title": "Survey", "display": "wizard" })).await;
        assert_eq!(form.payload.schema.components.len(), 1);
        assert_eq!(form.payload.schema.components[0].key, "page1");
    }

    #[tokio::test]
    async fn create_blank_title_fails() {
        let state = AppState::ephemeral();
        let err = create_form(State(state), Json(request(json!({ "title": "" }))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Form(FormError::EmptyTitle)));
    }

    #[tokio::test]
    async fn update_keeps_public_flag() {
        let state = AppState::ephemeral();
        let form = create(&state, json!({ "title": "Contact" })).await;
        let id = form.id.to_string();
        publish_form(State(state.clone()), Path(id.clone())).await.unwrap();

        let Json(resp) = update_form(
            State(state.clone()),
            Path(id.clone()),
            Json(request(json!({
                "title": "Contact us",
                "components": [{ "type": "textfield", "key": "email" }]
            }))),
        )
        .await
        .unwrap();

        let updated = resp.data.unwrap();
        assert!(updated.payload.is_public);
        assert_eq!(updated.payload.name, "Contact us");
        assert!(resp.links.contains_key("public"));
    }

    #[tokio::test]
    async fn get_with_malformed_id_is_not_found() {
        let state = AppState::ephemeral();
        let err = get_form(State(state), Path("nope".to_string())).await.unwrap_err();
        assert!(matches!(err, AppError::Form(FormError::NotFound)));
    }

    #[tokio::test]
    async fn list_returns_created_forms() {
        let state = AppState::ephemeral();
        create(&state, json!({ "title": "One" })).await;
        create(&state, json!({ "title": "Two" })).await;

        let Json(resp) = list_forms(State(state)).await.unwrap();
        assert_eq!(resp.data.unwrap().len(), 2);
    }
}
