//! Form persistence service.
//!
//! Validates payloads and maps repository failures into `FormError` so
//! the editor, the CLI, and the HTTP layer share one set of rules.

use formwright_types::error::{FormError, RepositoryError};
use formwright_types::form::{FormId, FormPayload, StoredForm};

use crate::repository::FormRepository;

/// Service over a [`FormRepository`].
pub struct FormService<R: FormRepository> {
    repo: R,
}

impl<R: FormRepository> FormService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn get_form(&self, id: &FormId) -> Result<StoredForm, FormError> {
        self.repo
            .get(id)
            .await
            .map_err(|e| FormError::LoadFailed(e.to_string()))?
            .ok_or(FormError::NotFound)
    }

    pub async fn list_forms(&self) -> Result<Vec<StoredForm>, FormError> {
        self.repo
            .list()
            .await
            .map_err(|e| FormError::LoadFailed(e.to_string()))
    }

    /// Persist a new form. The name (the title) must not be blank.
    pub async fn create_form(&self, payload: &FormPayload) -> Result<StoredForm, FormError> {
        validate(payload)?;
        let stored = self.repo.create(payload).await.map_err(storage_error)?;
        tracing::info!(id = %stored.id, name = %stored.payload.name, "Form created");
        Ok(stored)
    }

    /// Overwrite an existing form wholesale.
    pub async fn update_form(
        &self,
        id: &FormId,
        payload: &FormPayload,
    ) -> Result<StoredForm, FormError> {
        validate(payload)?;
        let stored = self.repo.update(id, payload).await.map_err(storage_error)?;
        tracing::info!(%id, name = %stored.payload.name, "Form updated");
        Ok(stored)
    }

    /// Flip the public flag of a stored form.
    pub async fn set_public(&self, id: &FormId, is_public: bool) -> Result<StoredForm, FormError> {
        let mut payload = self.get_form(id).await?.payload;
        payload.is_public = is_public;
        self.update_form(id, &payload).await
    }

    /// A form as served to the public: only when it is published.
    pub async fn public_form(&self, id: &FormId) -> Result<StoredForm, FormError> {
        let stored = self.get_form(id).await?;
        if !stored.payload.is_public {
            return Err(FormError::NotPublic);
        }
        Ok(stored)
    }
}

fn validate(payload: &FormPayload) -> Result<(), FormError> {
    if payload.name.trim().is_empty() {
        return Err(FormError::EmptyTitle);
    }
    Ok(())
}

fn storage_error(e: RepositoryError) -> FormError {
    match e {
        RepositoryError::NotFound => FormError::NotFound,
        other => FormError::StorageError(other.to_string()),
    }
}
