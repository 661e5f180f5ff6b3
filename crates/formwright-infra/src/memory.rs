//! In-memory form repository.
//!
//! Backs `fwr serve --ephemeral` and any embedding that does not want a
//! database file. Values are cloned on read so no `DashMap` guard outlives
//! a call.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use formwright_core::repository::FormRepository;
use formwright_types::error::RepositoryError;
use formwright_types::form::{FormId, FormPayload, StoredForm};

/// Concurrent in-memory implementation of `FormRepository`.
#[derive(Clone, Default)]
pub struct InMemoryFormRepository {
    forms: Arc<DashMap<FormId, StoredForm>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl FormRepository for InMemoryFormRepository {
    async fn get(&self, id: &FormId) -> Result<Option<StoredForm>, RepositoryError> {
        Ok(self.forms.get(id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        let now = Utc::now();
        let stored = StoredForm {
            id: FormId::new(),
            payload: payload.clone(),
            created_at: now,
            updated_at: now,
        };
        self.forms.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &FormId, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        let mut entry = self.forms.get_mut(id).ok_or(RepositoryError::NotFound)?;
        entry.payload = payload.clone();
        entry.updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    async fn list(&self) -> Result<Vec<StoredForm>, RepositoryError> {
        let mut forms: Vec<StoredForm> = self.forms.iter().map(|e| e.value().clone()).collect();
        forms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(forms)
    }
}
