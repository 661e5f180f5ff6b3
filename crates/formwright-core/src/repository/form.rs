//! Form repository trait definition.

use formwright_types::error::RepositoryError;
use formwright_types::form::{FormId, FormPayload, StoredForm};

/// Repository trait for form persistence.
///
/// Implementations live in formwright-infra (e.g., SqliteFormRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait FormRepository: Send + Sync {
    /// Get a form by its ID. `None` if no such form exists.
    fn get(
        &self,
        id: &FormId,
    ) -> impl std::future::Future<Output = Result<Option<StoredForm>, RepositoryError>> + Send;

    /// Store a new form. The repository assigns the ID.
    fn create(
        &self,
        payload: &FormPayload,
    ) -> impl std::future::Future<Output = Result<StoredForm, RepositoryError>> + Send;

    /// Replace an existing form wholesale.
    ///
    /// Returns `RepositoryError::NotFound` if the ID is unknown.
    fn update(
        &self,
        id: &FormId,
        payload: &FormPayload,
    ) -> impl std::future::Future<Output = Result<StoredForm, RepositoryError>> + Send;

    /// List all forms, most recently updated first.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<StoredForm>, RepositoryError>> + Send;
}
