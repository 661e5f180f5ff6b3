//! Application state wiring storage, services, and editors together.
//!
//! AppState holds the concrete instances used by both CLI and REST API.
//! The core is generic over its ports; this module pins them to the infra
//! implementations.

use std::path::PathBuf;
use std::sync::Arc;

use formwright_core::editor::FormEditor;
use formwright_core::repository::FormRepository;
use formwright_core::service::FormService;
use formwright_core::widget::namespace;
use formwright_infra::collaborators::headless_collaborators;
use formwright_infra::config::load_editor_config;
use formwright_infra::filesystem::{database_url, ensure_data_dir, resolve_data_dir};
use formwright_infra::memory::InMemoryFormRepository;
use formwright_infra::sqlite::{DatabasePool, SqliteFormRepository};
use formwright_infra::widget::HeadlessHost;
use formwright_types::config::EditorConfig;
use formwright_types::error::RepositoryError;
use formwright_types::form::{FormId, FormPayload, StoredForm};

/// Environment variable naming the user stamped on saved forms.
pub const USER_ENV: &str = "FORMWRIGHT_USER";

/// Storage backend selected at startup.
#[derive(Clone)]
pub enum FormStore {
    Sqlite(SqliteFormRepository),
    Memory(InMemoryFormRepository),
}

impl FormRepository for FormStore {
    async fn get(&self, id: &FormId) -> Result<Option<StoredForm>, RepositoryError> {
        match self {
            FormStore::Sqlite(repo) => repo.get(id).await,
            FormStore::Memory(repo) => repo.get(id).await,
        }
    }

    async fn create(&self, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        match self {
            FormStore::Sqlite(repo) => repo.create(payload).await,
            FormStore::Memory(repo) => repo.create(payload).await,
        }
    }

    async fn update(&self, id: &FormId, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        match self {
            FormStore::Sqlite(repo) => repo.update(id, payload).await,
            FormStore::Memory(repo) => repo.update(id, payload).await,
        }
    }

    async fn list(&self) -> Result<Vec<StoredForm>, RepositoryError> {
        match self {
            FormStore::Sqlite(repo) => repo.list().await,
            FormStore::Memory(repo) => repo.list().await,
        }
    }
}

pub type ConcreteFormService = FormService<FormStore>;

pub type ConcreteEditor = FormEditor<FormStore, HeadlessHost>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub form_service: Arc<ConcreteFormService>,
    pub store: FormStore,
    pub config: Arc<EditorConfig>,
    pub data_dir: PathBuf,
    pub user: Option<String>,
}

impl AppState {
    /// Load config and open storage. `ephemeral` keeps everything in memory.
    pub async fn init(ephemeral: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir).await?;
        let config = load_editor_config(&data_dir).await;

        let store = if ephemeral {
            tracing::info!("Using in-memory form store");
            FormStore::Memory(InMemoryFormRepository::new())
        } else {
            let pool = DatabasePool::new(&database_url(&data_dir)).await?;
            FormStore::Sqlite(SqliteFormRepository::new(pool))
        };

        Ok(Self::from_parts(store, config, data_dir))
    }

    pub fn from_parts(store: FormStore, config: EditorConfig, data_dir: PathBuf) -> Self {
        Self {
            form_service: Arc::new(FormService::new(store.clone())),
            store,
            config: Arc::new(config),
            data_dir,
            user: std::env::var(USER_ENV).ok().filter(|u| !u.trim().is_empty()),
        }
    }

    /// A headless editor over this state's storage.
    pub fn editor(&self) -> ConcreteEditor {
        let host = HeadlessHost::new(Arc::clone(namespace::global().document()));
        FormEditor::new(
            (*self.config).clone(),
            self.store.clone(),
            host,
            headless_collaborators(self.user.clone()),
        )
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn ephemeral() -> Self {
        Self::from_parts(
            FormStore::Memory(InMemoryFormRepository::new()),
            EditorConfig::default(),
            std::env::temp_dir(),
        )
    }
}
