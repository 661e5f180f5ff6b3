//! The schema store: the single in-memory `FormRecord` a mount edits.
//!
//! Shared between the editor and the widget listeners of the active
//! session. Cloning the store shares the record.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use formwright_types::form::{DisplayMode, FormId, FormRecord, public_url};
use formwright_types::widget::{BuilderOptions, WidgetConfig, WidgetSchema};

use crate::sync;

#[derive(Clone)]
pub struct SchemaStore {
    record: Arc<Mutex<FormRecord>>,
}

impl SchemaStore {
    pub fn new(record: FormRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
        }
    }

    pub fn snapshot(&self) -> FormRecord {
        self.lock().clone()
    }

    pub fn replace(&self, record: FormRecord) {
        *self.lock() = record;
    }

    pub fn id(&self) -> Option<FormId> {
        self.lock().id
    }

    pub fn set_id(&self, id: FormId) {
        self.lock().id = Some(id);
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    /// Set the title and re-derive name and path.
    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().retitle(title);
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.lock().description = description.into();
    }

    pub fn display(&self) -> DisplayMode {
        self.lock().display
    }

    pub fn set_display(&self, display: DisplayMode) {
        self.lock().display = display;
    }

    /// Set the public flag and the matching URL. Requires an id when
    /// publishing; returns the new URL.
    pub fn set_public(&self, is_public: bool, origin: &str) -> Option<String> {
        let mut record = self.lock();
        record.is_public = is_public;
        record.public_url = match (is_public, record.id) {
            (true, Some(id)) => Some(public_url(origin, &id)),
            _ => None,
        };
        record.public_url.clone()
    }

    /// Merge a schema emitted by the widget. The title is never touched.
    pub fn apply_widget_schema(&self, schema: &WidgetSchema) -> bool {
        sync::apply_widget_schema(&mut self.lock(), schema)
    }

    /// Switch the record to `display` and build the widget configuration
    /// for it. An empty wizard is seeded in the store itself, so the
    /// default page is persisted by the next save.
    pub fn prepare_widget_config(
        &self,
        display: DisplayMode,
        builder: BuilderOptions,
    ) -> WidgetConfig {
        let mut record = self.lock();
        if sync::needs_wizard_seed(&record, display) {
            record.components = vec![sync::default_wizard_page()];
        }
        record.display = display;
        sync::widget_config(&record, display, builder)
    }

    fn lock(&self) -> MutexGuard<'_, FormRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new(FormRecord::new(""))
    }
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let record = self.lock();
        f.debug_struct("SchemaStore")
            .field("id", &record.id)
            .field("title", &record.title)
            .field("display", &record.display)
            .field("components", &record.components.len())
            .finish()
    }
}
