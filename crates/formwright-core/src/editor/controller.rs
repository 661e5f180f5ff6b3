//! Root controller for one editor mount.
//!
//! `FormEditor` ties the schema store, the session manager, the preview
//! harness, and the persistence service together. Every failure ends at
//! this boundary as a notification plus a safe state; collaborator
//! failures are logged and never escalate.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use formwright_types::config::EditorConfig;
use formwright_types::error::{FormError, SessionError};
use formwright_types::event::EditorEvent;
use formwright_types::form::{DisplayMode, FormId, FormRecord};

use super::collaborators::{Collaborators, Notice};
use crate::event::EventBus;
use crate::preview::{PreviewHarness, Submission};
use crate::repository::FormRepository;
use crate::service::FormService;
use crate::session::{SchemaStore, SessionManager, SessionOutcome, SessionPhase};
use crate::sync;
use crate::widget::{WidgetHost, WidgetNamespace};

/// Top-level editor state. `Editing` and `Previewing` exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Loading,
    Editing,
    Previewing,
}

pub struct FormEditor<R: FormRepository, H: WidgetHost> {
    config: EditorConfig,
    service: FormService<R>,
    sessions: SessionManager<H>,
    preview: PreviewHarness,
    collaborators: Collaborators,
    events: EventBus,
    mode: Mutex<EditorMode>,
}

impl<R: FormRepository, H: WidgetHost> FormEditor<R, H> {
    pub fn new(config: EditorConfig, repo: R, host: H, collaborators: Collaborators) -> Self {
        let events = EventBus::default();
        let store = SchemaStore::new(FormRecord::new(config.default_title.clone()));
        let sessions = SessionManager::new(host, store, &config, events.clone());
        Self::assemble(config, repo, sessions, collaborators, events)
    }

    /// An editor whose widget lives in `namespace` instead of the
    /// process-wide one.
    pub fn with_namespace(
        config: EditorConfig,
        repo: R,
        host: H,
        collaborators: Collaborators,
        namespace: Arc<WidgetNamespace>,
    ) -> Self {
        let events = EventBus::default();
        let store = SchemaStore::new(FormRecord::new(config.default_title.clone()));
        let sessions =
            SessionManager::with_namespace(host, store, &config, events.clone(), namespace);
        Self::assemble(config, repo, sessions, collaborators, events)
    }

    fn assemble(
        config: EditorConfig,
        repo: R,
        sessions: SessionManager<H>,
        collaborators: Collaborators,
        events: EventBus,
    ) -> Self {
        Self {
            config,
            service: FormService::new(repo),
            sessions,
            preview: PreviewHarness::new(Arc::clone(&collaborators.preview)),
            collaborators,
            events,
            mode: Mutex::new(EditorMode::Loading),
        }
    }

    pub fn mode(&self) -> EditorMode {
        *self.lock_mode()
    }

    pub fn session_phase(&self) -> SessionPhase {
        self.sessions.phase()
    }

    pub fn sessions(&self) -> &SessionManager<H> {
        &self.sessions
    }

    pub fn store(&self) -> &SchemaStore {
        self.sessions.store()
    }

    pub fn record(&self) -> FormRecord {
        self.store().snapshot()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Load form `id`, or start a new one, and open an edit session.
    ///
    /// A load failure is notified and navigates to the list view. A
    /// widget construction failure is notified; the editor stays in edit
    /// mode with no session.
    pub async fn mount(&self, id: Option<FormId>) -> Result<(), FormError> {
        self.sessions.exit_session();
        self.preview.close();
        self.set_mode(EditorMode::Loading);

        let record = match id {
            Some(id) => match self.service.get_form(&id).await {
                Ok(stored) => sync::record_from_stored(&stored, &self.config.origin),
                Err(e) => {
                    tracing::warn!(%id, error = %e, "Failed to load form");
                    self.notify(Notice::error(format!("Failed to load form: {e}")));
                    self.navigate(&self.config.list_path);
                    return Err(e);
                }
            },
            None => FormRecord::new(self.config.default_title.clone()),
        };
        self.store().replace(record);

        self.set_mode(EditorMode::Editing);
        let _ = self.start_session().await;
        Ok(())
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.store().set_title(title);
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.store().set_description(description);
    }

    /// Switch between form and wizard layout.
    ///
    /// The live session is always torn down; a new one is built only
    /// while editing. An open preview is re-rendered in the new layout.
    pub async fn set_display_mode(&self, mode: DisplayMode) -> Result<(), SessionError> {
        self.sessions.exit_session();
        self.store().set_display(mode);
        tracing::debug!(display = %mode, "Display mode changed");
        match self.mode() {
            EditorMode::Editing => {
                self.start_session().await?;
            }
            EditorMode::Previewing => self.preview.open(&self.record()),
            EditorMode::Loading => {}
        }
        Ok(())
    }

    /// Flip between edit and preview mode. Returns the new mode.
    pub async fn toggle_preview(&self) -> Result<EditorMode, SessionError> {
        self.sessions.exit_session();
        match self.mode() {
            EditorMode::Loading => Err(SessionError::NotEditing),
            EditorMode::Editing => {
                self.set_mode(EditorMode::Previewing);
                self.preview.open(&self.record());
                Ok(EditorMode::Previewing)
            }
            EditorMode::Previewing => {
                self.preview.close();
                self.set_mode(EditorMode::Editing);
                self.start_session().await?;
                Ok(EditorMode::Editing)
            }
        }
    }

    /// Persist the record. The first save creates the form and navigates
    /// to its edit view; later saves overwrite it.
    pub async fn save(&self) -> Result<FormId, FormError> {
        let record = self.record();
        if record.title.trim().is_empty() {
            self.notify(Notice::error("Please enter a form title"));
            return Err(FormError::EmptyTitle);
        }

        let payload = sync::payload_from_record(&record, self.collaborators.auth.current_user());
        let result = match record.id {
            Some(id) => self.service.update_form(&id, &payload).await,
            None => self.service.create_form(&payload).await,
        };

        let stored = match result {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save form");
                self.notify(Notice::error(format!("Failed to save form: {e}")));
                return Err(e);
            }
        };

        if record.id.is_none() {
            self.store().set_id(stored.id);
            self.store().set_public(record.is_public, &self.config.origin);
            self.navigate(&self.config.edit_path(&stored.id));
        }
        self.notify(Notice::success("Form saved"));
        self.events.publish(EditorEvent::Saved { id: stored.id });
        Ok(stored.id)
    }

    /// Publish an unpublished form or unpublish a published one.
    /// Returns the new public flag. On failure the flag is restored.
    pub async fn toggle_publish(&self) -> Result<bool, FormError> {
        let record = self.record();
        let Some(id) = record.id else {
            self.notify(Notice::error("Save the form before publishing it"));
            return Err(FormError::NotSaved);
        };

        let is_public = !record.is_public;
        self.store().set_public(is_public, &self.config.origin);
        let payload =
            sync::payload_from_record(&self.record(), self.collaborators.auth.current_user());

        if let Err(e) = self.service.update_form(&id, &payload).await {
            self.store().set_public(record.is_public, &self.config.origin);
            tracing::warn!(%id, error = %e, "Failed to change form visibility");
            self.notify(Notice::error(format!("Failed to update visibility: {e}")));
            return Err(e);
        }

        self.notify(Notice::success(if is_public {
            "Form published"
        } else {
            "Form unpublished"
        }));
        self.events
            .publish(EditorEvent::PublishChanged { id, is_public });
        Ok(is_public)
    }

    /// Copy the public URL to the clipboard.
    pub fn copy_public_url(&self) -> Result<String, FormError> {
        let Some(url) = self.record().public_url else {
            self.notify(Notice::error("Form is not public"));
            return Err(FormError::NotPublic);
        };
        match self.collaborators.clipboard.copy(&url) {
            Ok(()) => {
                self.notify(Notice::success("Public URL copied"));
                Ok(url)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to copy public URL");
                self.notify(Notice::error("Failed to copy URL"));
                Err(FormError::ClipboardFailed(e.to_string()))
            }
        }
    }

    /// Submit data through the open preview.
    pub fn submit_preview(&self, data: Map<String, Value>) -> Result<Submission, FormError> {
        if self.mode() != EditorMode::Previewing {
            return Err(FormError::PreviewClosed);
        }
        let submission = self.preview.submit(data)?;
        self.notify(Notice::info("Form submitted"));
        Ok(submission)
    }

    /// Tear everything down. Leaves no session alive.
    pub fn unmount(&self) {
        self.sessions.exit_session();
        self.preview.close();
        self.set_mode(EditorMode::Loading);
        tracing::debug!("Editor unmounted");
    }

    async fn start_session(&self) -> Result<SessionOutcome, SessionError> {
        let display = self.store().display();
        self.sessions
            .enter_edit_session(display)
            .await
            .inspect_err(|e| {
                self.notify(Notice::error(format!("Failed to open the builder: {e}")));
            })
    }

    fn notify(&self, notice: Notice) {
        if let Err(e) = self.collaborators.notifier.notify(&notice) {
            tracing::warn!(error = %e, message = %notice.message, "Notification failed");
        }
    }

    fn navigate(&self, path: &str) {
        if let Err(e) = self.collaborators.navigator.navigate(path) {
            tracing::warn!(error = %e, %path, "Navigation failed");
        }
    }

    fn set_mode(&self, mode: EditorMode) {
        *self.lock_mode() = mode;
    }

    fn lock_mode(&self) -> MutexGuard<'_, EditorMode> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::NoticeLevel;
    use crate::testing::{FakeHost, Fakes, MemoryRepo};
    use formwright_types::form::Component;
    use formwright_types::widget::{WidgetEvent, WidgetSchema};
    use serde_json::json;

    fn editor(repo: MemoryRepo, fakes: &Fakes) -> FormEditor<MemoryRepo, FakeHost> {
        let config = EditorConfig {
            origin: "https://forms.example.com".to_string(),
            default_title: "New Form".to_string(),
            ..EditorConfig::default()
        };
        FormEditor::with_namespace(
            config,
            repo,
            FakeHost::new(),
            fakes.collaborators(),
            Arc::new(WidgetNamespace::new()),
        )
    }

    #[tokio::test]
    async fn new_form_saves_empty_form_payload() {
        let repo = MemoryRepo::default();
        let fakes = Fakes::default();
        let ed = editor(repo.clone(), &fakes);
        ed.mount(None).await.unwrap();

        assert_eq!(ed.mode(), EditorMode::Editing);
        assert!(matches!(ed.session_phase(), SessionPhase::Active { .. }));

        let id = ed.save().await.unwrap();
        let stored = repo.stored(&id).unwrap();
        let json = serde_json::to_value(&stored.payload).unwrap();
        assert_eq!(json["display_type"], "form");
        assert_eq!(json["schema"]["components"], json!([]));
        assert_eq!(json["user_id"], "user-1");
        assert_eq!(fakes.navigator.paths(), vec![format!("/forms/edit/{id}")]);
    }

    #[tokio::test]
    async fn switching_to_wizard_seeds_and_persists_page() {
        let repo = MemoryRepo::default();
        let fakes = Fakes::default();
        let ed = editor(repo.clone(), &fakes);
        ed.mount(None).await.unwrap();

        ed.set_display_mode(DisplayMode::Wizard).await.unwrap();
        assert_eq!(ed.sessions().host().alive(), 1);

        let id = ed.save().await.unwrap();
        let stored = repo.stored(&id).unwrap();
        assert_eq!(stored.payload.display_type, DisplayMode::Wizard);
        assert_eq!(stored.payload.schema.components.len(), 1);
        assert_eq!(stored.payload.schema.components[0].key, "page1");
    }

    #[tokio::test]
    async fn change_without_title_keeps_user_title() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        ed.set_title("Customer Intake");

        ed.sessions()
            .host()
            .latest()
            .unwrap()
            .emit(&WidgetEvent::Change(WidgetSchema {
                components: Some(vec![Component::new("email", "email")]),
                ..WidgetSchema::default()
            }));

        let record = ed.record();
        assert_eq!(record.title, "Customer Intake");
        assert_eq!(record.components.len(), 1);
    }

    #[tokio::test]
    async fn publish_toggle_sets_and_clears_url() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        let id = ed.save().await.unwrap();

        assert!(ed.toggle_publish().await.unwrap());
        assert_eq!(
            ed.record().public_url,
            Some(format!("https://forms.example.com/public/form/{id}"))
        );

        assert!(!ed.toggle_publish().await.unwrap());
        let record = ed.record();
        assert!(!record.is_public);
        assert_eq!(record.public_url, None);
    }

    #[tokio::test]
    async fn publish_failure_restores_flag() {
        let repo = MemoryRepo::default();
        let fakes = Fakes::default();
        let ed = editor(repo.clone(), &fakes);
        ed.mount(None).await.unwrap();
        ed.save().await.unwrap();

        repo.fail_writes(true);
        assert!(ed.toggle_publish().await.is_err());
        assert!(!ed.record().is_public);
        assert_eq!(ed.record().public_url, None);
        assert_eq!(fakes.notifier.last().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn publish_requires_saved_form() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        assert!(matches!(ed.toggle_publish().await, Err(FormError::NotSaved)));
    }

    #[tokio::test]
    async fn load_failure_notifies_and_navigates_to_list() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        let err = ed.mount(Some(FormId::new())).await.unwrap_err();

        assert!(matches!(err, FormError::NotFound));
        assert_eq!(fakes.navigator.paths(), vec!["/forms".to_string()]);
        assert_eq!(fakes.notifier.last().unwrap().level, NoticeLevel::Error);
        assert_eq!(ed.session_phase(), SessionPhase::NoSession);
    }

    #[tokio::test]
    async fn mount_existing_form_loads_record() {
        let repo = MemoryRepo::default();
        let fakes = Fakes::default();
        let mut record = FormRecord::new("Survey");
        record.display = DisplayMode::Wizard;
        record.components = vec![Component::page("intro", "Intro")];
        let stored = repo.insert(sync::payload_from_record(&record, None));

        let ed = editor(repo, &fakes);
        ed.mount(Some(stored.id)).await.unwrap();

        let loaded = ed.record();
        assert_eq!(loaded.id, Some(stored.id));
        assert_eq!(loaded.title, "Survey");
        assert_eq!(loaded.components[0].key, "intro");
        assert_eq!(
            ed.session_phase(),
            SessionPhase::Active {
                generation: 1,
                display: DisplayMode::Wizard
            }
        );
    }

    #[tokio::test]
    async fn empty_title_save_is_rejected_without_write() {
        let repo = MemoryRepo::default();
        let fakes = Fakes::default();
        let ed = editor(repo.clone(), &fakes);
        ed.mount(None).await.unwrap();
        ed.set_title("  ");

        assert!(matches!(ed.save().await, Err(FormError::EmptyTitle)));
        assert_eq!(repo.len(), 0);
        assert_eq!(ed.record().id, None);
    }

    #[tokio::test]
    async fn save_failure_keeps_state_and_allows_retry() {
        let repo = MemoryRepo::default();
        let fakes = Fakes::default();
        let ed = editor(repo.clone(), &fakes);
        ed.mount(None).await.unwrap();

        repo.fail_writes(true);
        assert!(matches!(ed.save().await, Err(FormError::StorageError(_))));
        assert_eq!(ed.record().id, None);

        repo.fail_writes(false);
        assert!(ed.save().await.is_ok());
    }

    #[tokio::test]
    async fn preview_toggle_tears_down_session() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();

        assert_eq!(ed.toggle_preview().await.unwrap(), EditorMode::Previewing);
        assert_eq!(ed.session_phase(), SessionPhase::NoSession);
        assert_eq!(ed.sessions().host().alive(), 0);

        assert_eq!(ed.toggle_preview().await.unwrap(), EditorMode::Editing);
        assert!(matches!(ed.session_phase(), SessionPhase::Active { .. }));
        assert_eq!(ed.sessions().host().alive(), 1);
    }

    #[tokio::test]
    async fn display_change_in_preview_builds_no_session() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        ed.toggle_preview().await.unwrap();

        ed.set_display_mode(DisplayMode::Wizard).await.unwrap();
        assert_eq!(ed.session_phase(), SessionPhase::NoSession);
        assert_eq!(ed.record().display, DisplayMode::Wizard);

        assert_eq!(fakes.preview.opened(), 2);
        let shown = fakes.preview.schema().unwrap();
        assert_eq!(shown.display, DisplayMode::Wizard);
    }

    #[tokio::test]
    async fn submit_preview_filters_fields() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        ed.sessions()
            .host()
            .latest()
            .unwrap()
            .emit(&WidgetEvent::Change(WidgetSchema {
                components: Some(vec![Component::new("textfield", "name")]),
                ..WidgetSchema::default()
            }));

        assert!(matches!(
            ed.submit_preview(Map::new()),
            Err(FormError::PreviewClosed)
        ));
        ed.toggle_preview().await.unwrap();

        let mut data = Map::new();
        data.insert("name".to_string(), json!("Ada"));
        data.insert("rogue".to_string(), json!(1));
        let submission = ed.submit_preview(data).unwrap();
        assert_eq!(submission.data.len(), 1);
        assert_eq!(submission.ignored, vec!["rogue".to_string()]);
    }

    #[tokio::test]
    async fn copy_public_url_reports_clipboard_outcome() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        assert!(matches!(ed.copy_public_url(), Err(FormError::NotPublic)));

        ed.save().await.unwrap();
        ed.toggle_publish().await.unwrap();
        let url = ed.copy_public_url().unwrap();
        assert_eq!(fakes.clipboard.contents(), Some(url));

        fakes.clipboard.fail(true);
        assert!(matches!(ed.copy_public_url(), Err(FormError::ClipboardFailed(_))));
    }

    #[tokio::test]
    async fn notifier_failure_is_not_fatal() {
        let fakes = Fakes::default();
        fakes.notifier.fail(true);
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        assert!(ed.save().await.is_ok());
    }

    #[tokio::test]
    async fn construction_failure_is_notified() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.sessions().host().fail_constructions(true);
        ed.mount(None).await.unwrap();

        assert_eq!(ed.mode(), EditorMode::Editing);
        assert_eq!(ed.session_phase(), SessionPhase::NoSession);
        assert_eq!(fakes.notifier.last().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn superseded_construction_failure_is_not_notified() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        let form_gate = ed.sessions().host().hold(DisplayMode::Form);
        ed.sessions().host().fail_mode(DisplayMode::Form);

        let (mounted, switched) = tokio::join!(ed.mount(None), async {
            tokio::task::yield_now().await;
            let result = ed.set_display_mode(DisplayMode::Wizard).await;
            form_gate.notify_one();
            result
        });
        mounted.unwrap();
        switched.unwrap();

        assert!(matches!(
            ed.session_phase(),
            SessionPhase::Active {
                display: DisplayMode::Wizard,
                ..
            }
        ));
        assert!(fakes.notifier.last().is_none());
    }

    #[tokio::test]
    async fn unmount_leaves_no_session() {
        let fakes = Fakes::default();
        let ed = editor(MemoryRepo::default(), &fakes);
        ed.mount(None).await.unwrap();
        ed.unmount();
        assert_eq!(ed.session_phase(), SessionPhase::NoSession);
        assert_eq!(ed.sessions().host().alive(), 0);
    }
}
