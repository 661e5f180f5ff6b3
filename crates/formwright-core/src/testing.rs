//! Hand-written fakes for the core ports, shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Notify;

use formwright_types::error::{CollaboratorError, RepositoryError, WidgetError};
use formwright_types::form::{DisplayMode, FormId, FormPayload, SchemaDocument, StoredForm};
use formwright_types::widget::{WidgetConfig, WidgetEvent, WidgetEventKind};

use crate::editor::{AuthContext, Clipboard, Collaborators, Navigator, Notice, Notifier};
use crate::panel::SidePanel;
use crate::preview::{PreviewRenderer, SubmitHandler, Submission};
use crate::repository::FormRepository;
use crate::widget::document::Document;
use crate::widget::{SubscriptionId, WidgetHandle, WidgetHost, WidgetListener, WidgetSubscriptions};

// ---------------------------------------------------------------------------
// Widget host
// ---------------------------------------------------------------------------

/// Widget host that builds in-memory widgets and counts live instances.
pub(crate) struct FakeHost {
    document: Arc<Document>,
    next_instance: AtomicU64,
    alive: Arc<AtomicUsize>,
    max_alive: Arc<AtomicUsize>,
    constructed: AtomicUsize,
    fail: AtomicBool,
    failing_modes: Mutex<HashSet<DisplayMode>>,
    gates: Mutex<HashMap<DisplayMode, Arc<Notify>>>,
    widgets: Mutex<Vec<FakeWidget>>,
    last_config: Mutex<Option<WidgetConfig>>,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self {
            document: Arc::new(Document::new()),
            next_instance: AtomicU64::new(1),
            alive: Arc::new(AtomicUsize::new(0)),
            max_alive: Arc::new(AtomicUsize::new(0)),
            constructed: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            failing_modes: Mutex::new(HashSet::new()),
            gates: Mutex::new(HashMap::new()),
            widgets: Mutex::new(Vec::new()),
            last_config: Mutex::new(None),
        }
    }

    pub(crate) fn alive(&self) -> usize {
        self.alive.load(Ordering::SeqCst)
    }

    pub(crate) fn alive_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.alive)
    }

    pub(crate) fn max_alive(&self) -> usize {
        self.max_alive.load(Ordering::SeqCst)
    }

    pub(crate) fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_constructions(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Fail every construction for `display` only.
    pub(crate) fn fail_mode(&self, display: DisplayMode) {
        self.failing_modes.lock().unwrap().insert(display);
    }

    /// Hold the next construction for `display` until the returned gate
    /// is notified.
    pub(crate) fn hold(&self, display: DisplayMode) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(display, Arc::clone(&gate));
        gate
    }

    pub(crate) fn latest(&self) -> Option<FakeWidget> {
        self.widgets.lock().unwrap().last().cloned()
    }

    pub(crate) fn last_config(&self) -> Option<WidgetConfig> {
        self.last_config.lock().unwrap().clone()
    }
}

impl WidgetHost for FakeHost {
    type Handle = FakeWidget;

    fn construct(
        &self,
        config: WidgetConfig,
    ) -> impl Future<Output = Result<FakeWidget, WidgetError>> + Send {
        let gate = self.gates.lock().unwrap().remove(&config.display);
        *self.last_config.lock().unwrap() = Some(config.clone());
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let failing = self.failing_modes.lock().unwrap().contains(&config.display);
            if failing || self.fail.load(Ordering::SeqCst) {
                return Err(WidgetError::Construction("container missing".to_string()));
            }

            let instance = self.next_instance.fetch_add(1, Ordering::SeqCst);
            let panel = Arc::new(SidePanel::new(
                Arc::clone(&self.document),
                instance,
                &config.builder.groups,
            ));
            panel.add_icon(config.builder.default_group, "fa-cube");
            panel.add_icon(config.builder.default_group, "fa-cube");

            let now = self.alive.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_alive.fetch_max(now, Ordering::SeqCst);
            self.constructed.fetch_add(1, Ordering::SeqCst);

            let widget = FakeWidget(Arc::new(FakeWidgetInner {
                instance,
                subscriptions: WidgetSubscriptions::new(),
                panel,
                destroyed: AtomicBool::new(false),
                fail_destroy: AtomicBool::new(false),
                alive: Arc::clone(&self.alive),
            }));
            self.widgets.lock().unwrap().push(widget.clone());
            Ok(widget)
        }
    }
}

pub(crate) struct FakeWidgetInner {
    instance: u64,
    subscriptions: WidgetSubscriptions,
    panel: Arc<SidePanel>,
    destroyed: AtomicBool,
    fail_destroy: AtomicBool,
    alive: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub(crate) struct FakeWidget(Arc<FakeWidgetInner>);

impl FakeWidget {
    /// Emit `event` to current subscribers, as the widget would while the
    /// user edits. A destroyed widget emits nothing.
    pub(crate) fn emit(&self, event: &WidgetEvent) -> usize {
        if self.0.destroyed.load(Ordering::SeqCst) {
            return 0;
        }
        self.0.subscriptions.emit(event)
    }

    pub(crate) fn fail_destroy(&self) {
        self.0.fail_destroy.store(true, Ordering::SeqCst);
    }
}

impl WidgetHandle for FakeWidget {
    fn instance_id(&self) -> u64 {
        self.0.instance
    }

    fn subscribe(&self, kind: WidgetEventKind, listener: WidgetListener) -> SubscriptionId {
        self.0.subscriptions.subscribe(kind, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.0.subscriptions.unsubscribe(id);
    }

    fn panel(&self) -> Option<Arc<SidePanel>> {
        Some(Arc::clone(&self.0.panel))
    }

    fn destroy(&self) -> Result<(), WidgetError> {
        if self.0.destroyed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.0.subscriptions.clear();
        self.0.alive.fetch_sub(1, Ordering::SeqCst);
        if self.0.fail_destroy.load(Ordering::SeqCst) {
            return Err(WidgetError::Destroy("detached node".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// In-memory form repository with switchable write failures.
#[derive(Clone, Default)]
pub(crate) struct MemoryRepo {
    forms: Arc<Mutex<HashMap<FormId, StoredForm>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryRepo {
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn stored(&self, id: &FormId) -> Option<StoredForm> {
        self.forms.lock().unwrap().get(id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.forms.lock().unwrap().len()
    }

    /// Seed a form directly, bypassing failure injection.
    pub(crate) fn insert(&self, payload: FormPayload) -> StoredForm {
        let now = Utc::now();
        let stored = StoredForm {
            id: FormId::new(),
            payload,
            created_at: now,
            updated_at: now,
        };
        self.forms.lock().unwrap().insert(stored.id, stored.clone());
        stored
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        Ok(())
    }
}

impl FormRepository for MemoryRepo {
    async fn get(&self, id: &FormId) -> Result<Option<StoredForm>, RepositoryError> {
        Ok(self.stored(id))
    }

    async fn create(&self, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        self.check_writable()?;
        Ok(self.insert(payload.clone()))
    }

    async fn update(&self, id: &FormId, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        self.check_writable()?;
        let mut forms = self.forms.lock().unwrap();
        let existing = forms.get_mut(id).ok_or(RepositoryError::NotFound)?;
        existing.payload = payload.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn list(&self) -> Result<Vec<StoredForm>, RepositoryError> {
        let mut forms: Vec<StoredForm> = self.forms.lock().unwrap().values().cloned().collect();
        forms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(forms)
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub(crate) fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap().last().cloned()
    }

    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), CollaboratorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("notifier", "toast container missing"));
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) -> Result<(), CollaboratorError> {
        self.paths.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeClipboard {
    contents: Mutex<Option<String>>,
    fail: AtomicBool,
}

impl FakeClipboard {
    pub(crate) fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }

    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Clipboard for FakeClipboard {
    fn copy(&self, text: &str) -> Result<(), CollaboratorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("clipboard", "permission denied"));
        }
        *self.contents.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

pub(crate) struct StaticUser(pub &'static str);

impl AuthContext for StaticUser {
    fn current_user(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}

/// Preview renderer that records open/close calls and keeps the submit
/// handler so tests can submit as the rendered form would.
#[derive(Default)]
pub(crate) struct RecordingPreview {
    opened: AtomicUsize,
    closed: AtomicUsize,
    handler: Mutex<Option<SubmitHandler>>,
    schema: Mutex<Option<SchemaDocument>>,
}

impl RecordingPreview {
    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn schema(&self) -> Option<SchemaDocument> {
        self.schema.lock().unwrap().clone()
    }

    pub(crate) fn submit(&self, raw: Map<String, Value>) -> Option<Submission> {
        let handler = self.handler.lock().unwrap().clone()?;
        Some(handler(raw))
    }
}

impl PreviewRenderer for RecordingPreview {
    fn open(&self, schema: &SchemaDocument, on_submit: SubmitHandler) {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.schema.lock().unwrap() = Some(schema.clone());
        *self.handler.lock().unwrap() = Some(on_submit);
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.handler.lock().unwrap().take();
    }
}

/// One of each recording collaborator.
#[derive(Default)]
pub(crate) struct Fakes {
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub clipboard: Arc<FakeClipboard>,
    pub preview: Arc<RecordingPreview>,
}

impl Fakes {
    pub(crate) fn collaborators(&self) -> Collaborators {
        Collaborators {
            notifier: self.notifier.clone(),
            navigator: self.navigator.clone(),
            auth: Arc::new(StaticUser("user-1")),
            clipboard: self.clipboard.clone(),
            preview: self.preview.clone(),
        }
    }
}
