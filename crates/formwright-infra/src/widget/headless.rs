//! A widget host with no rendering surface.
//!
//! `HeadlessHost` builds widgets that keep the component tree in memory and
//! emit the same events a browser-hosted builder would. The CLI and the
//! HTTP server drive edits through [`HeadlessWidget`] methods.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use formwright_core::panel::SidePanel;
use formwright_core::widget::{
    Document, SubscriptionId, WidgetHandle, WidgetHost, WidgetListener, WidgetSubscriptions,
};
use formwright_types::error::WidgetError;
use formwright_types::form::{Component, Settings};
use formwright_types::widget::{
    GroupCategory, WidgetConfig, WidgetEvent, WidgetEventKind, WidgetSchema,
};

/// Palette icon rendered for each section.
fn section_icon(group: GroupCategory) -> &'static str {
    match group {
        GroupCategory::Basic => "fa-terminal",
        GroupCategory::Advanced => "fa-cogs",
        GroupCategory::Layout => "fa-columns",
        GroupCategory::Data => "fa-table",
    }
}

/// Instance ids are unique per process since hosts may share a document.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

pub struct HeadlessHost {
    document: Arc<Document>,
    alive: Arc<AtomicUsize>,
    current: Mutex<Option<HeadlessWidget>>,
}

impl HeadlessHost {
    /// Host rendering panels into `document`, normally the widget
    /// namespace's document.
    pub fn new(document: Arc<Document>) -> Self {
        Self {
            document,
            alive: Arc::new(AtomicUsize::new(0)),
            current: Mutex::new(None),
        }
    }

    /// Number of constructed widgets not yet destroyed.
    pub fn alive(&self) -> usize {
        self.alive.load(Ordering::SeqCst)
    }

    /// Most recently constructed widget, if it is still alive.
    pub fn current(&self) -> Option<HeadlessWidget> {
        self.lock_current()
            .as_ref()
            .filter(|w| !w.is_destroyed())
            .cloned()
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<HeadlessWidget>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WidgetHost for HeadlessHost {
    type Handle = HeadlessWidget;

    fn construct(
        &self,
        config: WidgetConfig,
    ) -> impl Future<Output = Result<HeadlessWidget, WidgetError>> + Send {
        async move {
            if config.builder.groups.is_empty() {
                return Err(WidgetError::Construction("no palette groups".to_string()));
            }

            let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
            let panel = Arc::new(SidePanel::new(
                Arc::clone(&self.document),
                instance,
                &config.builder.groups,
            ));
            for &group in &config.builder.groups {
                panel.add_icon(group, section_icon(group));
            }

            let widget = HeadlessWidget(Arc::new(WidgetInner {
                instance,
                canvas: Mutex::new(Canvas::from_config(&config)),
                subscriptions: WidgetSubscriptions::new(),
                panel,
                destroyed: AtomicBool::new(false),
                alive: Arc::clone(&self.alive),
            }));
            self.alive.fetch_add(1, Ordering::SeqCst);
            *self.lock_current() = Some(widget.clone());

            tracing::debug!(
                instance,
                display = %config.display,
                components = config.components.len(),
                "Headless widget constructed"
            );
            Ok(widget)
        }
    }
}

/// The schema as the widget currently holds it.
#[derive(Debug, Clone)]
struct Canvas {
    name: String,
    path: String,
    display: formwright_types::form::DisplayMode,
    components: Vec<Component>,
    settings: Settings,
}

impl Canvas {
    fn from_config(config: &WidgetConfig) -> Self {
        Self {
            name: config.name.clone(),
            path: config.path.clone(),
            display: config.display,
            components: config.components.clone(),
            settings: config.settings.clone(),
        }
    }

    fn schema(&self) -> WidgetSchema {
        WidgetSchema {
            title: None,
            name: Some(self.name.clone()),
            path: Some(self.path.clone()),
            display: Some(self.display),
            components: Some(self.components.clone()),
            settings: Some(self.settings.clone()),
        }
    }
}

struct WidgetInner {
    instance: u64,
    canvas: Mutex<Canvas>,
    subscriptions: WidgetSubscriptions,
    panel: Arc<SidePanel>,
    destroyed: AtomicBool,
    alive: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct HeadlessWidget(Arc<WidgetInner>);

impl HeadlessWidget {
    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.load(Ordering::SeqCst)
    }

    pub fn components(&self) -> Vec<Component> {
        self.canvas().components.clone()
    }

    /// Add `component` at the top level, or inside the container keyed
    /// `parent`. An existing component with the same key is replaced.
    pub fn save_component(
        &self,
        component: Component,
        parent: Option<&str>,
    ) -> Result<(), WidgetError> {
        self.ensure_live()?;
        let schema = {
            let mut canvas = self.canvas();
            // Edit a copy so a failed parent lookup leaves the canvas intact.
            let mut components = canvas.components.clone();
            remove_by_key(&mut components, &component.key);
            let siblings = match parent {
                Some(key) => find_mut(&mut components, key)
                    .map(Component::children_mut)
                    .ok_or_else(|| WidgetError::Request(format!("no container '{key}'")))?,
                None => &mut components,
            };
            siblings.push(component.clone());
            canvas.components = components;
            canvas.schema()
        };
        self.0.subscriptions.emit(&WidgetEvent::SaveComponent {
            component,
            schema: schema.clone(),
        });
        self.0.subscriptions.emit(&WidgetEvent::Change(schema));
        Ok(())
    }

    /// Remove the component keyed `key` wherever it sits. Returns false
    /// if no such component exists.
    pub fn delete_component(&self, key: &str) -> Result<bool, WidgetError> {
        self.ensure_live()?;
        let schema = {
            let mut canvas = self.canvas();
            if !remove_by_key(&mut canvas.components, key) {
                return Ok(false);
            }
            canvas.schema()
        };
        self.0.subscriptions.emit(&WidgetEvent::DeleteComponent {
            key: key.to_string(),
            schema: schema.clone(),
        });
        self.0.subscriptions.emit(&WidgetEvent::Change(schema));
        Ok(true)
    }

    /// Replace the form-level settings.
    pub fn set_settings(&self, settings: Settings) -> Result<(), WidgetError> {
        self.ensure_live()?;
        let schema = {
            let mut canvas = self.canvas();
            canvas.settings = settings;
            canvas.schema()
        };
        self.0.subscriptions.emit(&WidgetEvent::Change(schema));
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), WidgetError> {
        if self.is_destroyed() {
            return Err(WidgetError::Request(format!(
                "widget {} was destroyed",
                self.0.instance
            )));
        }
        Ok(())
    }

    fn canvas(&self) -> MutexGuard<'_, Canvas> {
        self.0.canvas.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HeadlessWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessWidget")
            .field("instance", &self.0.instance)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

impl WidgetHandle for HeadlessWidget {
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
        tracing::debug!(instance = self.0.instance, "Headless widget destroyed");
        Ok(())
    }
}

fn find_mut<'a>(components: &'a mut [Component], key: &str) -> Option<&'a mut Component> {
    for component in components.iter_mut() {
        if component.key == key {
            return Some(component);
        }
        if let Some(found) = component
            .components
            .as_deref_mut()
            .and_then(|children| find_mut(children, key))
        {
            return Some(found);
        }
    }
    None
}

fn remove_by_key(components: &mut Vec<Component>, key: &str) -> bool {
    if let Some(pos) = components.iter().position(|c| c.key == key) {
        components.remove(pos);
        return true;
    }
    components.iter_mut().any(|c| {
        c.components
            .as_mut()
            .is_some_and(|children| remove_by_key(children, key))
    })
}
