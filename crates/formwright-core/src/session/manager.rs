//! Builder session lifecycle.
//!
//! The manager is the single owner of the live widget instance. Entering
//! an edit session always tears down the previous one first, and every
//! construction is stamped with a generation so a construction that
//! resolves after being superseded is destroyed instead of installed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use formwright_types::config::EditorConfig;
use formwright_types::error::SessionError;
use formwright_types::event::EditorEvent;
use formwright_types::form::DisplayMode;
use formwright_types::widget::{BuilderOptions, WidgetEvent, WidgetEventKind};

use super::store::SchemaStore;
use crate::event::EventBus;
use crate::panel::AccordionController;
use crate::widget::namespace::{self, WidgetNamespace};
use crate::widget::{SubscriptionId, WidgetHandle, WidgetHost, WidgetListener, guarded_invoke, shim};

/// Where the editing sub-lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoSession,
    Pending { generation: u64, display: DisplayMode },
    Active { generation: u64, display: DisplayMode },
}

/// How a successful construction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The widget is now the active session.
    Installed { generation: u64 },
    /// A later exit or enter superseded this construction. A widget that
    /// arrived was destroyed; a failure was ignored.
    Superseded { generation: u64 },
}

struct ActiveSession<W> {
    generation: u64,
    handle: W,
    subscriptions: Vec<SubscriptionId>,
}

struct Slot<W> {
    phase: SessionPhase,
    active: Option<ActiveSession<W>>,
}

const SCHEMA_EVENTS: [WidgetEventKind; 3] = [
    WidgetEventKind::Change,
    WidgetEventKind::SaveComponent,
    WidgetEventKind::DeleteComponent,
];

pub struct SessionManager<H: WidgetHost> {
    host: H,
    namespace: Arc<WidgetNamespace>,
    store: SchemaStore,
    accordion: AccordionController,
    events: EventBus,
    builder: BuilderOptions,
    next_generation: AtomicU64,
    /// Generation of the installed session, 0 when none.
    live: Arc<AtomicU64>,
    slot: Mutex<Slot<H::Handle>>,
}

impl<H: WidgetHost> SessionManager<H> {
    /// A manager bound to the process-wide widget namespace.
    pub fn new(host: H, store: SchemaStore, config: &EditorConfig, events: EventBus) -> Self {
        Self::with_namespace(host, store, config, events, namespace::global())
    }

    pub fn with_namespace(
        host: H,
        store: SchemaStore,
        config: &EditorConfig,
        events: EventBus,
        namespace: Arc<WidgetNamespace>,
    ) -> Self {
        Self {
            host,
            namespace,
            store,
            accordion: AccordionController::new(config.default_group),
            events,
            builder: config.builder_options(),
            next_generation: AtomicU64::new(0),
            live: Arc::new(AtomicU64::new(0)),
            slot: Mutex::new(Slot {
                phase: SessionPhase::NoSession,
                active: None,
            }),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    pub fn accordion(&self) -> &AccordionController {
        &self.accordion
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn namespace(&self) -> &Arc<WidgetNamespace> {
        &self.namespace
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase(), SessionPhase::Active { .. })
    }

    /// Instance id of the installed widget, if any.
    pub fn active_instance(&self) -> Option<u64> {
        self.lock().active.as_ref().map(|a| a.handle.instance_id())
    }

    /// Tear down any current session and construct a new widget for
    /// `mode`.
    ///
    /// The shim is applied before the first construction. The previous
    /// session is destroyed before this one starts, so two sessions never
    /// overlap. A construction that resolves after a newer session began
    /// is discarded, even when it failed.
    pub async fn enter_edit_session(
        &self,
        mode: DisplayMode,
    ) -> Result<SessionOutcome, SessionError> {
        shim::ensure_applied(&self.namespace);
        self.exit_session();

        let generation = self.next_generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.lock().phase = SessionPhase::Pending {
            generation,
            display: mode,
        };

        let config = self
            .store
            .prepare_widget_config(mode, self.builder.clone());
        tracing::debug!(
            generation,
            display = %mode,
            components = config.components.len(),
            "Constructing builder widget"
        );

        let result = self.host.construct(config).await;

        let mut slot = self.lock();
        let current = matches!(
            slot.phase,
            SessionPhase::Pending { generation: g, .. } if g == generation
        );

        let handle = match result {
            Ok(handle) => handle,
            Err(e) if !current => {
                drop(slot);
                tracing::debug!(generation, error = %e, "Superseded widget construction failed");
                self.events
                    .publish(EditorEvent::SessionDiscarded { generation });
                return Ok(SessionOutcome::Superseded { generation });
            }
            Err(e) => {
                slot.phase = SessionPhase::NoSession;
                drop(slot);
                tracing::warn!(
                    generation,
                    display = %mode,
                    error = %e,
                    "Builder widget construction failed"
                );
                return Err(SessionError::Construction(e.to_string()));
            }
        };

        if !current {
            drop(slot);
            if let Err(e) = handle.destroy() {
                tracing::warn!(generation, error = %e, "Failed to destroy superseded widget");
            }
            tracing::debug!(generation, "Discarded superseded widget construction");
            self.events
                .publish(EditorEvent::SessionDiscarded { generation });
            return Ok(SessionOutcome::Superseded { generation });
        }

        self.live.store(generation, Ordering::Release);
        let subscriptions = SCHEMA_EVENTS
            .iter()
            .map(|&kind| handle.subscribe(kind, self.schema_listener(generation)))
            .collect();
        if let Some(panel) = handle.panel() {
            self.accordion.attach(&panel, generation);
        }

        let instance = handle.instance_id();
        slot.phase = SessionPhase::Active {
            generation,
            display: mode,
        };
        slot.active = Some(ActiveSession {
            generation,
            handle,
            subscriptions,
        });
        drop(slot);

        tracing::info!(generation, instance, display = %mode, "Builder session started");
        self.events
            .publish(EditorEvent::SessionStarted {
                generation,
                display: mode,
            });
        Ok(SessionOutcome::Installed { generation })
    }

    /// Destroy the current session, if any. Also cancels a pending
    /// construction: it will be discarded when it resolves.
    ///
    /// Destroy errors are logged and swallowed; the handle is always
    /// released.
    pub fn exit_session(&self) {
        let active = {
            let mut slot = self.lock();
            slot.phase = SessionPhase::NoSession;
            slot.active.take()
        };
        let Some(active) = active else {
            return;
        };

        let _ = self.live.compare_exchange(
            active.generation,
            0,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.accordion.detach(active.generation);
        for id in &active.subscriptions {
            active.handle.unsubscribe(*id);
        }
        if let Err(e) = active.handle.destroy() {
            tracing::warn!(generation = active.generation, error = %e, "Widget destroy failed");
        }

        tracing::info!(generation = active.generation, "Builder session ended");
        self.events.publish(EditorEvent::SessionEnded {
            generation: active.generation,
        });
    }

    fn schema_listener(&self, generation: u64) -> WidgetListener {
        let store = self.store.clone();
        let live = Arc::clone(&self.live);
        let events = self.events.clone();
        Arc::new(move |event: &WidgetEvent| {
            if live.load(Ordering::Acquire) != generation {
                tracing::trace!(generation, "Ignored event from stale widget");
                return;
            }
            let Ok(changed) =
                guarded_invoke("schema-sync", || store.apply_widget_schema(event.schema()))
            else {
                return;
            };
            match event {
                WidgetEvent::SaveComponent { component, .. } => {
                    tracing::debug!(key = %component.key, kind = %component.kind, "Component saved");
                }
                WidgetEvent::DeleteComponent { key, .. } => {
                    tracing::debug!(%key, "Component deleted");
                }
                WidgetEvent::Change(_) => {}
            }
            if changed {
                events.publish(EditorEvent::SchemaChanged { generation });
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slot<H::Handle>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: WidgetHost> Drop for SessionManager<H> {
    fn drop(&mut self) {
        self.exit_session();
    }
}

impl<H: WidgetHost> std::fmt::Debug for SessionManager<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("phase", &self.phase())
            .field("store", &self.store)
            .finish()
    }
}
