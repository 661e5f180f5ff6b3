//! Single-expanded-section accordion over the widget's side panel.
//!
//! Exactly one palette section is open once a panel is attached. Clicking
//! a collapsed section's toggle opens it and closes the rest; clicking the
//! open one does nothing. Listeners are bound to a session generation and
//! go quiet the moment a newer session attaches or the session detaches.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use formwright_types::widget::GroupCategory;

use super::{GROUP_MARKER, SidePanel};
use crate::widget::document::{
    DomEvent, Document, EventKind, Listener, ListenerId, MutationRecord, ObserverId,
};

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The section was opened and every other section closed.
    Opened,
    /// The section was the open one; nothing changed.
    AlreadyOpen,
    /// The panel has no such section.
    Unrecognized,
}

#[derive(Default)]
struct AccordionState {
    generation: u64,
    panel: Weak<SidePanel>,
    listeners: Vec<(Weak<Document>, ListenerId)>,
    observer: Option<(Weak<Document>, ObserverId)>,
}

#[derive(Clone)]
pub struct AccordionController {
    default_group: GroupCategory,
    state: Arc<Mutex<AccordionState>>,
}

impl AccordionController {
    pub fn new(default_group: GroupCategory) -> Self {
        Self {
            default_group,
            state: Arc::new(Mutex::new(AccordionState::default())),
        }
    }

    pub fn default_group(&self) -> GroupCategory {
        self.default_group
    }

    /// Bind to `panel` for session `generation`.
    ///
    /// Drops listeners left by any earlier attach, normalizes the panel to
    /// exactly one open section, removes duplicate icons, and registers one
    /// click listener per section toggle. Calling it again for the same
    /// panel is harmless.
    pub fn attach(&self, panel: &Arc<SidePanel>, generation: u64) {
        let stale = {
            let mut state = self.lock();
            state.generation = generation;
            state.panel = Arc::downgrade(panel);
            std::mem::take(&mut state.listeners)
        };
        remove_listeners(stale);

        self.normalize(panel);
        panel.dedupe_icons();

        let document = Arc::clone(panel.document());
        let mut listeners = Vec::new();
        for group in panel.groups() {
            let id = document.add_listener(
                panel.toggle_id(group),
                EventKind::Click,
                self.click_listener(panel, generation),
            );
            listeners.push((Arc::downgrade(&document), id));
        }

        let previous_observer = {
            let mut state = self.lock();
            if state.generation != generation {
                // A newer attach raced ahead; leave its bindings alone.
                drop(state);
                remove_listeners(listeners);
                return;
            }
            state.listeners = listeners;
            match &state.observer {
                Some((doc, _)) if same_document(doc, &document) => None,
                _ => state.observer.take(),
            }
        };
        if let Some((doc, id)) = previous_observer {
            if let Some(doc) = doc.upgrade() {
                doc.disconnect(id);
            }
        }
        self.install_observer(&document);

        tracing::debug!(
            generation,
            instance = panel.instance(),
            expanded = ?panel.expanded(),
            "Accordion attached"
        );
    }

    /// Remove the click listeners bound to `generation`. A detach for an
    /// older generation is ignored. The mutation observer stays.
    pub fn detach(&self, generation: u64) {
        let stale = {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            state.panel = Weak::new();
            std::mem::take(&mut state.listeners)
        };
        let removed = remove_listeners(stale);
        tracing::debug!(generation, removed, "Accordion detached");
    }

    /// Open `group` and close every other section.
    pub fn toggle(&self, panel: &SidePanel, group: GroupCategory) -> ToggleOutcome {
        if !panel.contains(group) {
            return ToggleOutcome::Unrecognized;
        }
        if panel.expanded() == [group] {
            return ToggleOutcome::AlreadyOpen;
        }
        for other in panel.groups() {
            panel.set_expanded(other, other == group);
        }
        ToggleOutcome::Opened
    }

    /// The open section of the currently attached panel.
    pub fn expanded_group(&self) -> Option<GroupCategory> {
        let panel = self.lock().panel.upgrade()?;
        panel.expanded().first().copied()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Force exactly one open section: keep the first open one, or open
    /// the default (falling back to the first section) if none is.
    fn normalize(&self, panel: &SidePanel) {
        let groups = panel.groups();
        let keep = panel
            .expanded()
            .first()
            .copied()
            .or_else(|| groups.contains(&self.default_group).then_some(self.default_group))
            .or_else(|| groups.first().copied());
        if let Some(keep) = keep {
            for group in groups {
                panel.set_expanded(group, group == keep);
            }
        }
    }

    fn click_listener(&self, panel: &Arc<SidePanel>, generation: u64) -> Listener {
        let controller = self.clone();
        let panel = Arc::downgrade(panel);
        Arc::new(move |event: &mut DomEvent| {
            if controller.lock().generation != generation {
                return;
            }
            let Some(panel) = panel.upgrade() else {
                return;
            };
            // Targets without a recognizable marker belong to the widget.
            let Some(group) = event
                .attribute(GROUP_MARKER)
                .and_then(|g| g.parse::<GroupCategory>().ok())
            else {
                return;
            };
            let outcome = controller.toggle(&panel, group);
            tracing::trace!(%group, ?outcome, "Accordion toggle");
            event.stop_propagation();
        })
    }

    fn install_observer(&self, document: &Arc<Document>) {
        if self.lock().observer.is_some() {
            return;
        }
        let state = Arc::downgrade(&self.state);
        let id = document.observe(Arc::new(move |_record: &MutationRecord| {
            let Some(state) = state.upgrade() else {
                return;
            };
            let panel = state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .panel
                .upgrade();
            if let Some(panel) = panel {
                let removed = panel.dedupe_icons();
                if removed > 0 {
                    tracing::trace!(removed, "Removed duplicate palette icons");
                }
            }
        }));
        self.lock().observer = Some((Arc::downgrade(document), id));
    }

    fn lock(&self) -> MutexGuard<'_, AccordionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AccordionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("AccordionController")
            .field("default_group", &self.default_group)
            .field("generation", &state.generation)
            .field("listeners", &state.listeners.len())
            .field("observing", &state.observer.is_some())
            .finish()
    }
}

fn same_document(weak: &Weak<Document>, document: &Arc<Document>) -> bool {
    std::ptr::eq(weak.as_ptr(), Arc::as_ptr(document))
}

fn remove_listeners(listeners: Vec<(Weak<Document>, ListenerId)>) -> usize {
    listeners
        .into_iter()
        .filter(|(doc, id)| doc.upgrade().is_some_and(|doc| doc.remove_listener(*id)))
        .count()
}
