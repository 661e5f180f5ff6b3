//! The document the widget renders into.
//!
//! Holds the event-registration primitive (listeners keyed by target element
//! and event kind) and the mutation observers. Both live for the lifetime of
//! the document, which outlives every builder session.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::dispatch::guarded_invoke;

/// DOM event kinds the builder cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
}

/// An event dispatched to a target element.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: String,
    /// Attributes of the target element at dispatch time.
    pub attributes: BTreeMap<String, String>,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            attributes: BTreeMap::new(),
            propagation_stopped: false,
        }
    }

    pub fn click(target: impl Into<String>) -> Self {
        Self::new(EventKind::Click, target)
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

pub type Listener = Arc<dyn Fn(&mut DomEvent) + Send + Sync>;

/// What a mutation observer is told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: String,
}

pub type MutationCallback = Arc<dyn Fn(&MutationRecord) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that ran (including ones that faulted).
    pub invoked: usize,
    pub propagation_stopped: bool,
}

struct Registration {
    target: String,
    kind: EventKind,
    listener: Listener,
}

/// Shared document state.
pub struct Document {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Registration>>,
    observers: Mutex<BTreeMap<u64, MutationCallback>>,
    guarded: AtomicBool,
    faults: Arc<AtomicU64>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(BTreeMap::new()),
            observers: Mutex::new(BTreeMap::new()),
            guarded: AtomicBool::new(false),
            faults: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register `listener` for `kind` events on `target`.
    ///
    /// Once guarded dispatch is enabled, the listener is wrapped at
    /// registration time so a panic inside it stops propagation instead of
    /// unwinding into the dispatcher.
    pub fn add_listener(
        &self,
        target: impl Into<String>,
        kind: EventKind,
        listener: Listener,
    ) -> ListenerId {
        let listener = if self.guarded.load(Ordering::Acquire) {
            self.guard(listener)
        } else {
            listener
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Registration {
                    target: target.into(),
                    kind,
                    listener,
                },
            );
        ListenerId(id)
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0)
            .is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver `event` to listeners on its target in registration order,
    /// stopping early once propagation is stopped.
    pub fn dispatch(&self, event: &mut DomEvent) -> DispatchReport {
        let matching: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|r| r.kind == event.kind && r.target == event.target)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        let mut invoked = 0;
        for listener in matching {
            if event.is_propagation_stopped() {
                break;
            }
            listener(&mut *event);
            invoked += 1;
        }

        DispatchReport {
            invoked,
            propagation_stopped: event.is_propagation_stopped(),
        }
    }

    /// Wrap every listener registered from now on in the fault boundary.
    ///
    /// Returns true only on the call that actually enabled it.
    pub fn enable_guarded_dispatch(&self) -> bool {
        !self.guarded.swap(true, Ordering::AcqRel)
    }

    pub fn is_guarded(&self) -> bool {
        self.guarded.load(Ordering::Acquire)
    }

    /// Number of listener panics contained so far.
    pub fn fault_count(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    fn guard(&self, listener: Listener) -> Listener {
        let faults = Arc::clone(&self.faults);
        Arc::new(move |event: &mut DomEvent| {
            let target = event.target.clone();
            if guarded_invoke("dom-listener", || listener(&mut *event)).is_err() {
                faults.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%target, "Stopping propagation after listener fault");
                event.stop_propagation();
            }
        })
    }

    pub fn observe(&self, callback: MutationCallback) -> ObserverId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, callback);
        ObserverId(id)
    }

    pub fn disconnect(&self, id: ObserverId) -> bool {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0)
            .is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Report a DOM mutation to every observer.
    pub fn record_mutation(&self, record: &MutationRecord) {
        let observers: Vec<MutationCallback> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for observer in observers {
            let _ = guarded_invoke("mutation-observer", || observer(record));
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("listeners", &self.listener_count())
            .field("observers", &self.observer_count())
            .field("guarded", &self.is_guarded())
            .finish()
    }
}
