//! Adapter boundary around the embedded builder widget.
//!
//! The widget is reached only through [`WidgetHost::construct`] and the
//! [`WidgetHandle`] it returns (subscribe, unsubscribe, panel, destroy).
//! Global entry points live on the [`namespace::WidgetNamespace`] and are
//! hardened once by [`shim::ensure_applied`].

pub mod dispatch;
pub mod document;
pub mod namespace;
pub mod shim;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use formwright_types::error::WidgetError;
use formwright_types::widget::{WidgetConfig, WidgetEvent, WidgetEventKind};

use crate::panel::SidePanel;

pub use dispatch::{HandlerFault, guarded_invoke};
pub use document::Document;
pub use namespace::WidgetNamespace;

/// Callback invoked for widget events.
pub type WidgetListener = Arc<dyn Fn(&WidgetEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Creates widget instances.
///
/// Uses RPITIT (return position `impl Trait` in traits) consistent with
/// all async traits in this project.
pub trait WidgetHost: Send + Sync {
    type Handle: WidgetHandle;

    /// Construct and mount a widget instance. Resolves once the widget is ready.
    fn construct(
        &self,
        config: WidgetConfig,
    ) -> impl Future<Output = Result<Self::Handle, WidgetError>> + Send;
}

/// One live widget instance.
pub trait WidgetHandle: Send + Sync + 'static {
    /// Distinct per constructed instance.
    fn instance_id(&self) -> u64;

    fn subscribe(&self, kind: WidgetEventKind, listener: WidgetListener) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    /// The side panel the widget rendered, if any.
    fn panel(&self) -> Option<Arc<SidePanel>>;

    /// Tear the instance down. After this no events are emitted.
    fn destroy(&self) -> Result<(), WidgetError>;
}

/// Listener bookkeeping for [`WidgetHandle`] implementations.
#[derive(Default)]
pub struct WidgetSubscriptions {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, (WidgetEventKind, WidgetListener)>>,
}

impl WidgetSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: WidgetEventKind, listener: WidgetListener) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, (kind, listener));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0)
            .is_some()
    }

    pub fn clear(&self) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener of its kind. Returns how many ran.
    pub fn emit(&self, event: &WidgetEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<WidgetListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in &targets {
            listener(event);
        }
        targets.len()
    }
}
