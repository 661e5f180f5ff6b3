//! Broadcast bus for `EditorEvent`.
//!
//! Session, save, and publish milestones are published here so a CLI,
//! an HTTP layer, or a test can follow the editor without being wired
//! into it. Publishing with no subscribers is a no-op.

use formwright_types::event::EditorEvent;
use tokio::sync::broadcast;

/// Multi-consumer bus for editor events.
///
/// Cloning the bus clones the sender; every clone feeds the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// A receiver for every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    /// Publish to all current subscribers; dropped if there are none.
    pub fn publish(&self, event: EditorEvent) {
        tracing::trace!(?event, "Editor event");
        let _ = self.sender.send(event);
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_types::form::{DisplayMode, FormId};

    #[tokio::test]
    async fn publish_and_subscribe_delivers_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(EditorEvent::SessionStarted {
            generation: 1,
            display: DisplayMode::Form,
        });

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, EditorEvent::SessionStarted { generation: 1, .. }));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(EditorEvent::SessionEnded { generation: 1 });
    }

    #[test]
    fn clone_shares_channel() {
        let bus = EventBus::new(16);
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        let id = FormId::new();
        bus2.publish(EditorEvent::Saved { id });

        assert_eq!(rx.try_recv().unwrap(), EditorEvent::Saved { id });
    }

    #[test]
    fn lagged_receiver_reports_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for generation in 0..5 {
            bus.publish(EditorEvent::SchemaChanged { generation });
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
    }
}
