//! Editor events broadcast on the editor event bus.
//!
//! All variants are Clone + Send + Sync for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};

use crate::form::{DisplayMode, FormId};

/// Lifecycle and persistence events emitted by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    /// A widget instance was installed as the active builder session.
    SessionStarted { generation: u64, display: DisplayMode },

    /// The active builder session was torn down.
    SessionEnded { generation: u64 },

    /// A widget construction resolved after it had been superseded and
    /// its handle was destroyed.
    SessionDiscarded { generation: u64 },

    /// The schema store absorbed a change emitted by the widget.
    SchemaChanged { generation: u64 },

    /// The form was written to the persistence backend.
    Saved { id: FormId },

    /// Public visibility was toggled.
    PublishChanged { id: FormId, is_public: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = EditorEvent::SessionStarted {
            generation: 3,
            display: DisplayMode::Wizard,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_started");
        assert_eq!(json["display"], "wizard");
    }
}
