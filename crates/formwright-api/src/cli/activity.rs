//! Editor milestones observed while a CLI command drives the builder.

use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;

use formwright_types::event::EditorEvent;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub sessions: usize,
    pub discarded: usize,
    pub edits: usize,
    pub saves: usize,
}

/// Drain everything published so far, logging each milestone.
pub fn drain(rx: &mut Receiver<EditorEvent>) -> Activity {
    let mut activity = Activity::default();
    loop {
        match rx.try_recv() {
            Ok(event) => {
                match &event {
                    EditorEvent::SessionStarted {
                        generation,
                        display: mode,
                    } => {
                        activity.sessions += 1;
                        tracing::debug!(generation, display = %mode, "Builder session started");
                    }
                    EditorEvent::SessionDiscarded { generation } => {
                        activity.discarded += 1;
                        tracing::debug!(generation, "Builder session discarded");
                    }
                    EditorEvent::SchemaChanged { .. } => activity.edits += 1,
                    EditorEvent::Saved { id } => {
                        activity.saves += 1;
                        tracing::info!(%id, "Form saved");
                    }
                    EditorEvent::PublishChanged { id, is_public } => {
                        tracing::info!(%id, is_public, "Form visibility changed");
                    }
                    EditorEvent::SessionEnded { .. } => {}
                }
            }
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Editor events dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    tracing::debug!(
        sessions = activity.sessions,
        edits = activity.edits,
        saves = activity.saves,
        "Editor activity"
    );
    activity
}
