//! Collaborators for running the editor without a browser.
//!
//! Notices and navigation become log lines, the clipboard is an in-memory
//! buffer, and preview submissions are recorded for inspection.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};

use formwright_core::editor::{
    AuthContext, Clipboard, Collaborators, Navigator, Notice, NoticeLevel, Notifier,
};
use formwright_core::preview::{PreviewRenderer, SubmitHandler, Submission};
use formwright_types::error::CollaboratorError;
use formwright_types::form::SchemaDocument;

/// Emits each notice as a tracing event at a matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), CollaboratorError> {
        match notice.level {
            NoticeLevel::Success => tracing::info!(kind = "success", "{}", notice.message),
            NoticeLevel::Info => tracing::info!(kind = "info", "{}", notice.message),
            NoticeLevel::Error => tracing::error!("{}", notice.message),
        }
        Ok(())
    }
}

/// Remembers the last route requested.
#[derive(Debug, Default)]
pub struct LogNavigator {
    current: Mutex<Option<String>>,
}

impl LogNavigator {
    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) -> Result<(), CollaboratorError> {
        tracing::debug!(path, "Navigate");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
        Ok(())
    }
}

/// Fixed identity, typically from `FORMWRIGHT_USER` or a CLI flag.
#[derive(Debug, Default, Clone)]
pub struct StaticAuth {
    user: Option<String>,
}

impl StaticAuth {
    pub fn new(user: Option<String>) -> Self {
        Self { user }
    }
}

impl AuthContext for StaticAuth {
    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }
}

/// Clipboard that keeps the last copied text.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) -> Result<(), CollaboratorError> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

/// Preview renderer with no display; keeps the submit callback so callers
/// can drive submissions.
#[derive(Default)]
pub struct HeadlessPreview {
    handler: Mutex<Option<SubmitHandler>>,
}

impl HeadlessPreview {
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Submit as a user of the rendered form would. `None` when closed.
    pub fn submit(&self, data: Map<String, Value>) -> Option<Submission> {
        let handler = self.lock().clone()?;
        Some(handler(data))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SubmitHandler>> {
        self.handler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreviewRenderer for HeadlessPreview {
    fn open(&self, schema: &SchemaDocument, on_submit: SubmitHandler) {
        tracing::debug!(
            display = %schema.display,
            components = schema.components.len(),
            "Preview opened"
        );
        *self.lock() = Some(on_submit);
    }

    fn close(&self) {
        tracing::debug!("Preview closed");
        self.lock().take();
    }
}

/// Collaborators for a headless editor acting as `user`.
pub fn headless_collaborators(user: Option<String>) -> Collaborators {
    Collaborators {
        notifier: Arc::new(LogNotifier),
        navigator: Arc::new(LogNavigator::default()),
        auth: Arc::new(StaticAuth::new(user)),
        clipboard: Arc::new(MemoryClipboard::default()),
        preview: Arc::new(HeadlessPreview::default()),
    }
}
