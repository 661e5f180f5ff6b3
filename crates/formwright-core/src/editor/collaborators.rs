//! Collaborator ports: notification, navigation, identity, clipboard.
//!
//! These are presentation concerns owned by whoever embeds the editor.
//! Their failures are never fatal: the editor logs them and carries on.

use std::sync::Arc;

use formwright_types::error::CollaboratorError;

use crate::preview::PreviewRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A user-facing notification (a toast, a CLI line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice) -> Result<(), CollaboratorError>;
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str) -> Result<(), CollaboratorError>;
}

/// Source of the current user's identity, stamped on saved payloads.
pub trait AuthContext: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), CollaboratorError>;
}

/// Everything the editor needs from its embedding.
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub auth: Arc<dyn AuthContext>,
    pub clipboard: Arc<dyn Clipboard>,
    pub preview: Arc<dyn PreviewRenderer>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("user", &self.auth.current_user())
            .finish_non_exhaustive()
    }
}
