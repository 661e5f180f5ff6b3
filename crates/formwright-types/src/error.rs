use thiserror::Error;

/// Errors surfaced by form load, save, and publish operations.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("form not found")]
    NotFound,

    #[error("failed to load form: {0}")]
    LoadFailed(String),

    #[error("form title cannot be empty")]
    EmptyTitle,

    #[error("form must be saved before it can be published")]
    NotSaved,

    #[error("form is not public")]
    NotPublic,

    #[error("preview is not open")]
    PreviewClosed,

    #[error("clipboard error: {0}")]
    ClipboardFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from the builder session lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("widget construction failed: {0}")]
    Construction(String),

    #[error("editor is not in edit mode")]
    NotEditing,
}

/// Errors raised by the embedded widget or its namespace entry points.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WidgetError {
    #[error("construction failed: {0}")]
    Construction(String),

    #[error("destroy failed: {0}")]
    Destroy(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("load failed: {0}")]
    Load(String),

    #[error("builder registration failed: {0}")]
    Registration(String),

    #[error("plugin error: {0}")]
    Plugin(String),
}

/// Errors from repository operations (used by trait definitions in formwright-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Failure of a non-essential collaborator (notifications, navigation,
/// clipboard). Never fatal to the editor.
#[derive(Debug, Error)]
#[error("{collaborator} unavailable: {message}")]
pub struct CollaboratorError {
    pub collaborator: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self {
            collaborator,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_error_display() {
        assert_eq!(FormError::EmptyTitle.to_string(), "form title cannot be empty");
        let err = FormError::StorageError("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::Construction("missing container".to_string());
        assert!(err.to_string().contains("missing container"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_collaborator_error_display() {
        let err = CollaboratorError::new("clipboard", "permission denied");
        assert_eq!(err.to_string(), "clipboard unavailable: permission denied");
    }
}
