//! Preview mode: hands the current schema to a renderer and collects
//! what it submits.
//!
//! Submitted data is filtered to the field keys the component tree
//! declares. Keys that no input component owns are reported as ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use formwright_types::error::FormError;
use formwright_types::form::{FormRecord, SchemaDocument};

use crate::sync::{field_keys, payload_from_record};

/// Filtered result of one preview submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub data: Map<String, Value>,
    /// Submitted keys no input component declares.
    pub ignored: Vec<String>,
}

pub type SubmitHandler = Arc<dyn Fn(Map<String, Value>) -> Submission + Send + Sync>;

/// Renders a schema for preview.
///
/// The renderer calls `on_submit` with the raw form data whenever the
/// user submits.
pub trait PreviewRenderer: Send + Sync {
    fn open(&self, schema: &SchemaDocument, on_submit: SubmitHandler);

    fn close(&self);
}

#[derive(Default)]
struct PreviewState {
    handler: Option<SubmitHandler>,
    last: Option<Submission>,
}

/// Owns the renderer for one editor mount.
pub struct PreviewHarness {
    renderer: Arc<dyn PreviewRenderer>,
    state: Arc<Mutex<PreviewState>>,
}

impl PreviewHarness {
    pub fn new(renderer: Arc<dyn PreviewRenderer>) -> Self {
        Self {
            renderer,
            state: Arc::new(Mutex::new(PreviewState::default())),
        }
    }

    /// Show `record` in the renderer. Reopening replaces the schema.
    pub fn open(&self, record: &FormRecord) {
        let schema = payload_from_record(record, None).schema;
        let keys = field_keys(&schema.components);
        tracing::debug!(fields = keys.len(), display = %schema.display, "Opening preview");

        let state = Arc::downgrade(&self.state);
        let handler: SubmitHandler = Arc::new(move |raw: Map<String, Value>| {
            let submission = filter_submission(&keys, raw);
            if let Some(state) = state.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .last = Some(submission.clone());
            }
            submission
        });

        self.lock().handler = Some(Arc::clone(&handler));
        self.renderer.open(&schema, handler);
    }

    pub fn close(&self) {
        let was_open = self.lock().handler.take().is_some();
        if was_open {
            self.renderer.close();
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().handler.is_some()
    }

    /// Submit `raw` data as the renderer would.
    pub fn submit(&self, raw: Map<String, Value>) -> Result<Submission, FormError> {
        let handler = self.lock().handler.clone().ok_or(FormError::PreviewClosed)?;
        let submission = handler(raw);
        if !submission.ignored.is_empty() {
            tracing::debug!(ignored = ?submission.ignored, "Dropped undeclared preview fields");
        }
        tracing::info!(fields = submission.data.len(), "Preview submitted");
        Ok(submission)
    }

    pub fn last_submission(&self) -> Option<Submission> {
        self.lock().last.clone()
    }

    fn lock(&self) -> MutexGuard<'_, PreviewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn filter_submission(keys: &[String], raw: Map<String, Value>) -> Submission {
    let mut submission = Submission::default();
    for (key, value) in raw {
        if keys.contains(&key) {
            submission.data.insert(key, value);
        } else {
            submission.ignored.push(key);
        }
    }
    submission
}
