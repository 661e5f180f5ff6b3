//! Fault boundary for externally supplied callbacks.
//!
//! Every callback handed to the widget, or registered on the document on
//! the widget's behalf, runs through [`guarded_invoke`]. A panic inside the
//! callback is caught, logged, and reported as a [`HandlerFault`] instead of
//! unwinding into the caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// A callback panicked and was contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFault {
    pub handler: String,
    pub message: String,
}

impl std::fmt::Display for HandlerFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler '{}' faulted: {}", self.handler, self.message)
    }
}

impl std::error::Error for HandlerFault {}

/// Run `f` inside a fault boundary.
///
/// On success the callback's own return value is passed through untouched.
pub fn guarded_invoke<R>(handler: &str, f: impl FnOnce() -> R) -> Result<R, HandlerFault> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(handler, %message, "Handler fault contained");
            Err(HandlerFault {
                handler: handler.to_string(),
                message,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
