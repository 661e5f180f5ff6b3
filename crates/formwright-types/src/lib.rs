//! Shared domain types for Formwright.
//!
//! Form records and their persisted payload shape, the widget configuration
//! and event vocabulary exchanged with the embedded builder widget, editor
//! events, configuration, and the error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod form;
pub mod widget;
