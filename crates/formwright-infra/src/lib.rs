//! Infrastructure layer for Formwright.
//!
//! Contains implementations of the ports defined in `formwright-core`:
//! SQLite and in-memory form storage, log-backed collaborators, the
//! headless widget host used outside a browser, and config loading.

pub mod collaborators;
pub mod config;
pub mod filesystem;
pub mod memory;
pub mod sqlite;
pub mod widget;
