//! Builder session lifecycle and repository trait definitions for Formwright.
//!
//! This crate defines the "ports" (repository, widget host, notification,
//! navigation) that the infrastructure layer implements, plus the engine
//! that drives an embedded builder widget: the compatibility shim, the
//! side-panel accordion, the session manager, and schema synchronization.
//! It depends only on `formwright-types` -- never on `formwright-infra`.

pub mod editor;
pub mod event;
pub mod panel;
pub mod preview;
pub mod repository;
pub mod service;
pub mod session;
pub mod sync;
pub mod widget;

#[cfg(test)]
pub(crate) mod testing;
