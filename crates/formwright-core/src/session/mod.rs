//! Builder sessions: the schema store and the manager that owns the live
//! widget instance.

pub mod manager;
pub mod store;

pub use manager::{SessionManager, SessionOutcome, SessionPhase};
pub use store::SchemaStore;
