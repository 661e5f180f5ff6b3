//! Observability setup for Formwright binaries.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, init_tracing_with_filter, shutdown_tracing};
