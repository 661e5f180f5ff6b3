//! HTTP/REST API layer for Formwright.
//!
//! Axum-based REST API at `/api/v1/` plus the public form route, with
//! envelope responses and CORS support.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
