//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod form;
pub mod pool;

pub use form::SqliteFormRepository;
pub use pool::DatabasePool;
