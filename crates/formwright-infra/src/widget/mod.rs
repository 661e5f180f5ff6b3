//! Widget host implementations.

pub mod headless;

pub use headless::{HeadlessHost, HeadlessWidget};
