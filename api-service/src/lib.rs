//! HTTP surface of the trade single-window workflow engine.

pub mod presentation;

pub use presentation::api::{build_router, AppState};
