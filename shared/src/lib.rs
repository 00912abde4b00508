//! Workflow engine for multi-step regulatory trade workflows.
//!
//! A trader registers a consignment, a workflow instance is
//! materialized from a template keyed on goods classification and trade
//! direction, and the engine drives each step (form submission,
//! external-agency verification, wait-for-event barrier) until the
//! workflow terminates.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod testing;

pub use shared::{ApiError, ApiResponse, AppError, AppResult, ErrorKind};
