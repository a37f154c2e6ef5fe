//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod health;
pub mod orders;

// Re-export common handler utilities
pub use health::{health_check, metrics, readiness_check};
pub use orders::{create_order, delete_order, get_order, list_orders, update_order};
