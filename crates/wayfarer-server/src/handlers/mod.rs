//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod budget;
pub mod health;
pub mod plans;

// Re-export all handlers for use in router
pub use budget::*;
pub use health::*;
pub use plans::*;
