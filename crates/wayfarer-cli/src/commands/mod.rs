//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Budget range preview
//! - `config` - Config loading (with CLI overrides), show and path commands
//! - `plan` - Plan generation and chat modification
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod budget;
pub mod config;
pub mod plan;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use budget::*;
pub use config::*;
pub use plan::*;
pub use prompts::*;
pub use serve::*;
