//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Wayfarer - Budget-constrained AI trip planner
#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "AI trip planner that keeps itineraries inside your budget", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $WAYFARER_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the AI backend: gemini, ollama, mock
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Override the model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (defaults to [server] port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to [server] host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate a trip plan
    Plan {
        /// Where to go
        #[arg(short, long)]
        destination: String,

        /// Where the trip starts from
        #[arg(short, long)]
        from: String,

        /// First day of the trip (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day of the trip (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Number of travellers
        #[arg(short, long, default_value = "1")]
        people: u32,

        /// Budget: budget, mid-range, luxury, or a custom range like "₹10,000-₹50,000"
        #[arg(short, long, default_value = "budget")]
        budget: String,

        /// Comma-separated interests
        #[arg(short, long)]
        interests: Option<String>,

        /// Print the plan as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Also write the plan JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask for a change to an existing plan
    Chat {
        /// Plan JSON file (as written by `plan --output`)
        #[arg(long)]
        plan: PathBuf,

        /// What to change
        #[arg(short, long)]
        message: String,

        /// Prior conversation as a JSON array of {role, content}
        #[arg(long)]
        history: Option<PathBuf>,

        /// Write the updated plan (if any) back to the plan file
        #[arg(long)]
        save: bool,
    },

    /// Show the window a budget label resolves to
    Budget {
        /// Preset label or custom range
        spec: String,
    },

    /// Manage AI prompt templates
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Show the effective configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (generate_trip_plan, modify_trip_plan)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Show the default config file location
    Path,
}
