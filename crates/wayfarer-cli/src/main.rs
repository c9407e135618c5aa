//! Wayfarer CLI - Budget-constrained AI trip planner
//!
//! Usage:
//!   wayfarer plan -d Goa -f Mumbai --start 2024-12-20 --end 2024-12-23
//!   wayfarer chat --plan goa.json -m "Add a beach day"
//!   wayfarer budget "₹10,000-₹50,000"
//!   wayfarer serve --port 3000

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let overrides = commands::ConfigOverrides {
        path: cli.config.clone(),
        backend: cli.backend.clone(),
        model: cli.model.clone(),
    };

    match cli.command {
        Commands::Serve { port, host } => {
            let config = commands::load_config(&overrides)?;
            commands::cmd_serve(config, host, port).await
        }
        Commands::Plan {
            destination,
            from,
            start,
            end,
            people,
            budget,
            interests,
            json,
            output,
        } => {
            let config = commands::load_config(&overrides)?;
            let request = commands::build_trip_request(
                &destination,
                &from,
                &start,
                &end,
                people,
                &budget,
                interests,
            )?;
            commands::cmd_plan(&config, &request, json, output.as_deref()).await
        }
        Commands::Chat {
            plan,
            message,
            history,
            save,
        } => {
            let config = commands::load_config(&overrides)?;
            commands::cmd_chat(&config, &plan, &message, history.as_deref(), save).await
        }
        Commands::Budget { spec } => commands::cmd_budget(&spec),
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => {
                let config = commands::load_config(&overrides)?;
                commands::cmd_config_show(&config)
            }
            Some(ConfigAction::Path) => commands::cmd_config_path(),
        },
    }
}
