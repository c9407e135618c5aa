//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use clap::Parser;
use tempfile::TempDir;
use wayfarer_core::{
    format_inr, parse_budget_range, AllocationTable, BackendKind, FallbackPlanner,
    TargetStrategy, WayfarerConfig,
};

use crate::cli::{Cli, Commands, ConfigAction, PromptsAction};
use crate::commands::{self, truncate, ConfigOverrides};

fn mock_config() -> WayfarerConfig {
    let mut config = WayfarerConfig::default();
    config.ai.backend = BackendKind::Mock;
    config
}

fn goa_request() -> wayfarer_core::TripRequest {
    commands::build_trip_request(
        "Goa",
        "Mumbai",
        "2024-12-20",
        "2024-12-23",
        2,
        "budget",
        Some("beaches".to_string()),
    )
    .unwrap()
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_plan_command() {
    let cli = Cli::try_parse_from([
        "wayfarer",
        "plan",
        "-d",
        "Goa",
        "-f",
        "Mumbai",
        "--start",
        "2024-12-20",
        "--end",
        "2024-12-23",
        "--budget",
        "luxury",
        "--json",
    ])
    .unwrap();

    match cli.command {
        Commands::Plan {
            destination,
            from,
            people,
            budget,
            json,
            output,
            ..
        } => {
            assert_eq!(destination, "Goa");
            assert_eq!(from, "Mumbai");
            assert_eq!(people, 1);
            assert_eq!(budget, "luxury");
            assert!(json);
            assert!(output.is_none());
        }
        _ => panic!("expected plan command"),
    }
}

#[test]
fn test_parse_plan_requires_dates() {
    let result = Cli::try_parse_from(["wayfarer", "plan", "-d", "Goa", "-f", "Mumbai"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "wayfarer", "serve", "--port", "8080", "--backend", "ollama", "-v",
    ])
    .unwrap();

    assert_eq!(cli.backend.as_deref(), Some("ollama"));
    assert!(cli.verbose);
    match cli.command {
        Commands::Serve { port, host } => {
            assert_eq!(port, Some(8080));
            assert!(host.is_none());
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn test_parse_chat_command() {
    let cli = Cli::try_parse_from([
        "wayfarer",
        "chat",
        "--plan",
        "goa.json",
        "-m",
        "Add a beach day",
        "--save",
    ])
    .unwrap();

    match cli.command {
        Commands::Chat {
            plan,
            message,
            history,
            save,
        } => {
            assert_eq!(plan.to_str(), Some("goa.json"));
            assert_eq!(message, "Add a beach day");
            assert!(history.is_none());
            assert!(save);
        }
        _ => panic!("expected chat command"),
    }
}

#[test]
fn test_parse_prompts_and_config_subcommands() {
    let cli = Cli::try_parse_from(["wayfarer", "prompts", "show", "modify_trip_plan"]).unwrap();
    match cli.command {
        Commands::Prompts {
            action: Some(PromptsAction::Show { prompt_id }),
        } => assert_eq!(prompt_id, "modify_trip_plan"),
        _ => panic!("expected prompts show"),
    }

    let cli = Cli::try_parse_from(["wayfarer", "config", "path"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            action: Some(ConfigAction::Path)
        }
    ));
}

// ========== Trip Request Tests ==========

#[test]
fn test_build_trip_request() {
    let request = goa_request();
    assert_eq!(request.destination, "Goa");
    assert_eq!(request.trip_days(), 4);
    assert_eq!(request.interests.as_deref(), Some("beaches"));
}

#[test]
fn test_build_trip_request_rejects_bad_date() {
    let err = commands::build_trip_request("Goa", "Mumbai", "20/12/2024", "2024-12-23", 1, "budget", None)
        .unwrap_err();
    assert!(err.to_string().contains("expected YYYY-MM-DD"));
}

#[test]
fn test_build_trip_request_rejects_reversed_dates() {
    let result =
        commands::build_trip_request("Goa", "Mumbai", "2024-12-23", "2024-12-20", 1, "budget", None);
    assert!(result.is_err());
}

#[test]
fn test_build_trip_request_rejects_empty_party() {
    let result =
        commands::build_trip_request("Goa", "Mumbai", "2024-12-20", "2024-12-23", 0, "budget", None);
    assert!(result.is_err());
}

// ========== Output Tests ==========

#[test]
fn test_render_plan() {
    let request = goa_request();
    let range = parse_budget_range("budget");
    let plan = FallbackPlanner::new(AllocationTable::default(), TargetStrategy::Midpoint)
        .build(&request, &range);

    let rendered = commands::render_plan(&plan);

    assert!(rendered.contains("Day 1 (2024-12-20)"));
    assert!(rendered.contains("Day 4 (2024-12-23)"));
    assert!(rendered.contains("Budget breakdown:"));
    assert!(rendered.contains("accommodation"));
    assert!(rendered.contains(&format!("Total: {}", format_inr(plan.total_estimated_cost))));
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a very long activity name", 10), "a very ...");
    // Multi-byte characters are counted, not bytes
    assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
}

#[test]
fn test_describe_budget() {
    let preset = commands::describe_budget("Mid-Range");
    assert!(preset.contains("Preset tier: mid-range"));
    assert!(preset.contains("₹75,000 - ₹2,00,000"));

    let custom = commands::describe_budget("₹10,000-₹50,000");
    assert!(custom.starts_with("Custom range"));
    assert!(custom.contains("Midpoint: ₹30,000"));

    let unknown = commands::describe_budget("cheap-ish");
    assert!(unknown.starts_with("Unrecognized"));
    assert!(unknown.contains("₹25,000 - ₹75,000"));
}

// ========== Config Tests ==========

#[test]
fn test_apply_overrides_switching_backend_clears_host_and_model() {
    let mut config = WayfarerConfig::default();
    config.ai.host = Some("https://example.test".to_string());
    config.ai.model = Some("gemini-1.5-pro".to_string());

    let overrides = ConfigOverrides {
        backend: Some("ollama".to_string()),
        ..Default::default()
    };
    commands::apply_overrides(&mut config, &overrides).unwrap();

    assert_eq!(config.ai.backend, BackendKind::Ollama);
    assert!(config.ai.host.is_none());
    assert!(config.ai.model.is_none());
}

#[test]
fn test_apply_overrides_model_only() {
    let mut config = WayfarerConfig::default();
    config.ai.host = Some("https://example.test".to_string());

    let overrides = ConfigOverrides {
        backend: Some("gemini".to_string()),
        model: Some("gemini-1.5-flash".to_string()),
        ..Default::default()
    };
    commands::apply_overrides(&mut config, &overrides).unwrap();

    // Same backend: host is kept
    assert_eq!(config.ai.host.as_deref(), Some("https://example.test"));
    assert_eq!(config.ai.model.as_deref(), Some("gemini-1.5-flash"));
}

#[test]
fn test_apply_overrides_unknown_backend() {
    let mut config = WayfarerConfig::default();
    let overrides = ConfigOverrides {
        backend: Some("openai".to_string()),
        ..Default::default()
    };
    assert!(commands::apply_overrides(&mut config, &overrides).is_err());
}

#[test]
fn test_load_config_from_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wayfarer.toml");
    std::fs::write(&path, "[ai]\nbackend = \"mock\"\n\n[server]\nport = 4100\n").unwrap();

    let overrides = ConfigOverrides {
        path: Some(path),
        ..Default::default()
    };
    let config = commands::load_config(&overrides).unwrap();

    assert_eq!(config.ai.backend, BackendKind::Mock);
    assert_eq!(config.server.port, 4100);
}

#[test]
fn test_load_config_missing_explicit_file() {
    let overrides = ConfigOverrides {
        path: Some("/nonexistent/wayfarer.toml".into()),
        ..Default::default()
    };
    assert!(commands::load_config(&overrides).is_err());
}

#[test]
fn test_cmd_config_show() {
    assert!(commands::cmd_config_show(&WayfarerConfig::default()).is_ok());
}

// ========== Plan & Chat Command Tests ==========

#[tokio::test]
async fn test_cmd_plan_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("goa.json");

    commands::cmd_plan(&mock_config(), &goa_request(), false, Some(&output))
        .await
        .unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    // The unscripted mock answers in prose, so this is the fallback plan
    assert_eq!(saved["dailyItinerary"].as_array().unwrap().len(), 4);
    assert_eq!(saved["totalEstimatedCost"], 50_000);
}

#[tokio::test]
async fn test_cmd_chat_with_saved_plan() {
    let dir = TempDir::new().unwrap();
    let plan_path = dir.path().join("goa.json");
    commands::cmd_plan(&mock_config(), &goa_request(), true, Some(&plan_path))
        .await
        .unwrap();

    let history_path = dir.path().join("history.json");
    std::fs::write(
        &history_path,
        r#"[{"role": "user", "content": "Hi"}, {"role": "assistant", "content": "Hello!"}]"#,
    )
    .unwrap();

    let result = commands::cmd_chat(
        &mock_config(),
        &plan_path,
        "Add a beach day",
        Some(&history_path),
        true,
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_chat_rejects_invalid_history() {
    let dir = TempDir::new().unwrap();
    let plan_path = dir.path().join("goa.json");
    std::fs::write(&plan_path, "{}").unwrap();
    let history_path = dir.path().join("history.json");
    std::fs::write(&history_path, r#"{"role": "user"}"#).unwrap();

    let err = commands::cmd_chat(
        &mock_config(),
        &plan_path,
        "Hi",
        Some(&history_path),
        false,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("not a JSON array of messages"));
}

#[tokio::test]
async fn test_cmd_chat_missing_plan_file() {
    let result = commands::cmd_chat(
        &mock_config(),
        std::path::Path::new("/nonexistent/plan.json"),
        "Hi",
        None,
        false,
    )
    .await;
    assert!(result.is_err());
}

// ========== Prompts & Budget Command Tests ==========

#[test]
fn test_cmd_prompts_show_unknown() {
    assert!(commands::cmd_prompts_show("classify_merchant").is_err());
}

#[test]
fn test_cmd_budget() {
    assert!(commands::cmd_budget("luxury").is_ok());
}
