//! Plan generation and chat modification commands

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;
use wayfarer_core::{
    format_inr, ChatMessage, ModifyRequest, PlanOutcome, Reconciliation, TripPlan, TripPlanner,
    TripRequest, WayfarerConfig,
};

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}': expected YYYY-MM-DD", value))
}

/// Build and validate a trip request from command-line values
pub fn build_trip_request(
    destination: &str,
    from: &str,
    start: &str,
    end: &str,
    people: u32,
    budget: &str,
    interests: Option<String>,
) -> Result<TripRequest> {
    let request = TripRequest {
        destination: destination.trim().to_string(),
        current_location: from.trim().to_string(),
        start_date: parse_date(start)?,
        end_date: parse_date(end)?,
        number_of_people: people,
        budget_range: budget.to_string(),
        interests,
    };
    request.validate()?;
    Ok(request)
}

/// Human-readable rendering of a plan
pub fn render_plan(plan: &TripPlan) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "🧭 {}", plan.summary);

    for day in &plan.daily_itinerary {
        let _ = writeln!(out);
        let _ = writeln!(out, "Day {} ({}): {}", day.day, day.date, day.title);
        for activity in &day.activities {
            let _ = writeln!(
                out,
                "  {:<10} {:<45} {:>10}",
                activity.time,
                truncate(&activity.activity, 45),
                format_inr(activity.estimated_cost)
            );
        }
    }

    if !plan.budget_breakdown.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Budget breakdown:");
        for (category, cost) in &plan.budget_breakdown {
            let _ = writeln!(
                out,
                "  {:<15} {:>12}  {}",
                category,
                format_inr(cost.estimated),
                cost.notes
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total: {}", format_inr(plan.total_estimated_cost));

    if !plan.travel_tips.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Tips:");
        for tip in &plan.travel_tips {
            let _ = writeln!(out, "  - {}", tip);
        }
    }

    out
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn write_plan(path: &Path, plan: &TripPlan) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    debug!(path = %path.display(), bytes = json.len(), "Writing plan");
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Generate a plan and print it
pub async fn cmd_plan(
    config: &WayfarerConfig,
    request: &TripRequest,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let planner = TripPlanner::from_config(config);

    if !json {
        println!(
            "✈️  Planning {} days in {} for {} ({})...",
            request.trip_days(),
            request.destination,
            request.number_of_people,
            request.budget_range
        );
    }

    let outcome = planner.generate(request).await;

    let note = match &outcome {
        PlanOutcome::Parsed {
            reconciliation:
                Reconciliation::Rescaled {
                    original_total,
                    total,
                },
            ..
        } => Some(format!(
            "ℹ️  Model estimate of {} was rescaled to {} to fit the budget",
            format_inr(*original_total),
            format_inr(*total)
        )),
        PlanOutcome::Fallback { reason, .. } => Some(format!(
            "⚠️  Model output was unusable ({}); showing a generated fallback plan",
            reason
        )),
        _ => None,
    };

    let plan = outcome
        .into_result()
        .context("Failed to generate trip plan")?;

    if let Some(path) = output {
        write_plan(path, &plan)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!();
        print!("{}", render_plan(&plan));
        if let Some(note) = note {
            println!();
            println!("{}", note);
        }
        if let Some(path) = output {
            println!("💾 Saved to {}", path.display());
        }
    }

    Ok(())
}

/// Send one chat message about a saved plan
pub async fn cmd_chat(
    config: &WayfarerConfig,
    plan_path: &Path,
    message: &str,
    history_path: Option<&Path>,
    save: bool,
) -> Result<()> {
    let current_plan: Value = serde_json::from_str(
        &fs::read_to_string(plan_path)
            .with_context(|| format!("Failed to read {}", plan_path.display()))?,
    )
    .with_context(|| format!("{} is not valid JSON", plan_path.display()))?;

    let conversation_history: Vec<ChatMessage> = match history_path {
        Some(path) => serde_json::from_str(
            &fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        )
        .with_context(|| format!("{} is not a JSON array of messages", path.display()))?,
        None => Vec::new(),
    };

    debug!(
        plan = %plan_path.display(),
        history = conversation_history.len(),
        "Loaded chat context"
    );

    let request = ModifyRequest {
        trip_id: None,
        current_plan,
        user_message: message.to_string(),
        conversation_history,
    };

    let planner = TripPlanner::from_config(config);
    let reply = planner
        .modify(&request)
        .await
        .context("Failed to modify trip plan")?;

    println!("{}", reply.response);

    if let Some(plan) = reply.updated_plan {
        println!();
        if save {
            write_plan(plan_path, &plan)?;
            println!("💾 Updated plan saved to {}", plan_path.display());
        } else {
            print!("{}", render_plan(&plan));
            println!();
            println!("Run again with --save to write the updated plan.");
        }
    }

    Ok(())
}
