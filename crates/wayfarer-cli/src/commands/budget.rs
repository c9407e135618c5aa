//! Budget range preview command

use anyhow::Result;
use wayfarer_core::{budget_label, format_inr, parse_budget_range, parse_custom_range};

/// Describe how a budget specifier will be interpreted
pub fn describe_budget(spec: &str) -> String {
    let range = parse_budget_range(spec);

    let kind = if let Some(tier) = budget_label(spec) {
        format!("Preset tier: {}", tier)
    } else if parse_custom_range(spec).is_some() {
        "Custom range".to_string()
    } else {
        "Unrecognized, using the budget tier".to_string()
    };

    format!(
        "{}\nWindow: {} - {}\nMidpoint: {}",
        kind,
        format_inr(range.min),
        format_inr(range.max),
        format_inr(range.midpoint())
    )
}

/// Show the window a budget label resolves to
pub fn cmd_budget(spec: &str) -> Result<()> {
    println!("{}", describe_budget(spec));
    Ok(())
}
