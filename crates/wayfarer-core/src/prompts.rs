//! Prompt library
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/wayfarer/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! This allows users to tune prompts without rebuilding, while still picking
//! up new default prompts on upgrade.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::budget::{format_inr, BudgetRange};
use crate::config::PriceGuide;
use crate::error::{Error, Result};
use crate::models::{ChatMessage, TripRequest};

/// Conversation turns carried into a modification prompt
pub const MAX_HISTORY_TURNS: usize = 5;

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const GENERATE_TRIP_PLAN: &str = include_str!("../../../prompts/generate_trip_plan.md");
    pub const MODIFY_TRIP_PLAN: &str = include_str!("../../../prompts/modify_trip_plan.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    GenerateTripPlan,
    ModifyTripPlan,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateTripPlan => "generate_trip_plan",
            Self::ModifyTripPlan => "modify_trip_plan",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::GenerateTripPlan, Self::ModifyTripPlan]
    }

    /// Look up a prompt by its string identifier
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == name)
    }

    /// Get the default embedded content for this prompt
    pub fn default_content(&self) -> &'static str {
        match self {
            Self::GenerateTripPlan => defaults::GENERATE_TRIP_PLAN,
            Self::ModifyTripPlan => defaults::MODIFY_TRIP_PLAN,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    /// One-line description of what the prompt asks for
    #[serde(default)]
    pub purpose: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Render the template
    ///
    /// `{{#if var}}…{{/if}}` blocks are resolved first (kept when `var` is
    /// present and non-empty), then every `{{var}}` is substituted in a single
    /// pass so substituted values are never re-expanded. Unknown variables
    /// are left as-is.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        let resolved = resolve_conditionals(&self.content, vars);
        variable_pattern()
            .replace_all(&resolved, |caps: &Captures| {
                vars.get(&caps[1])
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt {} not cached", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(override_path) = self.override_path(id).filter(|p| p.exists()) {
            let content = fs::read_to_string(&override_path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override: {}", e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            tracing::debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(override_path),
            });
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    /// List all prompts with their override status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let has_override = self.has_override(id);
                let override_path = has_override.then(|| self.override_path(id)).flatten();
                let prompt = self.get(id).ok();
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.map(|p| p.metadata.version).unwrap_or(0),
                    purpose: prompt
                        .map(|p| p.metadata.purpose.clone())
                        .unwrap_or_default(),
                    has_override,
                    override_path,
                }
            })
            .collect()
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }

    /// Get the override directory path
    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    /// Clear the cache (useful after editing override files)
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone, Serialize)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub purpose: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("wayfarer").join("prompts").join("overrides"))
}

/// Render the plan-generation prompt for a trip
pub fn build_generation_prompt(
    prompt: &Prompt,
    request: &TripRequest,
    range: &BudgetRange,
    pricing: &PriceGuide,
) -> String {
    let owned: Vec<(&str, String)> = vec![
        ("destination", request.destination.clone()),
        ("origin", request.current_location.clone()),
        ("start_date", request.start_date.to_string()),
        ("end_date", request.end_date.to_string()),
        ("days", request.trip_days().to_string()),
        ("nights", request.nights().to_string()),
        ("people", request.number_of_people.to_string()),
        ("interests", request.interests_or_default().to_string()),
        ("budget_min", format_inr(range.min)),
        ("budget_max", format_inr(range.max)),
        ("budget_window", range.to_string()),
        ("hotel_min", format_inr(pricing.hotel_per_night.min)),
        ("hotel_max", format_inr(pricing.hotel_per_night.max)),
        ("train_min", format_inr(pricing.train_per_person.min)),
        ("train_max", format_inr(pricing.train_per_person.max)),
        ("local_min", format_inr(pricing.local_transport_per_day.min)),
        ("local_max", format_inr(pricing.local_transport_per_day.max)),
        ("food_min", format_inr(pricing.food_per_meal.min)),
        ("food_max", format_inr(pricing.food_per_meal.max)),
        ("activity_min", format_inr(pricing.activity.min)),
        ("activity_max", format_inr(pricing.activity.max)),
    ];

    let vars: HashMap<&str, &str> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
    prompt.render(&vars)
}

/// Render the chat modification prompt
///
/// Only the last [`MAX_HISTORY_TURNS`] turns of `history` are included.
pub fn build_modification_prompt(
    prompt: &Prompt,
    current_plan: &serde_json::Value,
    history: &[ChatMessage],
    user_message: &str,
) -> Result<String> {
    let plan_json = serde_json::to_string_pretty(current_plan)?;
    let recent = &history[history.len().saturating_sub(MAX_HISTORY_TURNS)..];
    let transcript = recent
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = HashMap::new();
    vars.insert("current_plan", plan_json.as_str());
    vars.insert("history", transcript.as_str());
    vars.insert("user_message", user_message);
    Ok(prompt.render(&vars))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"))
}

/// Keep or drop `{{#if var}}…{{/if}}` blocks depending on `vars`
fn resolve_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_len) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = result[var_start..var_start + var_len].trim().to_string();
        let block_start = var_start + var_len + 2;
        let Some(block_len) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let full_end = block_start + block_len + "{{/if}}".len();

        let keep = vars.get(var_name.as_str()).is_some_and(|v| !v.is_empty());
        let replacement = if keep {
            result[block_start..block_start + block_len].to_string()
        } else {
            String::new()
        };
        result.replace_range(if_start..full_end, &replacement);
    }

    result
}
