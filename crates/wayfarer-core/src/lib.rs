//! Wayfarer Core Library
//!
//! Budget-constrained trip planning:
//! - Budget range parsing (preset tiers and custom ranges)
//! - Prompt library for customizable generation prompts
//! - Pluggable generative backends (Gemini, Ollama) with retrying transport
//! - Extraction of JSON plans from model output
//! - Budget reconciliation and deterministic fallback itineraries
//! - Chat-driven plan modification

pub mod ai;
pub mod budget;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod planner;
pub mod prompts;
pub mod reconcile;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIClient, BackendInfo, BackendKind, GeminiBackend, GenerationParams, GenerativeBackend,
    MockBackend, OllamaBackend, PlanRejection, RetryPolicy,
};
pub use budget::{
    budget_label, format_inr, parse_budget_range, parse_custom_range, BudgetRange, BudgetTier,
};
pub use config::{AiConfig, PriceBand, PriceGuide, ServerSettings, WayfarerConfig};
pub use error::{Error, Result};
pub use fallback::{AllocationTable, FallbackPlanner};
pub use models::{
    Activity, BudgetCategory, ChatMessage, ChatReply, DayPlan, ModifyRequest, TripPlan,
    TripRequest, MAX_TRIP_DAYS,
};
pub use planner::{PlanOutcome, PlannerSettings, TripPlanner};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use reconcile::{BudgetReconciler, Reconciliation, TargetStrategy};
