//! JSON extraction helpers for model responses
//!
//! Models wrap their JSON in markdown fences, prepend chatter, or append
//! explanations. These helpers dig the payload out and decode it.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ChatReply, TripPlan};

/// Why a model response could not be used as a trip plan
///
/// Every rejection routes generation to the fallback planner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanRejection {
    #[error("no JSON object found in model response")]
    NoJson,

    #[error("model response is not valid plan JSON: {0}")]
    InvalidJson(String),

    #[error("daily itinerary missing from model response")]
    MissingItinerary,

    #[error("budget breakdown totals zero, nothing to rescale")]
    DegenerateTotal,

    #[error("budget breakdown total does not fit in 64 bits")]
    TotalOverflow,

    #[error("rescaled total {total} still outside [{min}, {max}]")]
    OutOfRange { total: u64, min: u64, max: u64 },
}

fn json_fence() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid regex"))
}

fn any_fence() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("valid regex"))
}

/// Locate the JSON object in a model response
///
/// Tries, in order: a fence tagged `json`, any fence, then the span from the
/// first `{` to the last `}`. Whichever candidate wins is trimmed to its
/// outermost braces.
pub fn extract_json(text: &str) -> Option<&str> {
    let fenced = [json_fence(), any_fence()].into_iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| outermost_braces(m.as_str()))
    });

    fenced.or_else(|| outermost_braces(text))
}

fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Decode a trip plan from raw model output
pub fn parse_trip_plan(text: &str) -> Result<TripPlan, PlanRejection> {
    let json = extract_json(text).ok_or(PlanRejection::NoJson)?;

    let value: Value =
        serde_json::from_str(json).map_err(|e| PlanRejection::InvalidJson(e.to_string()))?;

    if !has_itinerary(&value) {
        return Err(PlanRejection::MissingItinerary);
    }

    let plan: TripPlan =
        serde_json::from_value(value).map_err(|e| PlanRejection::InvalidJson(e.to_string()))?;

    debug!(days = plan.daily_itinerary.len(), "Parsed trip plan from model output");
    Ok(plan)
}

fn has_itinerary(value: &Value) -> bool {
    value
        .get("dailyItinerary")
        .and_then(Value::as_array)
        .is_some_and(|days| !days.is_empty())
}

/// Decode a chat reply, degrading to the raw text when the model ignored the format
///
/// An `updatedPlan` that is not a usable trip plan is dropped; the
/// conversational text is still returned.
pub fn parse_chat_reply(text: &str) -> ChatReply {
    let raw = || ChatReply {
        response: text.trim().to_string(),
        updated_plan: None,
    };

    let Some(json) = extract_json(text) else {
        debug!("No JSON in chat reply, returning raw text");
        return raw();
    };

    let value: Value = match serde_json::from_str(json) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(_) | Err(_) => {
            debug!("Chat reply JSON unusable, returning raw text");
            return raw();
        }
    };

    let response = value
        .get("response")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| text.trim().to_string());

    let updated_plan = match value.get("updatedPlan") {
        None | Some(Value::Null) => None,
        Some(plan) if !has_itinerary(plan) => {
            warn!("Dropping updated plan without a daily itinerary");
            None
        }
        Some(plan) => match serde_json::from_value::<TripPlan>(plan.clone()) {
            Ok(plan) => Some(plan),
            Err(e) => {
                warn!(error = %e, "Dropping updated plan that failed to decode");
                None
            }
        },
    };

    ChatReply {
        response,
        updated_plan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{"summary":"Beach days","dailyItinerary":[{"day":1,"date":"2025-03-01","title":"Arrive","activities":[]}],"budgetBreakdown":{"food":{"estimated":1000,"notes":"meals"}},"totalEstimatedCost":1000}"#;

    #[test]
    fn test_extract_prefers_json_fence() {
        let text = "Sure!\n```\nnot this {\"a\":1}\n```\n```json\n{\"b\": 2}\n```";
        assert_eq!(extract_json(text), Some("{\"b\": 2}"));
    }

    #[test]
    fn test_extract_any_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_bare_braces() {
        let text = "Here is your plan: {\"a\": {\"b\": 1}} Enjoy!";
        assert_eq!(extract_json(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_trims_fence_chatter() {
        let text = "```json\nPlan below\n{\"a\": 1}\nthanks\n```";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_none_without_braces() {
        assert_eq!(extract_json("I cannot help with that."), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_parse_trip_plan() {
        let text = format!("```json\n{}\n```", PLAN);
        let plan = parse_trip_plan(&text).unwrap();
        assert_eq!(plan.summary, "Beach days");
        assert_eq!(plan.daily_itinerary.len(), 1);
        assert_eq!(plan.budget_breakdown["food"].estimated, 1000);
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(parse_trip_plan("no json here"), Err(PlanRejection::NoJson));
        assert!(matches!(
            parse_trip_plan("{not: valid}"),
            Err(PlanRejection::InvalidJson(_))
        ));
        assert_eq!(
            parse_trip_plan(r#"{"summary": "x"}"#),
            Err(PlanRejection::MissingItinerary)
        );
        assert_eq!(
            parse_trip_plan(r#"{"dailyItinerary": []}"#),
            Err(PlanRejection::MissingItinerary)
        );
        assert_eq!(
            parse_trip_plan(r#"{"dailyItinerary": "day one"}"#),
            Err(PlanRejection::MissingItinerary)
        );
    }

    #[test]
    fn test_chat_reply_with_plan() {
        let text = format!(
            "```json\n{{\"response\": \"Added a spa day\", \"updatedPlan\": {}}}\n```",
            PLAN
        );
        let reply = parse_chat_reply(&text);
        assert_eq!(reply.response, "Added a spa day");
        assert!(reply.updated_plan.is_some());
    }

    #[test]
    fn test_chat_reply_plain_text() {
        let reply = parse_chat_reply("  Goa is lovely in March.  ");
        assert_eq!(reply.response, "Goa is lovely in March.");
        assert!(reply.updated_plan.is_none());
    }

    #[test]
    fn test_chat_reply_invalid_json_returns_raw() {
        let reply = parse_chat_reply("{response: oops}");
        assert_eq!(reply.response, "{response: oops}");
        assert!(reply.updated_plan.is_none());
    }

    #[test]
    fn test_chat_reply_drops_empty_plan() {
        let reply = parse_chat_reply(r#"{"response": "ok", "updatedPlan": {"dailyItinerary": []}}"#);
        assert_eq!(reply.response, "ok");
        assert!(reply.updated_plan.is_none());

        let reply = parse_chat_reply(r#"{"response": "ok", "updatedPlan": {}}"#);
        assert!(reply.updated_plan.is_none());
    }
}
