//! Domain models for trip planning
//!
//! Plans come back from a language model, so decoding is deliberately lenient:
//! cost fields accept integers, floats, numeric strings or garbage (which
//! counts as zero), and most fields default when absent. Only the shape of
//! `dailyItinerary` is load-bearing; [`crate::ai::parsing`] enforces it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Suffix appended to a category's notes when the reconciler rescales it
pub const ADJUSTMENT_NOTE: &str = " (Adjusted to fit budget range)";

/// Longest trip, in days, a request may span
pub const MAX_TRIP_DAYS: i64 = 90;

/// Trip details sent by the client when requesting a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub current_location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_people: u32,
    #[serde(default = "default_budget_range")]
    pub budget_range: String,
    #[serde(default)]
    pub interests: Option<String>,
}

fn default_budget_range() -> String {
    "budget".to_string()
}

impl TripRequest {
    /// Inclusive number of calendar days covered by the trip
    pub fn trip_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Nights spent at the destination
    pub fn nights(&self) -> i64 {
        (self.trip_days() - 1).max(0)
    }

    /// Interests, or a generic default when the user left them blank
    pub fn interests_or_default(&self) -> &str {
        self.interests
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("General sightseeing")
    }

    /// Reject requests the planner cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(Error::InvalidRequest("destination is required".into()));
        }
        if self.end_date < self.start_date {
            return Err(Error::InvalidRequest(format!(
                "end_date {} is before start_date {}",
                self.end_date, self.start_date
            )));
        }
        if self.trip_days() > MAX_TRIP_DAYS {
            return Err(Error::InvalidRequest(format!(
                "trip spans {} days; at most {} are supported",
                self.trip_days(),
                MAX_TRIP_DAYS
            )));
        }
        if self.number_of_people == 0 {
            return Err(Error::InvalidRequest(
                "number_of_people must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A complete itinerary with cost breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripPlan {
    pub summary: String,
    pub daily_itinerary: Vec<DayPlan>,
    pub budget_breakdown: BTreeMap<String, BudgetCategory>,
    pub transportation: Transportation,
    pub accommodation: String,
    pub food_recommendations: Vec<FoodRecommendation>,
    pub travel_tips: Vec<String>,
    pub hidden_gems: Vec<HiddenGem>,
    #[serde(deserialize_with = "lenient_amount")]
    pub total_estimated_cost: u64,
    /// Fields the model added that we don't model (kept for round-tripping)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl TripPlan {
    /// Sum of every category's estimate, saturating at `u64::MAX`
    pub fn breakdown_total(&self) -> u64 {
        self.checked_breakdown_total().unwrap_or(u64::MAX)
    }

    /// Sum of every category's estimate, or `None` if it overflows
    pub fn checked_breakdown_total(&self) -> Option<u64> {
        self.budget_breakdown
            .values()
            .try_fold(0u64, |sum, c| sum.checked_add(c.estimated))
    }
}

/// One day of the itinerary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayPlan {
    pub day: u32,
    pub date: String,
    pub title: String,
    pub activities: Vec<Activity>,
}

/// A single scheduled activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    /// "Morning", "Afternoon", "Evening" or a freeform time
    pub time: String,
    pub activity: String,
    pub location: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub estimated_cost: u64,
    pub category: String,
}

/// A cost category in the budget breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct BudgetCategory {
    pub estimated: u64,
    pub notes: String,
}

impl BudgetCategory {
    pub fn new(estimated: u64, notes: impl Into<String>) -> Self {
        Self {
            estimated,
            notes: notes.into(),
        }
    }
}

impl From<Value> for BudgetCategory {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                estimated: map.get("estimated").map(amount_from_value).unwrap_or(0),
                notes: map
                    .get("notes")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            // Some models flatten the breakdown to plain numbers
            other => Self {
                estimated: amount_from_value(&other),
                notes: String::new(),
            },
        }
    }
}

/// How the travelers get there and get around
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct Transportation {
    pub getting_there: String,
    pub local_transport: LocalTransport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTransport {
    pub modes: Vec<String>,
    pub daily_cost: u64,
}

impl From<Value> for Transportation {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let local = map.get("localTransport");
                Self {
                    getting_there: map
                        .get("gettingThere")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    local_transport: LocalTransport {
                        modes: local
                            .and_then(|l| l.get("modes"))
                            .and_then(Value::as_array)
                            .map(|modes| {
                                modes
                                    .iter()
                                    .filter_map(Value::as_str)
                                    .map(String::from)
                                    .collect()
                            })
                            .unwrap_or_default(),
                        daily_cost: local
                            .and_then(|l| l.get("dailyCost"))
                            .map(amount_from_value)
                            .unwrap_or(0),
                    },
                }
            }
            Value::String(s) => Self {
                getting_there: s,
                local_transport: LocalTransport::default(),
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FoodRecommendation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub estimated_cost: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiddenGem {
    pub name: String,
    pub description: String,
    pub location: String,
}

/// One turn of the plan-revision chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request to revise an existing plan through chat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    #[serde(default)]
    pub trip_id: Option<String>,
    pub current_plan: Value,
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

/// Assistant answer to a chat turn, optionally carrying a revised plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_plan: Option<TripPlan>,
}

/// Decode any JSON value into a non-negative whole amount
///
/// Integers pass through, floats are floored, numeric strings ("₹1,200") are
/// parsed, and everything else (negatives, NaN, null, objects) is zero.
pub fn amount_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else {
                n.as_f64().map(floor_amount).unwrap_or(0)
            }
        }
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().map(floor_amount).unwrap_or(0)
        }
        _ => 0,
    }
}

fn floor_amount(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.floor() as u64
    } else {
        0
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(amount_from_value(&value))
}
