//! Trip planning pipeline
//!
//! ```text
//! request ─ validate ─ parse budget ─ render prompt ─ backend (retry)
//!                                                        │
//!                     ┌──────── extract + decode ◄───────┘
//!                     ▼
//!            reconcile budget ──ok──► Parsed
//!                     │
//!                   reject ─────────► Fallback (synthetic plan)
//! ```
//!
//! Transport and configuration failures are not papered over: they surface
//! as [`PlanOutcome::Failed`].

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{
    parse_chat_reply, parse_trip_plan, AIClient, GenerationParams, GenerativeBackend,
    PlanRejection, RetryPolicy,
};
use crate::budget::parse_budget_range;
use crate::config::{PriceGuide, WayfarerConfig};
use crate::error::{Error, Result};
use crate::fallback::{AllocationTable, FallbackPlanner};
use crate::models::{ChatReply, ModifyRequest, TripPlan, TripRequest};
use crate::prompts::{build_generation_prompt, build_modification_prompt, PromptId, PromptLibrary};
use crate::reconcile::{BudgetReconciler, Reconciliation, TargetStrategy};

/// Result of one generation run
#[derive(Debug)]
pub enum PlanOutcome {
    /// The model's plan, reconciled to the budget window
    Parsed {
        plan: TripPlan,
        reconciliation: Reconciliation,
    },
    /// The model's output was unusable; a synthetic plan was built instead
    Fallback {
        plan: TripPlan,
        reason: PlanRejection,
    },
    /// No plan could be produced
    Failed(Error),
}

impl PlanOutcome {
    /// The plan, if one was produced
    pub fn plan(&self) -> Option<&TripPlan> {
        match self {
            Self::Parsed { plan, .. } | Self::Fallback { plan, .. } => Some(plan),
            Self::Failed(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Collapse into the plan or the failure
    pub fn into_result(self) -> Result<TripPlan> {
        match self {
            Self::Parsed { plan, .. } | Self::Fallback { plan, .. } => Ok(plan),
            Self::Failed(e) => Err(e),
        }
    }
}

/// Tunables for the pipeline, usually taken from [`WayfarerConfig`]
#[derive(Debug, Clone, Serialize)]
pub struct PlannerSettings {
    pub generation: GenerationParams,
    pub chat_generation: GenerationParams,
    pub retry: RetryPolicy,
    pub chat_retry: RetryPolicy,
    pub target: TargetStrategy,
    pub allocation: AllocationTable,
    pub pricing: PriceGuide,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self::from(&WayfarerConfig::default())
    }
}

impl From<&WayfarerConfig> for PlannerSettings {
    fn from(config: &WayfarerConfig) -> Self {
        Self {
            generation: config.generation,
            chat_generation: config.chat_generation,
            retry: config.retry,
            chat_retry: config.chat_retry,
            target: config.budget.target,
            allocation: config.allocation,
            pricing: config.pricing,
        }
    }
}

/// Generates and revises trip plans
#[derive(Clone)]
pub struct TripPlanner {
    ai: AIClient,
    prompts: Arc<RwLock<PromptLibrary>>,
    settings: PlannerSettings,
}

impl TripPlanner {
    pub fn new(ai: AIClient, prompts: PromptLibrary, settings: PlannerSettings) -> Self {
        Self {
            ai,
            prompts: Arc::new(RwLock::new(prompts)),
            settings,
        }
    }

    /// Build the planner described by `config` (backend, prompts from the default dirs)
    pub fn from_config(config: &WayfarerConfig) -> Self {
        Self::new(
            AIClient::from_config(&config.ai),
            PromptLibrary::new(),
            PlannerSettings::from(config),
        )
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    fn reconciler(&self) -> BudgetReconciler {
        BudgetReconciler::new(self.settings.target)
    }

    fn fallback(&self) -> FallbackPlanner {
        FallbackPlanner::new(self.settings.allocation, self.settings.target)
    }

    /// Produce a budget-conforming plan for `request`
    pub async fn generate(&self, request: &TripRequest) -> PlanOutcome {
        if let Err(e) = request.validate() {
            return PlanOutcome::Failed(e);
        }

        let range = parse_budget_range(&request.budget_range);
        info!(
            destination = %request.destination,
            days = request.trip_days(),
            people = request.number_of_people,
            min = range.min,
            max = range.max,
            "Generating trip plan"
        );

        let prompt = match self.generation_prompt(request, &range) {
            Ok(p) => p,
            Err(e) => return PlanOutcome::Failed(e),
        };

        let text = match self
            .ai
            .generate(&prompt, &self.settings.generation, &self.settings.retry)
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Plan generation failed");
                return PlanOutcome::Failed(e);
            }
        };

        let parsed = parse_trip_plan(&text).and_then(|mut plan| {
            let reconciliation = self.reconciler().reconcile(&mut plan, &range, request)?;
            Ok((plan, reconciliation))
        });

        match parsed {
            Ok((plan, reconciliation)) => {
                info!(
                    days = plan.daily_itinerary.len(),
                    total = reconciliation.total(),
                    "Trip plan generated"
                );
                PlanOutcome::Parsed {
                    plan,
                    reconciliation,
                }
            }
            Err(reason) => {
                warn!(
                    reason = %reason,
                    raw = %text.chars().take(500).collect::<String>(),
                    "Model output unusable, building fallback plan"
                );
                PlanOutcome::Fallback {
                    plan: self.fallback().build(request, &range),
                    reason,
                }
            }
        }
    }

    /// Apply a chat instruction to an existing plan
    ///
    /// Returned plans are not budget-reconciled: edits the user asked for
    /// are kept as the model produced them.
    pub async fn modify(&self, request: &ModifyRequest) -> Result<ChatReply> {
        info!(
            trip_id = request.trip_id.as_deref().unwrap_or("-"),
            history = request.conversation_history.len(),
            "Modifying trip plan"
        );

        let prompt = {
            let mut prompts = self
                .prompts
                .write()
                .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
            let template = prompts.get(PromptId::ModifyTripPlan)?;
            build_modification_prompt(
                template,
                &request.current_plan,
                &request.conversation_history,
                &request.user_message,
            )?
        };

        let text = self
            .ai
            .generate(
                &prompt,
                &self.settings.chat_generation,
                &self.settings.chat_retry,
            )
            .await?;

        let reply = parse_chat_reply(&text);
        info!(updated = reply.updated_plan.is_some(), "Chat reply ready");
        Ok(reply)
    }

    fn generation_prompt(
        &self,
        request: &TripRequest,
        range: &crate::budget::BudgetRange,
    ) -> Result<String> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(PromptId::GenerateTripPlan)?;
        Ok(build_generation_prompt(
            template,
            request,
            range,
            &self.settings.pricing,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::budget::BudgetTier;
    use crate::models::{ChatMessage, ADJUSTMENT_NOTE};
    use chrono::NaiveDate;
    use serde_json::json;

    fn planner_with(mock: &MockBackend) -> TripPlanner {
        TripPlanner::new(
            AIClient::Mock(mock.clone()),
            PromptLibrary::embedded_only(),
            PlannerSettings::default(),
        )
    }

    fn goa(budget: &str) -> TripRequest {
        TripRequest {
            destination: "Goa".to_string(),
            current_location: "Mumbai".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            number_of_people: 2,
            budget_range: budget.to_string(),
            interests: None,
        }
    }

    fn plan_json(categories: &[(&str, u64)]) -> String {
        let breakdown: serde_json::Map<String, serde_json::Value> = categories
            .iter()
            .map(|(k, v)| (k.to_string(), json!({"estimated": v, "notes": "model"})))
            .collect();
        json!({
            "summary": "Sun and sand",
            "dailyItinerary": [
                {"day": 1, "date": "2025-03-01", "title": "Arrive", "activities": [
                    {"time": "Morning", "activity": "Beach", "location": "Baga", "estimatedCost": 0, "category": "Leisure"}
                ]}
            ],
            "budgetBreakdown": breakdown,
            "totalEstimatedCost": 1
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generate_within_range() {
        let mock = MockBackend::new();
        mock.push_text(format!(
            "```json\n{}\n```",
            plan_json(&[("accommodation", 30_000), ("food", 10_000)])
        ));

        let outcome = planner_with(&mock).generate(&goa("budget")).await;

        match outcome {
            PlanOutcome::Parsed {
                plan,
                reconciliation,
            } => {
                assert_eq!(reconciliation, Reconciliation::WithinRange { total: 40_000 });
                assert_eq!(plan.total_estimated_cost, 40_000);
                assert_eq!(plan.summary, "Sun and sand");
            }
            other => panic!("expected Parsed, got {:?}", other),
        }

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Goa"));
        assert!(prompts[0].contains("₹25,000"));
    }

    #[tokio::test]
    async fn test_generate_luxury_overrun_rescaled() {
        let mock = MockBackend::new();
        mock.push_text(plan_json(&[
            ("accommodation", 500_000),
            ("transportation", 200_000),
            ("food", 200_000),
            ("activities", 100_000),
        ]));

        let plan = planner_with(&mock)
            .generate(&goa("luxury"))
            .await
            .into_result()
            .unwrap();

        let range = BudgetTier::Luxury.range();
        assert_eq!(plan.total_estimated_cost, 350_000);
        assert_eq!(plan.breakdown_total(), 350_000);
        assert!(range.contains(plan.total_estimated_cost));
        assert_eq!(plan.budget_breakdown["accommodation"].estimated, 175_000);
        assert!(plan.budget_breakdown["food"].notes.ends_with(ADJUSTMENT_NOTE));
    }

    #[tokio::test]
    async fn test_generate_no_json_falls_back() {
        let mock = MockBackend::new();
        mock.push_text("I'm sorry, I can't plan that trip right now.");

        let outcome = planner_with(&mock).generate(&goa("budget")).await;

        assert!(outcome.is_fallback());
        let PlanOutcome::Fallback { plan, reason } = outcome else {
            unreachable!()
        };
        assert_eq!(reason, PlanRejection::NoJson);
        assert_eq!(plan.daily_itinerary.len(), 3);
        assert!(plan.total_estimated_cost <= BudgetTier::Budget.range().max);
    }

    #[tokio::test]
    async fn test_generate_zero_total_falls_back() {
        let mock = MockBackend::new();
        mock.push_text(plan_json(&[("food", 0)]));

        let outcome = planner_with(&mock).generate(&goa("budget")).await;

        assert!(matches!(
            outcome,
            PlanOutcome::Fallback {
                reason: PlanRejection::DegenerateTotal,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generate_overflowing_breakdown_falls_back() {
        let mock = MockBackend::new();
        let half = u64::MAX / 2;
        mock.push_text(plan_json(&[("food", half), ("stay", half), ("travel", half)]));

        let outcome = planner_with(&mock).generate(&goa("mid-range")).await;

        let (plan, reason) = match outcome {
            PlanOutcome::Fallback { plan, reason } => (plan, reason),
            other => panic!("expected Fallback, got {:?}", other),
        };
        assert_eq!(reason, PlanRejection::TotalOverflow);
        assert!(BudgetTier::MidRange.range().contains(plan.total_estimated_cost));
        assert_eq!(plan.breakdown_total(), plan.total_estimated_cost);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_retries_overload() {
        let mock = MockBackend::new();
        mock.push_status(503, "overloaded")
            .push_status(503, "overloaded")
            .push_text(plan_json(&[("food", 50_000)]));

        let started = tokio::time::Instant::now();
        let outcome = planner_with(&mock).generate(&goa("budget")).await;

        assert!(matches!(outcome, PlanOutcome::Parsed { .. }));
        assert_eq!(mock.remaining(), 0);
        assert_eq!(started.elapsed(), std::time::Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_exhausted_overload_fails() {
        let mock = MockBackend::new();
        for _ in 0..3 {
            mock.push_status(503, "overloaded");
        }

        let outcome = planner_with(&mock).generate(&goa("budget")).await;

        assert!(matches!(
            outcome,
            PlanOutcome::Failed(Error::Overloaded { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_upstream_error_fails() {
        let mock = MockBackend::new();
        mock.push_status(500, "boom").push_text("never used");

        let outcome = planner_with(&mock).generate(&goa("budget")).await;

        assert!(matches!(
            outcome,
            PlanOutcome::Failed(Error::Upstream { status: 500, .. })
        ));
        assert_eq!(mock.remaining(), 1);
    }

    #[tokio::test]
    async fn test_generate_invalid_request() {
        let mock = MockBackend::new();
        let mut request = goa("budget");
        request.end_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();

        let outcome = planner_with(&mock).generate(&request).await;

        match outcome.into_result() {
            Err(e) => assert!(e.is_client_error()),
            Ok(_) => panic!("expected invalid request"),
        }
        assert!(mock.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generate_missing_api_key_fails_without_call() {
        let planner = TripPlanner::new(
            AIClient::gemini("http://127.0.0.1:9", "gemini-2.0-flash", None),
            PromptLibrary::embedded_only(),
            PlannerSettings::default(),
        );

        let outcome = planner.generate(&goa("budget")).await;

        assert!(matches!(outcome, PlanOutcome::Failed(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_modify_does_not_reconcile() {
        let mock = MockBackend::new();
        let updated = plan_json(&[("accommodation", 9_000_000)]);
        mock.push_text(format!(
            "{{\"response\": \"Upgraded to a palace hotel\", \"updatedPlan\": {}}}",
            updated
        ));

        let request = ModifyRequest {
            trip_id: Some("trip-1".to_string()),
            current_plan: json!({"summary": "Sun and sand"}),
            user_message: "Make it a palace".to_string(),
            conversation_history: vec![],
        };

        let reply = planner_with(&mock).modify(&request).await.unwrap();

        assert_eq!(reply.response, "Upgraded to a palace hotel");
        let plan = reply.updated_plan.unwrap();
        assert_eq!(plan.budget_breakdown["accommodation"].estimated, 9_000_000);
        assert_eq!(plan.total_estimated_cost, 1);
        assert_eq!(plan.budget_breakdown["accommodation"].notes, "model");
    }

    #[tokio::test]
    async fn test_modify_plain_text_and_history_window() {
        let mock = MockBackend::new();
        mock.push_text("March is a great time to visit.");

        let history: Vec<ChatMessage> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("question {}", i))
                } else {
                    ChatMessage::assistant(format!("answer {}", i))
                }
            })
            .collect();
        let request = ModifyRequest {
            trip_id: None,
            current_plan: json!({}),
            user_message: "When should I go?".to_string(),
            conversation_history: history,
        };

        let reply = planner_with(&mock).modify(&request).await.unwrap();

        assert_eq!(reply.response, "March is a great time to visit.");
        assert!(reply.updated_plan.is_none());

        let prompt = &mock.prompts()[0];
        assert!(!prompt.contains("answer 1"));
        assert!(!prompt.contains("question 2"));
        assert!(prompt.contains("answer 3"));
        assert!(prompt.contains("assistant: answer 7"));
    }

    #[tokio::test]
    async fn test_modify_upstream_failure_not_retried() {
        let mock = MockBackend::new();
        mock.push_status(503, "busy").push_text("late");

        let request = ModifyRequest {
            trip_id: None,
            current_plan: json!({}),
            user_message: "hi".to_string(),
            conversation_history: vec![],
        };

        let err = planner_with(&mock).modify(&request).await.unwrap_err();
        assert!(matches!(err, Error::Overloaded { attempts: 1, .. }));
        assert_eq!(mock.remaining(), 1);
    }
}
