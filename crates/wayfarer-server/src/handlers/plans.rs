//! Trip plan generation and chat modification handlers

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{AppError, AppState};
use wayfarer_core::{ChatReply, ModifyRequest, PlanOutcome, TripPlan, TripRequest};

/// Hint returned alongside generation failures
pub const GENERATE_FAILURE_DETAILS: &str =
    "Please try again. The AI service may be temporarily overloaded.";

/// Assistant text returned alongside chat failures
pub const MODIFY_FAILURE_RESPONSE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

#[derive(Debug, Deserialize)]
pub struct GenerateTripPlanRequest {
    pub trip: TripRequest,
}

#[derive(Debug, Serialize)]
pub struct GenerateTripPlanResponse {
    pub plan: TripPlan,
}

/// POST /api/generate-trip-plan - Generate a budget-conforming itinerary
pub async fn generate_trip_plan(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerateTripPlanResponse>, AppError> {
    let request: GenerateTripPlanRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(&format!("Invalid trip request: {}", e)))?;

    match state.planner.generate(&request.trip).await {
        PlanOutcome::Parsed {
            plan,
            reconciliation,
        } => {
            info!(
                destination = %request.trip.destination,
                total = reconciliation.total(),
                "Returning generated plan"
            );
            Ok(Json(GenerateTripPlanResponse { plan }))
        }
        PlanOutcome::Fallback { plan, reason } => {
            warn!(
                destination = %request.trip.destination,
                reason = %reason,
                "Returning fallback plan"
            );
            Ok(Json(GenerateTripPlanResponse { plan }))
        }
        PlanOutcome::Failed(e) if e.is_client_error() => Err(AppError::bad_request(&e.to_string())),
        PlanOutcome::Failed(e) => {
            warn!(error = %e, "Trip plan generation failed");
            Err(AppError::internal(&e.to_string()).with_detail("details", GENERATE_FAILURE_DETAILS))
        }
    }
}

/// POST /api/modify-trip-plan - Revise a plan from a chat message
pub async fn modify_trip_plan(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatReply>, AppError> {
    let request: ModifyRequest = serde_json::from_slice(&body).map_err(|e| {
        AppError::bad_request(&format!("Invalid modification request: {}", e))
            .with_detail("response", MODIFY_FAILURE_RESPONSE)
    })?;

    match state.planner.modify(&request).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            warn!(error = %e, "Trip plan modification failed");
            Err(AppError::internal(&e.to_string()).with_detail("response", MODIFY_FAILURE_RESPONSE))
        }
    }
}
