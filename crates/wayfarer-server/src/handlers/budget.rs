//! Budget range preview handler

use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};

use wayfarer_core::{budget_label, parse_budget_range, BudgetRange};

/// Query parameters for the budget preview
#[derive(Debug, Deserialize)]
pub struct BudgetRangeQuery {
    /// Preset label or custom `₹min-₹max` range (defaults to "budget")
    pub spec: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BudgetRangeResponse {
    pub min: u64,
    pub max: u64,
    /// Preset tier name, or null for custom ranges
    pub label: Option<&'static str>,
}

impl BudgetRangeResponse {
    fn new(range: BudgetRange, label: Option<&'static str>) -> Self {
        Self {
            min: range.min,
            max: range.max,
            label,
        }
    }
}

/// GET /api/budget-range - Show the window a budget label resolves to
pub async fn budget_range(Query(params): Query<BudgetRangeQuery>) -> Json<BudgetRangeResponse> {
    let spec = params.spec.as_deref().unwrap_or("budget");
    let range = parse_budget_range(spec);
    let label = budget_label(spec).map(|tier| tier.as_str());

    Json(BudgetRangeResponse::new(range, label))
}
