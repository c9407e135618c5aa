//! Budget reconciliation
//!
//! Model-generated breakdowns frequently ignore the requested window. When
//! the summed categories fall outside `[min, max]` every category is scaled
//! proportionally toward a target inside the window, so that afterwards
//! `Σ estimated == totalEstimatedCost ∈ [min, max]` holds exactly.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::PlanRejection;
use crate::budget::{format_inr, BudgetRange};
use crate::models::{TripPlan, TripRequest, ADJUSTMENT_NOTE};

/// Where inside the window an adjusted or synthesized plan should land
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStrategy {
    /// Halfway between min and max (floored)
    #[default]
    Midpoint,
    /// A percentage of max, kept inside the window
    FractionOfMax(u8),
}

impl TargetStrategy {
    /// Resolve the target amount for `range`, clamped into `[min, max]`
    pub fn target(&self, range: &BudgetRange) -> u64 {
        let raw = match self {
            Self::Midpoint => range.midpoint(),
            Self::FractionOfMax(percent) => {
                let percent = u128::from((*percent).min(100));
                (u128::from(range.max) * percent / 100) as u64
            }
        };
        raw.max(range.min).min(range.max)
    }
}

/// What the reconciler did to a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reconciliation {
    /// The model's total already fit; categories untouched
    WithinRange { total: u64 },
    /// Categories were rescaled from `original_total` to `total`
    Rescaled { original_total: u64, total: u64 },
}

impl Reconciliation {
    /// Final total written to the plan
    pub fn total(&self) -> u64 {
        match self {
            Self::WithinRange { total } | Self::Rescaled { total, .. } => *total,
        }
    }
}

/// Enforces the budget window on a parsed plan
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetReconciler {
    pub target: TargetStrategy,
}

impl BudgetReconciler {
    pub fn new(target: TargetStrategy) -> Self {
        Self { target }
    }

    /// Bring `plan` inside `range`, mutating it in place
    ///
    /// A plan whose breakdown sums to zero cannot be scaled and is rejected
    /// unless zero already lies inside the window. So is one whose sum
    /// overflows `u64`, or whose rescaled total still misses the window.
    pub fn reconcile(
        &self,
        plan: &mut TripPlan,
        range: &BudgetRange,
        request: &TripRequest,
    ) -> Result<Reconciliation, PlanRejection> {
        let total = plan
            .checked_breakdown_total()
            .ok_or(PlanRejection::TotalOverflow)?;

        if range.contains(total) {
            debug!(total, "Plan total within budget window");
            plan.total_estimated_cost = total;
            return Ok(Reconciliation::WithinRange { total });
        }

        if total == 0 {
            return Err(PlanRejection::DegenerateTotal);
        }

        let target = self.target.target(range);
        info!(
            original_total = total,
            target,
            min = range.min,
            max = range.max,
            "Plan total outside budget window, rescaling"
        );

        let mut scaled_sum = 0u64;
        for category in plan.budget_breakdown.values_mut() {
            category.estimated =
                (u128::from(category.estimated) * u128::from(target) / u128::from(total)) as u64;
            category.notes.push_str(ADJUSTMENT_NOTE);
            scaled_sum += category.estimated;
        }

        // Flooring loses at most one unit per category; hand it to the largest
        let remainder = target.saturating_sub(scaled_sum);
        if remainder > 0 {
            let largest = plan
                .budget_breakdown
                .values_mut()
                .reduce(|best, c| if c.estimated > best.estimated { c } else { best });
            if let Some(category) = largest {
                category.estimated += remainder;
            }
        }

        let adjusted = plan.breakdown_total();
        if !range.contains(adjusted) {
            return Err(PlanRejection::OutOfRange {
                total: adjusted,
                min: range.min,
                max: range.max,
            });
        }
        plan.total_estimated_cost = adjusted;
        plan.summary = adjusted_summary(request, range, adjusted);

        Ok(Reconciliation::Rescaled {
            original_total: total,
            total: adjusted,
        })
    }
}

fn adjusted_summary(request: &TripRequest, range: &BudgetRange, total: u64) -> String {
    format!(
        "Budget-optimized {}-day trip to {}, adjusted to stay within your {} budget (Total: {})",
        request.trip_days(),
        request.destination,
        range,
        format_inr(total)
    )
}
