//! Deterministic fallback itineraries
//!
//! When the model's output cannot be used, a plan is synthesized from the
//! request alone: a fixed percentage split of the target amount, one day per
//! calendar day with three activities, and destination-specific placeholder
//! advice. The total never exceeds the window's max.

use std::collections::BTreeMap;

use chrono::Days;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::budget::{format_inr, BudgetRange};
use crate::error::{Error, Result};
use crate::models::{
    Activity, BudgetCategory, DayPlan, FoodRecommendation, HiddenGem, LocalTransport,
    Transportation, TripPlan, TripRequest,
};
use crate::reconcile::TargetStrategy;

/// Percentage of the target given to each category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationTable {
    pub accommodation: u8,
    pub transportation: u8,
    pub food: u8,
    pub activities: u8,
    pub miscellaneous: u8,
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self {
            accommodation: 40,
            transportation: 25,
            food: 20,
            activities: 10,
            miscellaneous: 5,
        }
    }
}

impl AllocationTable {
    /// Sum of all percentages
    pub fn total_percent(&self) -> u32 {
        [
            self.accommodation,
            self.transportation,
            self.food,
            self.activities,
            self.miscellaneous,
        ]
        .iter()
        .map(|p| u32::from(*p))
        .sum()
    }

    /// Percentages above 100 would push fallback plans past the target
    pub fn validate(&self) -> Result<()> {
        let total = self.total_percent();
        if total > 100 {
            return Err(Error::Config(format!(
                "allocation percentages sum to {}, must be at most 100",
                total
            )));
        }
        Ok(())
    }

    /// Split `target` into per-category amounts (each floored)
    pub fn split(&self, target: u64) -> Allocation {
        let share = |percent: u8| (u128::from(target) * u128::from(percent) / 100) as u64;
        Allocation {
            accommodation: share(self.accommodation),
            transportation: share(self.transportation),
            food: share(self.food),
            activities: share(self.activities),
            miscellaneous: share(self.miscellaneous),
        }
    }
}

/// Concrete amounts produced by an [`AllocationTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub accommodation: u64,
    pub transportation: u64,
    pub food: u64,
    pub activities: u64,
    pub miscellaneous: u64,
}

impl Allocation {
    pub fn total(&self) -> u64 {
        self.accommodation + self.transportation + self.food + self.activities + self.miscellaneous
    }
}

/// Builds synthetic plans that always fit the budget window
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPlanner {
    pub allocation: AllocationTable,
    pub target: TargetStrategy,
}

impl FallbackPlanner {
    pub fn new(allocation: AllocationTable, target: TargetStrategy) -> Self {
        Self { allocation, target }
    }

    /// Synthesize a plan for `request` within `range`
    pub fn build(&self, request: &TripRequest, range: &BudgetRange) -> TripPlan {
        let days = request.trip_days().max(1) as u64;
        let people = u64::from(request.number_of_people.max(1));
        let destination = request.destination.as_str();

        let alloc = self.allocation.split(self.target.target(range));
        let total = alloc.total();

        let daily_food = alloc.food / days / people;
        let daily_activity = alloc.activities / days / people;

        info!(
            destination = %destination,
            days,
            total,
            "Building fallback itinerary"
        );

        let daily_itinerary = (0..days)
            .map(|i| {
                let date = request
                    .start_date
                    .checked_add_days(Days::new(i))
                    .unwrap_or(request.end_date);
                DayPlan {
                    day: (i + 1) as u32,
                    date: date.format("%Y-%m-%d").to_string(),
                    title: format!("Day {} - Budget Exploration of {}", i + 1, destination),
                    activities: vec![
                        Activity {
                            time: "Morning".to_string(),
                            activity: format!("Visit attractions in {}", destination),
                            location: format!("Central {}", destination),
                            estimated_cost: daily_activity * 3 / 10,
                            category: "Sightseeing".to_string(),
                        },
                        Activity {
                            time: "Afternoon".to_string(),
                            activity: "Budget local lunch".to_string(),
                            location: "Local restaurant".to_string(),
                            estimated_cost: daily_food,
                            category: "Food".to_string(),
                        },
                        Activity {
                            time: "Evening".to_string(),
                            activity: "Explore local areas".to_string(),
                            location: "Local area".to_string(),
                            estimated_cost: daily_activity * 2 / 10,
                            category: "Culture".to_string(),
                        },
                    ],
                }
            })
            .collect();

        let nights = request.nights();
        let budget_breakdown = BTreeMap::from([
            (
                "accommodation".to_string(),
                BudgetCategory::new(
                    alloc.accommodation,
                    format!("Budget accommodation for {} nights", nights),
                ),
            ),
            (
                "transportation".to_string(),
                BudgetCategory::new(alloc.transportation, "Transport costs at current market rates"),
            ),
            (
                "food".to_string(),
                BudgetCategory::new(alloc.food, "Meals at local restaurants"),
            ),
            (
                "activities".to_string(),
                BudgetCategory::new(alloc.activities, "Sightseeing and entry fees"),
            ),
            (
                "miscellaneous".to_string(),
                BudgetCategory::new(alloc.miscellaneous, "Emergency fund and miscellaneous expenses"),
            ),
        ]);

        TripPlan {
            summary: format!(
                "Budget-optimized {}-day trip to {} within your {} budget (Total: {})",
                days,
                destination,
                range,
                format_inr(total)
            ),
            daily_itinerary,
            budget_breakdown,
            transportation: Transportation {
                getting_there: format!(
                    "Transport from {} to {} at current market rates",
                    request.current_location, destination
                ),
                local_transport: LocalTransport {
                    modes: vec!["Public transport".to_string(), "Local options".to_string()],
                    daily_cost: alloc.transportation / days,
                },
            },
            accommodation: format!(
                "Budget accommodation in {} at current market rates",
                destination
            ),
            food_recommendations: vec![FoodRecommendation {
                name: "Local budget restaurants".to_string(),
                kind: "Budget dining".to_string(),
                description: format!("Affordable {} cuisine", destination),
                estimated_cost: daily_food,
            }],
            travel_tips: vec![
                format!("Compare current market rates before booking in {}", destination),
                "Book accommodation in advance for better rates".to_string(),
                "Use local transport for cost savings".to_string(),
            ],
            hidden_gems: vec![HiddenGem {
                name: "Budget-friendly local attractions".to_string(),
                description: "Free and low-cost attractions away from the main tourist trail"
                    .to_string(),
                location: format!("Around {}", destination),
            }],
            total_estimated_cost: total,
            extra: Default::default(),
        }
    }
}
