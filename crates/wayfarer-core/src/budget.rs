//! Budget range parsing
//!
//! A trip's budget arrives either as a preset tier label (`budget`,
//! `mid-range`, `luxury`) or as a custom range typed by the user, e.g.
//! `₹10,000-₹50,000`. Both resolve to a [`BudgetRange`]; anything that cannot
//! be understood silently becomes the `budget` tier.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preset budget tiers with fixed rupee windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetTier {
    Budget,
    MidRange,
    Luxury,
}

impl BudgetTier {
    /// Get the string identifier for this tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::MidRange => "mid-range",
            Self::Luxury => "luxury",
        }
    }

    /// The fixed window for this tier
    pub fn range(&self) -> BudgetRange {
        match self {
            Self::Budget => BudgetRange {
                min: 25_000,
                max: 75_000,
            },
            Self::MidRange => BudgetRange {
                min: 75_000,
                max: 200_000,
            },
            Self::Luxury => BudgetRange {
                min: 200_000,
                max: 500_000,
            },
        }
    }

    /// Get all tiers
    pub fn all() -> &'static [BudgetTier] {
        &[Self::Budget, Self::MidRange, Self::Luxury]
    }
}

impl FromStr for BudgetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Ok(Self::Budget),
            "mid-range" => Ok(Self::MidRange),
            "luxury" => Ok(Self::Luxury),
            other => Err(format!("Unknown budget tier: {}", other)),
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive budget window in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: u64,
    pub max: u64,
}

impl BudgetRange {
    /// Whether `amount` lies inside the window (both ends inclusive)
    pub fn contains(&self, amount: u64) -> bool {
        amount >= self.min && amount <= self.max
    }

    /// Floor of the window's midpoint
    pub fn midpoint(&self) -> u64 {
        self.min + (self.max - self.min) / 2
    }
}

impl Default for BudgetRange {
    fn default() -> Self {
        BudgetTier::Budget.range()
    }
}

impl fmt::Display for BudgetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_inr(self.min), format_inr(self.max))
    }
}

fn custom_range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(?:₹|rs\.?|inr|\$|€|£)\s*(\d[\d,]*)\s*-\s*(?:₹|rs\.?|inr|\$|€|£)\s*(\d[\d,]*)",
        )
        .expect("valid regex")
    })
}

/// Parse a budget specifier into a window
///
/// Presets are matched case-insensitively. Custom ranges need a currency
/// prefix on both bounds; grouping commas are stripped. Unparseable input,
/// overflowing numbers and inverted windows all fall back to the `budget` tier.
pub fn parse_budget_range(spec: &str) -> BudgetRange {
    if let Some(range) = parse_custom_range(spec) {
        return range;
    }

    match spec.parse::<BudgetTier>() {
        Ok(tier) => tier.range(),
        Err(_) => {
            debug!(spec = %spec, "Unrecognized budget range, using budget tier");
            BudgetTier::Budget.range()
        }
    }
}

/// Classify a specifier: the preset tier it names, if any
pub fn budget_label(spec: &str) -> Option<BudgetTier> {
    spec.parse().ok()
}

/// Parse a custom `₹min-₹max` range, if `spec` is one
pub fn parse_custom_range(spec: &str) -> Option<BudgetRange> {
    let caps = custom_range_pattern().captures(spec)?;
    let min = parse_grouped(caps.get(1)?.as_str())?;
    let max = parse_grouped(caps.get(2)?.as_str())?;

    if min >= max {
        debug!(min, max, "Custom budget range is inverted or empty, ignoring");
        return None;
    }

    Some(BudgetRange { min, max })
}

fn parse_grouped(digits: &str) -> Option<u64> {
    digits.replace(',', "").parse().ok()
}

/// Format an amount as rupees with Indian digit grouping (`₹1,23,456`)
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{}", digits);
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();

    format!("₹{},{}", groups.join(","), tail)
}
