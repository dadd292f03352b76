//! Funnel analysis over cleaned events.
//!
//! - `aggregator`: distinct-customer counts, stage ordering, previous count, churn
//! - `slice`: join events to offers and pick a slicing dimension
//!
//! ## Usage Flow
//!
//! ```text
//! CleanedEvent[] ─┬─ overall_observations ─────────────────┐
//!                 └─ slice_observations(offers, dimension) ─┴─ aggregate(order) → FunnelRow[]
//! ```

pub mod aggregator;
pub mod slice;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{EventKind, SliceKey};

pub use aggregator::{aggregate, churn_rate, conversion_rate, round2, FunnelObservation};
pub use slice::{overall_observations, slice_observations, JoinStats, OfferIndex, SliceSpec};

/// How stages are ordered inside a slice before previous counts are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOrder {
    /// Largest distinct-customer count first. Ties fall back to stage order.
    #[default]
    CountDesc,
    /// received → viewed → completed
    Canonical,
}

impl StageOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CountDesc => "count_desc",
            Self::Canonical => "canonical",
        }
    }
}

impl fmt::Display for StageOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "count_desc" | "count" => Ok(Self::CountDesc),
            "canonical" | "stage" => Ok(Self::Canonical),
            other => Err(format!(
                "unknown stage order '{}' (expected count_desc or canonical)",
                other
            )),
        }
    }
}

/// One row of a funnel result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelRow {
    /// Slice value, `None` for an unsliced funnel
    pub slice: Option<SliceKey>,
    pub event: EventKind,
    /// Distinct customers with this event in this slice
    pub event_count: u64,
    /// Count of the preceding row in the slice
    pub previous_count: Option<u64>,
    /// Percentage drop from `previous_count`, two decimals
    pub churn_rate: Option<f64>,
    /// Percentage kept from `previous_count`, two decimals
    pub conversion_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_parse() {
        assert_eq!("count-desc".parse::<StageOrder>().unwrap(), StageOrder::CountDesc);
        assert_eq!("Canonical".parse::<StageOrder>().unwrap(), StageOrder::Canonical);
        assert!("random".parse::<StageOrder>().is_err());
        assert_eq!(StageOrder::default(), StageOrder::CountDesc);
    }
}
