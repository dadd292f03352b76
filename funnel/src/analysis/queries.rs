//! Query catalogue.
//!
//! Each query is a funnel with an optional slicing dimension, a stage order
//! and an optional minimum dimension value. Queries are independent: they
//! only read the cleaned events and the offer index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::AnalysisOptions;
use crate::funnel::{
    aggregate, overall_observations, slice_observations, FunnelRow, JoinStats, OfferIndex,
    SliceSpec, StageOrder,
};
use crate::models::{CleanedEvent, Dimension};

/// The analytical queries of a full report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// All funnel events, ordered by customer count
    Overall,
    /// All funnel events, in received → viewed → completed order
    OverallStaged,
    OfferType,
    Difficulty,
    Reward,
    Duration,
}

impl Query {
    pub const ALL: [Query; 6] = [
        Query::Overall,
        Query::OverallStaged,
        Query::OfferType,
        Query::Difficulty,
        Query::Reward,
        Query::Duration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::OverallStaged => "overall_staged",
            Self::OfferType => "offer_type",
            Self::Difficulty => "difficulty",
            Self::Reward => "reward",
            Self::Duration => "duration",
        }
    }

    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Self::Overall | Self::OverallStaged => None,
            Self::OfferType => Some(Dimension::OfferType),
            Self::Difficulty => Some(Dimension::Difficulty),
            Self::Reward => Some(Dimension::Reward),
            Self::Duration => Some(Dimension::Duration),
        }
    }

    /// Every query ranks stages by count except the staged overall funnel.
    pub fn default_order(&self) -> StageOrder {
        match self {
            Self::OverallStaged => StageOrder::Canonical,
            _ => StageOrder::CountDesc,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Overall => "Funnel over all offers, stages ranked by customer count",
            Self::OverallStaged => "Funnel over all offers, stages in received/viewed/completed order",
            Self::OfferType => "Funnel per offer type",
            Self::Difficulty => "Funnel per offer difficulty",
            Self::Reward => "Funnel per offer reward",
            Self::Duration => "Funnel per offer duration",
        }
    }

    /// Concrete funnel for this query under `options`.
    pub fn to_funnel(&self, options: &AnalysisOptions) -> FunnelQuery {
        let dimension = self.dimension();
        FunnelQuery {
            name: self.name().to_string(),
            dimension,
            order: options.order_for(*self),
            min_value: dimension.and_then(|d| options.thresholds.min_for(d)),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Query {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|q| q.name() == wanted)
            .ok_or_else(|| format!("unknown query '{}'", s.trim()))
    }
}

/// A funnel to compute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelQuery {
    pub name: String,
    /// `None` for an unsliced funnel
    pub dimension: Option<Dimension>,
    pub order: StageOrder,
    pub min_value: Option<f64>,
}

impl FunnelQuery {
    /// Ad-hoc funnel, as requested from the command line.
    pub fn custom(dimension: Option<Dimension>, order: StageOrder, min_value: Option<f64>) -> Self {
        let name = dimension.map_or("overall", |d| d.as_str()).to_string();
        Self {
            name,
            dimension,
            order,
            min_value,
        }
    }

    /// Ad-hoc funnel that takes its order and minimum from `options`.
    pub fn from_options(dimension: Option<Dimension>, options: &AnalysisOptions) -> Self {
        let order = options.order_override.unwrap_or_default();
        let min_value = dimension.and_then(|d| options.thresholds.min_for(d));
        Self::custom(dimension, order, min_value)
    }
}

/// Rows of one funnel plus how the join behaved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub name: String,
    pub dimension: Option<Dimension>,
    pub order: StageOrder,
    pub min_value: Option<f64>,
    pub rows: Vec<FunnelRow>,
    /// Only present for sliced funnels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinStats>,
}

/// Compute one funnel.
pub fn run_funnel(events: &[CleanedEvent], offers: &OfferIndex<'_>, query: &FunnelQuery) -> QueryResult {
    let (rows, join) = match query.dimension {
        None => (aggregate(overall_observations(events), query.order), None),
        Some(dimension) => {
            let spec = SliceSpec::new(dimension).with_min(query.min_value);
            let (observations, stats) = slice_observations(events, offers, &spec);
            (aggregate(observations, query.order), Some(stats))
        }
    };

    QueryResult {
        name: query.name.clone(),
        dimension: query.dimension,
        order: query.order,
        min_value: query.min_value,
        rows,
        join,
    }
}
