//! Join cleaned events to offers and slice them by an offer attribute.
//!
//! The join is inner: funnel events without an offer id, or whose offer id
//! is not in the catalogue, are left out of sliced funnels. They are
//! counted in [`JoinStats`] so the loss stays visible.

use serde::Serialize;
use std::collections::HashMap;

use super::FunnelObservation;
use crate::models::{CleanedEvent, Dimension, Offer, SliceKey};

/// Offers keyed by id.
#[derive(Debug, Clone, Default)]
pub struct OfferIndex<'a> {
    by_id: HashMap<&'a str, &'a Offer>,
}

impl<'a> OfferIndex<'a> {
    /// Index offers by id. The first offer with a given id wins.
    pub fn new(offers: &'a [Offer]) -> Self {
        let mut by_id = HashMap::with_capacity(offers.len());
        for offer in offers {
            by_id.entry(offer.offer_id.as_str()).or_insert(offer);
        }
        Self { by_id }
    }

    pub fn get(&self, offer_id: &str) -> Option<&'a Offer> {
        self.by_id.get(offer_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Which dimension to slice by, and the smallest value kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceSpec {
    pub dimension: Dimension,
    /// Ignored for non-numeric dimensions
    pub min_value: Option<f64>,
}

impl SliceSpec {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            min_value: None,
        }
    }

    pub fn with_min(mut self, min_value: Option<f64>) -> Self {
        self.min_value = min_value;
        self
    }

    fn keeps(&self, key: &SliceKey) -> bool {
        match (self.dimension.is_numeric(), self.min_value, key.as_number()) {
            (true, Some(min), Some(value)) => value >= min,
            _ => true,
        }
    }
}

/// Where the funnel events of a sliced query went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    /// Funnel events considered
    pub considered: usize,
    /// Events that reached the aggregator
    pub kept: usize,
    /// No offer id in the payload
    pub without_offer_id: usize,
    /// Offer id not in the catalogue
    pub unmatched: usize,
    /// Matching offer has no value for the dimension
    pub null_dimension: usize,
    /// Dimension value under the minimum
    pub below_minimum: usize,
}

impl JoinStats {
    /// Events lost to the inner join.
    pub fn dropped_by_join(&self) -> usize {
        self.without_offer_id + self.unmatched
    }
}

/// Unsliced observations: every funnel event.
pub fn overall_observations(events: &[CleanedEvent]) -> Vec<FunnelObservation<'_>> {
    events
        .iter()
        .filter(|e| e.kind().is_funnel_stage())
        .map(|e| FunnelObservation {
            slice: None,
            event: e.kind(),
            customer_id: e.customer_id(),
        })
        .collect()
}

/// Observations sliced by `spec.dimension` through an inner join on offer id.
pub fn slice_observations<'a>(
    events: &'a [CleanedEvent],
    offers: &OfferIndex<'_>,
    spec: &SliceSpec,
) -> (Vec<FunnelObservation<'a>>, JoinStats) {
    let mut stats = JoinStats::default();
    let mut observations = Vec::new();

    for event in events.iter().filter(|e| e.kind().is_funnel_stage()) {
        stats.considered += 1;

        let Some(offer_id) = event.offer_id.as_deref() else {
            stats.without_offer_id += 1;
            continue;
        };
        let Some(offer) = offers.get(offer_id) else {
            stats.unmatched += 1;
            continue;
        };
        let Some(key) = spec.dimension.value(offer) else {
            stats.null_dimension += 1;
            continue;
        };
        if !spec.keeps(&key) {
            stats.below_minimum += 1;
            continue;
        }

        stats.kept += 1;
        observations.push(FunnelObservation {
            slice: Some(key),
            event: event.kind(),
            customer_id: event.customer_id(),
        });
    }

    (observations, stats)
}
