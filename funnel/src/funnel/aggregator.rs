//! Funnel aggregation.
//!
//! For every (slice, event) pair the number of distinct customers is
//! counted. Rows of a slice are then ordered (see [`StageOrder`]) and
//! each row is compared with the one before it:
//!
//! ```text
//! churn_rate      = (previous_count - event_count) * 100 / previous_count
//! conversion_rate =  event_count                   * 100 / previous_count
//! ```
//!
//! Both are rounded to two decimals and are null for the first row.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{FunnelRow, StageOrder};
use crate::models::{EventKind, SliceKey};

/// One customer doing one funnel event, tagged with its slice.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelObservation<'a> {
    pub slice: Option<SliceKey>,
    pub event: &'a EventKind,
    pub customer_id: &'a str,
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage drop from `previous` to `current`, null without a usable previous count.
pub fn churn_rate(previous: Option<u64>, current: u64) -> Option<f64> {
    match previous {
        Some(prev) if prev > 0 => {
            Some(round2((prev as f64 - current as f64) * 100.0 / prev as f64))
        }
        _ => None,
    }
}

/// Percentage of `previous` still present at `current`.
pub fn conversion_rate(previous: Option<u64>, current: u64) -> Option<f64> {
    match previous {
        Some(prev) if prev > 0 => Some(round2(current as f64 * 100.0 / prev as f64)),
        _ => None,
    }
}

/// Build funnel rows from observations.
///
/// Slices come out in ascending key order (the unsliced `None` first);
/// inside a slice rows follow `order`.
pub fn aggregate<'a, I>(observations: I, order: StageOrder) -> Vec<FunnelRow>
where
    I: IntoIterator<Item = FunnelObservation<'a>>,
{
    let mut customers: HashMap<(Option<SliceKey>, &'a EventKind), HashSet<&'a str>> =
        HashMap::new();

    for obs in observations {
        customers
            .entry((obs.slice, obs.event))
            .or_default()
            .insert(obs.customer_id);
    }

    let mut slices: BTreeMap<Option<SliceKey>, Vec<(EventKind, u64)>> = BTreeMap::new();
    for ((slice, event), ids) in customers {
        slices
            .entry(slice)
            .or_default()
            .push((event.clone(), ids.len() as u64));
    }

    let mut rows = Vec::new();
    for (slice, mut counts) in slices {
        sort_stages(&mut counts, order);
        rows.extend(chain(slice, counts));
    }
    rows
}

fn sort_stages(counts: &mut [(EventKind, u64)], order: StageOrder) {
    match order {
        StageOrder::CountDesc => {
            counts.sort_by(|(ea, ca), (eb, cb)| cb.cmp(ca).then_with(|| ea.cmp(eb)))
        }
        StageOrder::Canonical => counts.sort_by(|(ea, _), (eb, _)| ea.cmp(eb)),
    }
}

fn chain(slice: Option<SliceKey>, counts: Vec<(EventKind, u64)>) -> Vec<FunnelRow> {
    let mut previous = None;
    counts
        .into_iter()
        .map(|(event, event_count)| {
            let row = FunnelRow {
                slice: slice.clone(),
                event,
                event_count,
                previous_count: previous,
                churn_rate: churn_rate(previous, event_count),
                conversion_rate: conversion_rate(previous, event_count),
            };
            previous = Some(event_count);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    static RECEIVED: EventKind = EventKind::OfferReceived;
    static VIEWED: EventKind = EventKind::OfferViewed;
    static COMPLETED: EventKind = EventKind::OfferCompleted;

    fn obs<'a>(event: &'a EventKind, customer_id: &'a str) -> FunnelObservation<'a> {
        FunnelObservation {
            slice: None,
            event,
            customer_id,
        }
    }

    fn sliced<'a>(slice: f64, event: &'a EventKind, customer_id: &'a str) -> FunnelObservation<'a> {
        FunnelObservation {
            slice: Some(SliceKey::Number(slice)),
            event,
            customer_id,
        }
    }

    #[test]
    fn test_distinct_customers() {
        let rows = aggregate(
            vec![
                obs(&VIEWED, "1"),
                obs(&VIEWED, "1"),
                obs(&VIEWED, "2"),
            ],
            StageOrder::CountDesc,
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_count, 2);
    }

    #[test]
    fn test_three_received_two_viewed() {
        let rows = aggregate(
            vec![
                obs(&RECEIVED, "1"),
                obs(&RECEIVED, "2"),
                obs(&RECEIVED, "3"),
                obs(&VIEWED, "1"),
                obs(&VIEWED, "2"),
            ],
            StageOrder::CountDesc,
        );

        assert_eq!(rows[0].event, RECEIVED);
        assert_eq!(rows[0].previous_count, None);
        assert_eq!(rows[0].churn_rate, None);
        assert_eq!(rows[1].event, VIEWED);
        assert_eq!(rows[1].previous_count, Some(3));
        assert_eq!(rows[1].churn_rate, Some(33.33));
        assert_eq!(rows[1].conversion_rate, Some(66.67));
    }

    #[test]
    fn test_count_desc_vs_canonical() {
        // More customers completed than viewed.
        let mut observations = Vec::new();
        let ids: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        for id in &ids {
            observations.push(obs(&RECEIVED, id));
        }
        for id in &ids[..3] {
            observations.push(obs(&VIEWED, id));
        }
        for id in &ids[..6] {
            observations.push(obs(&COMPLETED, id));
        }

        let by_count = aggregate(observations.clone(), StageOrder::CountDesc);
        let events: Vec<&EventKind> = by_count.iter().map(|r| &r.event).collect();
        assert_eq!(events, vec![&RECEIVED, &COMPLETED, &VIEWED]);
        assert_eq!(by_count[2].churn_rate, Some(50.0));

        let staged = aggregate(observations, StageOrder::Canonical);
        let events: Vec<&EventKind> = staged.iter().map(|r| &r.event).collect();
        assert_eq!(events, vec![&RECEIVED, &VIEWED, &COMPLETED]);
        assert_eq!(staged[1].churn_rate, Some(70.0));
        assert_eq!(staged[2].churn_rate, Some(-100.0));
    }

    #[test]
    fn test_ties_break_by_stage() {
        let rows = aggregate(
            vec![obs(&COMPLETED, "1"), obs(&RECEIVED, "1")],
            StageOrder::CountDesc,
        );
        assert_eq!(rows[0].event, RECEIVED);
        assert_eq!(rows[1].event, COMPLETED);
        assert_eq!(rows[1].churn_rate, Some(0.0));
    }

    #[test]
    fn test_difficulty_slice_100_80_62() {
        let ids: Vec<String> = (0..100).map(|i| format!("c{}", i)).collect();
        let mut observations = Vec::new();
        for id in &ids {
            observations.push(sliced(5.0, &RECEIVED, id));
        }
        for id in &ids[..80] {
            observations.push(sliced(5.0, &VIEWED, id));
        }
        for id in &ids[..62] {
            observations.push(sliced(5.0, &COMPLETED, id));
        }
        observations.push(sliced(10.0, &RECEIVED, "x"));

        let rows = aggregate(observations, StageOrder::CountDesc);

        let five: Vec<&FunnelRow> = rows
            .iter()
            .filter(|r| r.slice == Some(SliceKey::Number(5.0)))
            .collect();
        assert_eq!(five.len(), 3);
        assert_eq!(five[0].churn_rate, None);
        assert_eq!(five[1].churn_rate, Some(20.0));
        assert_eq!(five[2].churn_rate, Some(22.5));

        // each slice starts its own chain
        let ten = rows.last().unwrap();
        assert_eq!(ten.slice, Some(SliceKey::Number(10.0)));
        assert_eq!(ten.previous_count, None);
    }

    #[test]
    fn test_rates_without_previous() {
        assert_eq!(churn_rate(None, 4), None);
        assert_eq!(churn_rate(Some(0), 4), None);
        assert_eq!(conversion_rate(Some(0), 0), None);
        assert_eq!(churn_rate(Some(8), 6), Some(25.0));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(22.5), 22.5);
    }
}
