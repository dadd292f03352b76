//! Spend summary over `transaction` events.

use serde::Serialize;
use std::collections::HashSet;

use crate::funnel::round2;
use crate::models::{CleanedEvent, EventKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub transactions: usize,
    /// Distinct customers with at least one transaction
    pub customers: usize,
    /// Transactions whose payload carried an amount
    pub with_amount: usize,
    pub total_amount: f64,
    pub mean_amount: Option<f64>,
}

/// Summarize transactions. Rows without an amount count as transactions
/// but do not enter the totals.
pub fn summarize_transactions(events: &[CleanedEvent]) -> TransactionSummary {
    let mut summary = TransactionSummary::default();
    let mut customers = HashSet::new();
    let mut total = 0.0;

    for event in events.iter().filter(|e| *e.kind() == EventKind::Transaction) {
        summary.transactions += 1;
        customers.insert(event.customer_id());
        if let Some(amount) = event.transaction_amount {
            summary.with_amount += 1;
            total += amount;
        }
    }

    summary.customers = customers.len();
    summary.total_amount = round2(total);
    if summary.with_amount > 0 {
        summary.mean_amount = Some(round2(total / summary.with_amount as f64));
    }
    summary
}
