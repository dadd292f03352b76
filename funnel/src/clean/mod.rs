//! Cleaning stage: event log → `events_cleaned`.
//!
//! Every event keeps its original columns and gains three derived fields
//! read from its payload: `transaction_amount`, `offer_id`, `reward_amount`.
//! A payload that cannot be parsed leaves those fields null; the row is
//! kept so funnel counts stay robust to bad rows.

pub mod payload;

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{CleanedEvent, Event, EventLog};

pub use payload::{Payload, PayloadFields, AMOUNT_KEYS, OFFER_ID_KEYS, REWARD_KEYS};

/// Columns appended to the original header in `events_cleaned`.
pub const DERIVED_COLUMNS: [&str; 3] = ["transaction_amount", "offer_id", "reward_amount"];

/// How many malformed payloads are kept as samples.
const MALFORMED_SAMPLES: usize = 10;

/// Counters gathered while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanStats {
    pub rows: usize,
    pub malformed: usize,
    pub with_offer_id: usize,
    pub with_amount: usize,
    pub with_reward: usize,
}

/// A payload that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedPayload {
    /// Zero-based row index in the event log
    pub row: usize,
    pub reason: String,
}

/// Result of the cleaning stage.
#[derive(Debug, Clone)]
pub struct CleanResult {
    /// Original headers of the event log
    pub headers: Vec<String>,
    pub events: Vec<CleanedEvent>,
    pub stats: CleanStats,
    /// First few malformed payloads
    pub malformed: Vec<MalformedPayload>,
}

impl CleanResult {
    /// Header of `events_cleaned`: original columns then the derived ones.
    pub fn output_headers(&self) -> Vec<String> {
        self.headers
            .iter()
            .cloned()
            .chain(DERIVED_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Write `events_cleaned` as CSV. Nulls become empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> CsvResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.output_headers())?;

        for event in &self.events {
            let derived = [
                event.transaction_amount.map(|v| v.to_string()).unwrap_or_default(),
                event.offer_id.clone().unwrap_or_default(),
                event.reward_amount.map(|v| v.to_string()).unwrap_or_default(),
            ];
            csv.write_record(event.source.columns.iter().chain(derived.iter()))?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write `events_cleaned` to a file.
    pub fn write_csv_file(&self, path: &Path) -> CsvResult<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

/// Clean a single event.
pub fn clean_event(event: Event) -> (CleanedEvent, Option<crate::error::PayloadError>) {
    let (fields, error) = PayloadFields::from_raw(&event.value);
    let cleaned = CleanedEvent {
        source: event,
        transaction_amount: fields.transaction_amount,
        offer_id: fields.offer_id,
        reward_amount: fields.reward_amount,
    };
    (cleaned, error)
}

/// Clean the whole event log.
///
/// Never fails: malformed payloads are counted, sampled and logged.
pub fn clean(log: EventLog) -> CleanResult {
    log_info(format!("🧹 Cleaning {} events...", log.len()));

    let mut stats = CleanStats::default();
    let mut malformed = Vec::new();
    let mut events = Vec::with_capacity(log.events.len());

    for (row, event) in log.events.into_iter().enumerate() {
        let (cleaned, error) = clean_event(event);

        stats.rows += 1;
        if let Some(e) = error {
            stats.malformed += 1;
            if malformed.len() < MALFORMED_SAMPLES {
                malformed.push(MalformedPayload {
                    row,
                    reason: e.to_string(),
                });
            }
        }
        if cleaned.offer_id.is_some() {
            stats.with_offer_id += 1;
        }
        if cleaned.transaction_amount.is_some() {
            stats.with_amount += 1;
        }
        if cleaned.reward_amount.is_some() {
            stats.with_reward += 1;
        }

        events.push(cleaned);
    }

    log_success(format!(
        "{} rows: {} with offer id, {} with amount, {} with reward",
        stats.rows, stats.with_offer_id, stats.with_amount, stats.with_reward
    ));
    if stats.malformed > 0 {
        log_warning(format!("{} payloads could not be parsed (fields left null)", stats.malformed));
        for sample in malformed.iter().take(3) {
            log_warning(format!("• row {}: {}", sample.row, sample.reason));
        }
    }

    CleanResult {
        headers: log.headers,
        events,
        stats,
        malformed,
    }
}
