//! High-level pipeline API: CSV files → cleaned events → funnel report.
//!
//! # Example
//!
//! ```rust,ignore
//! use offer_funnel::{run, AnalysisOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = run(
//!         Path::new("events.csv"),
//!         Path::new("offers.csv"),
//!         &AnalysisOptions::default(),
//!     )?;
//!
//!     println!("{} queries", output.report.queries.len());
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use super::queries::{run_funnel, QueryResult};
use super::transactions::{summarize_transactions, TransactionSummary};
use crate::clean::{clean, CleanResult, CleanStats, MalformedPayload};
use crate::config::AnalysisOptions;
use crate::error::{PipelineError, PipelineResult};
use crate::funnel::OfferIndex;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::EventLog;
use crate::parser::{events_from_table, offer_rows_from_table, parse_file_auto, ParseResult};
use crate::validation::{CatalogStats, OfferCatalog, RejectedOffer};

/// Everything a full run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub cleaning: CleanStats,
    /// First few payloads that could not be parsed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed_payloads: Vec<MalformedPayload>,
    pub offers: CatalogStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_offers: Vec<RejectedOffer>,
    pub queries: Vec<QueryResult>,
    pub transactions: TransactionSummary,
}

/// Cleaned events, offers and the report of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub cleaned: CleanResult,
    pub catalog: OfferCatalog,
    pub report: AnalysisReport,
}

/// Read the event log from a CSV file. A log without events is an error.
pub fn load_events(path: &Path) -> PipelineResult<EventLog> {
    log_info(format!("📖 Reading events: {}", path.display()));
    let table = parse_file_auto(path)?;
    describe_table(&table);

    let log = events_from_table(table)?;
    if log.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(log)
}

/// Read and validate the offers catalogue from a CSV file.
pub fn load_offers(path: &Path) -> PipelineResult<OfferCatalog> {
    log_info(format!("📖 Reading offers: {}", path.display()));
    let table = parse_file_auto(path)?;
    describe_table(&table);

    let catalog = OfferCatalog::from_rows(offer_rows_from_table(&table)?);
    log_success(format!("{} offers loaded", catalog.offers.len()));
    if !catalog.rejected.is_empty() {
        log_warning(format!("{} offer rows failed validation", catalog.rejected.len()));
        for rejected in catalog.rejected.iter().take(3) {
            log_warning(format!("• row {}: {}", rejected.row, rejected.errors.join(", ")));
        }
    }
    if catalog.duplicates > 0 {
        log_warning(format!("{} duplicate offer ids ignored", catalog.duplicates));
    }
    Ok(catalog)
}

fn describe_table(table: &ParseResult) {
    log_success(format!(
        "{} rows, encoding {}, separator '{}'",
        table.rows.len(),
        table.encoding,
        format_delimiter(table.delimiter)
    ));
    log_info_indent(format!("Columns: {}", table.headers.join(", ")), 1);
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

/// Run the selected queries over cleaned events.
pub fn analyze(cleaned: &CleanResult, catalog: &OfferCatalog, options: &AnalysisOptions) -> AnalysisReport {
    let index = OfferIndex::new(&catalog.offers);

    let mut queries = Vec::with_capacity(options.queries.len());
    for query in &options.queries {
        let funnel = query.to_funnel(options);
        log_info(format!("📊 Query {} ({})", funnel.name, funnel.order));

        let result = run_funnel(&cleaned.events, &index, &funnel);
        log_success(format!("{} rows", result.rows.len()));
        if let Some(join) = &result.join {
            if join.dropped_by_join() > 0 {
                log_warning(format!(
                    "{} of {} funnel events dropped by the offer join ({} without offer id, {} unknown offer)",
                    join.dropped_by_join(),
                    join.considered,
                    join.without_offer_id,
                    join.unmatched
                ));
            }
            if join.null_dimension + join.below_minimum > 0 {
                log_info_indent(
                    format!(
                        "{} events without a {} value, {} under the minimum",
                        join.null_dimension,
                        result.dimension.map_or("", |d| d.as_str()),
                        join.below_minimum
                    ),
                    1,
                );
            }
        }
        queries.push(result);
    }

    let transactions = summarize_transactions(&cleaned.events);

    AnalysisReport {
        generated_at: Utc::now(),
        cleaning: cleaned.stats.clone(),
        malformed_payloads: cleaned.malformed.clone(),
        offers: catalog.stats(),
        rejected_offers: catalog.rejected.clone(),
        queries,
        transactions,
    }
}

/// Clean an already loaded event log and analyze it.
pub fn run_log(log: EventLog, catalog: OfferCatalog, options: &AnalysisOptions) -> PipelineResult<PipelineOutput> {
    if log.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let cleaned = clean(log);
    let report = analyze(&cleaned, &catalog, options);
    log_success(format!("✨ {} queries done", report.queries.len()));

    Ok(PipelineOutput {
        cleaned,
        catalog,
        report,
    })
}

/// Full pipeline from CSV files.
pub fn run(events_path: &Path, offers_path: &Path, options: &AnalysisOptions) -> PipelineResult<PipelineOutput> {
    let log = load_events(events_path)?;
    let catalog = load_offers(offers_path)?;
    run_log(log, catalog, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::queries::Query;
    use crate::models::{Event, EventKind, Offer};

    fn catalog() -> OfferCatalog {
        OfferCatalog {
            offers: vec![Offer {
                offer_id: "o1".into(),
                offer_type: "bogo".into(),
                difficulty: Some(5.0),
                reward: Some(5.0),
                duration: Some(7.0),
            }],
            ..OfferCatalog::default()
        }
    }

    #[test]
    fn test_empty_input() {
        let result = run_log(EventLog::default(), catalog(), &AnalysisOptions::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn test_run_log_all_queries() {
        let log = EventLog::from_events(vec![
            Event::new("1", EventKind::OfferReceived, "{'offer id': 'o1'}"),
            Event::new("2", EventKind::OfferReceived, "{'offer id': 'o1'}"),
            Event::new("1", EventKind::OfferViewed, "{'offer id': 'o1'}"),
            Event::new("1", EventKind::OfferCompleted, "{'offer_id': 'o1', 'reward': 5}"),
            Event::new("1", EventKind::Transaction, "{'amount': 12.5}"),
        ]);

        let output = run_log(log, catalog(), &AnalysisOptions::default()).unwrap();
        let report = &output.report;

        assert_eq!(report.queries.len(), Query::ALL.len());
        assert_eq!(report.cleaning.rows, 5);
        assert_eq!(report.transactions.total_amount, 12.5);

        let staged = report
            .queries
            .iter()
            .find(|q| q.name == "overall_staged")
            .unwrap();
        assert_eq!(staged.rows[0].event, EventKind::OfferReceived);
        assert_eq!(staged.rows[1].churn_rate, Some(50.0));
        assert_eq!(staged.rows[2].churn_rate, Some(0.0));

        let by_type = report.queries.iter().find(|q| q.name == "offer_type").unwrap();
        assert_eq!(by_type.rows.len(), 3);
        assert_eq!(by_type.join.as_ref().unwrap().dropped_by_join(), 0);
    }

    #[test]
    fn test_report_serializes() {
        let log = EventLog::from_events(vec![Event::new(
            "1",
            EventKind::OfferReceived,
            "{'offer id': 'o1'}",
        )]);
        let output = run_log(log, catalog(), &AnalysisOptions::default()).unwrap();

        let json = serde_json::to_value(&output.report).unwrap();
        assert_eq!(json["queries"][0]["name"], "overall");
        assert_eq!(json["queries"][0]["rows"][0]["event"], "offer received");
        assert!(json["queries"][0]["rows"][0]["churn_rate"].is_null());
        assert_eq!(json["queries"][2]["rows"][0]["slice"], "bogo");
    }
}
