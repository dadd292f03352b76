//! Plain-text rendering of query results.

use std::fmt::Write;

use super::pipeline::AnalysisReport;
use super::queries::QueryResult;

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn rate(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// Render one query as an aligned table.
pub fn render_query(result: &QueryResult) -> String {
    let mut out = String::new();

    let mut title = format!("== {} ({}", result.name, result.order);
    if let Some(min) = result.min_value.filter(|_| result.dimension.is_some_and(|d| d.is_numeric())) {
        let _ = write!(title, ", min {}", min);
    }
    title.push_str(") ==");
    let _ = writeln!(out, "{}", title);

    let slice_header = result.dimension.map_or("slice", |d| d.as_str());
    let _ = writeln!(
        out,
        "{:<16} {:<16} {:>8} {:>9} {:>8} {:>11}",
        slice_header, "event", "count", "previous", "churn %", "conversion %"
    );

    if result.rows.is_empty() {
        let _ = writeln!(out, "(no rows)");
    }
    for row in &result.rows {
        let _ = writeln!(
            out,
            "{:<16} {:<16} {:>8} {:>9} {:>8} {:>11}",
            cell(row.slice.as_ref()),
            row.event.as_str(),
            row.event_count,
            cell(row.previous_count),
            rate(row.churn_rate),
            rate(row.conversion_rate),
        );
    }

    if let Some(join) = &result.join {
        let _ = writeln!(
            out,
            "joined {} of {} funnel events ({} without offer id, {} unknown offer, {} null, {} under minimum)",
            join.kept,
            join.considered,
            join.without_offer_id,
            join.unmatched,
            join.null_dimension,
            join.below_minimum
        );
    }
    out
}

/// Render a whole report.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let c = &report.cleaning;
    let _ = writeln!(
        out,
        "events: {} rows, {} malformed payloads, {} with offer id",
        c.rows, c.malformed, c.with_offer_id
    );
    let _ = writeln!(
        out,
        "offers: {} loaded, {} rejected, {} duplicates",
        report.offers.loaded, report.offers.rejected, report.offers.duplicates
    );

    for query in &report.queries {
        out.push('\n');
        out.push_str(&render_query(query));
    }

    let t = &report.transactions;
    let _ = writeln!(
        out,
        "\ntransactions: {} by {} customers, total {:.2}, mean {}",
        t.transactions,
        t.customers,
        t.total_amount,
        rate(t.mean_amount)
    );
    out
}
