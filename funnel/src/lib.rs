//! # Offer Funnel - promotional offer event cleaning and funnel analysis
//!
//! Offer Funnel reads a customer event log (offer received / viewed /
//! completed, transactions) and an offers catalogue, extracts typed fields
//! from the semi-structured event payloads, and computes distinct-customer
//! funnels with stage-over-stage churn, optionally sliced by offer
//! attributes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ events.csv  │────▶│   Parser    │────▶│    Clean    │────▶│   Funnel    │
//! │ offers.csv  │     │ (auto-enc)  │     │  (payload)  │     │ (per slice) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                                       ▲
//!                            └──────── validation (offers) ──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use offer_funnel::{run, AnalysisOptions};
//! use std::path::Path;
//!
//! let output = run(Path::new("events.csv"), Path::new("offers.csv"), &AnalysisOptions::default())?;
//! println!("{}", offer_funnel::render_report(&output.report));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Events, offers, slicing dimensions
//! - [`parser`] - CSV reading with auto-detection
//! - [`clean`] - Payload parsing and `events_cleaned`
//! - [`validation`] - Offer catalogue schema validation
//! - [`funnel`] - Join, slice and aggregate
//! - [`analysis`] - Query catalogue, pipeline, rendering
//! - [`config`] - Analysis options
//! - [`logs`] - Progress logging

// Core modules
pub mod error;
pub mod models;

// Input
pub mod parser;
pub mod validation;

// Cleaning stage
pub mod clean;

// Analysis stage
pub mod analysis;
pub mod funnel;

// Ambient
pub mod config;
pub mod logs;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{ConfigError, CsvError, PayloadError, PipelineError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CleanedEvent, Dimension, Event, EventKind, EventLog, Offer, SliceKey};

// =============================================================================
// Re-exports - Parsing & Validation
// =============================================================================

pub use parser::{
    events_from_table, offer_rows_from_table, parse_bytes_auto, parse_file_auto, parse_str,
    ParseResult,
};
pub use validation::{validate_offer, OfferCatalog};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use clean::{clean, CleanResult, CleanStats, Payload, PayloadFields};

// =============================================================================
// Re-exports - Funnel
// =============================================================================

pub use funnel::{aggregate, FunnelRow, JoinStats, OfferIndex, SliceSpec, StageOrder};

// =============================================================================
// Re-exports - Analysis
// =============================================================================

pub use analysis::{
    analyze, load_events, load_offers, render_query, render_report, run, run_funnel, run_log,
    AnalysisReport, FunnelQuery, PipelineOutput, Query, QueryResult,
};
pub use config::{AnalysisOptions, SliceThresholds};
