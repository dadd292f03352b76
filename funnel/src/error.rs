//! Error types for the offer funnel pipeline.
//!
//! - [`CsvError`] - Reading and writing tabular data
//! - [`PayloadError`] - A single event payload that could not be parsed
//! - [`ConfigError`] - Analysis options from file or environment
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing CSV tables.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write a file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// A column the table needs is not in the header.
    #[error("Missing column '{column}' in {table} table")]
    MissingColumn { table: &'static str, column: &'static str },
}

// =============================================================================
// Payload Errors
// =============================================================================

/// Why an event payload could not be read as a key-value map.
///
/// Never aborts cleaning: the affected row keeps null derived fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    /// Parsed, but the top-level value is not a map.
    #[error("payload is not a key-value map")]
    NotAMap,

    /// Could not be parsed at all.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading analysis options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON for the options.
    #[error("Invalid config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::analysis::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Report serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No events to analyze.
    #[error("No events to analyze")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
