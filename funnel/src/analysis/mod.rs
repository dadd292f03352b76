//! Analysis stage.
//!
//! - `queries`: query catalogue and single-funnel execution
//! - `transactions`: spend summary
//! - `pipeline`: load → clean → analyze orchestration
//! - `render`: plain-text tables

pub mod pipeline;
pub mod queries;
pub mod render;
pub mod transactions;

pub use pipeline::*;
pub use queries::{run_funnel, FunnelQuery, Query, QueryResult};
pub use render::{render_query, render_report};
pub use transactions::{summarize_transactions, TransactionSummary};
