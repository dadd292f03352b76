//! Offer Funnel CLI - clean offer event logs and compute funnel churn
//!
//! ```bash
//! offer-funnel clean events.csv -o events_cleaned.csv
//! offer-funnel funnel events.csv offers.csv --by difficulty --min 5
//! offer-funnel report events.csv offers.csv --format table
//! offer-funnel queries
//! ```
//!
//! Progress goes to stderr (`RUST_LOG` filters it); results go to stdout
//! or to the `--output` file.

use clap::{Parser, Subcommand, ValueEnum};
use offer_funnel::logs::log_error;
use offer_funnel::{
    clean, load_events, load_offers, render_query, render_report, run, run_funnel,
    AnalysisOptions, Dimension, FunnelQuery, OfferIndex, Query, StageOrder,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "offer-funnel")]
#[command(about = "Clean promotional-offer event logs and compute funnel churn rates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse event payloads and write events_cleaned as CSV
    Clean {
        /// Events CSV file
        events: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a single funnel query
    Funnel {
        /// Events CSV file
        events: PathBuf,

        /// Offers CSV file
        offers: PathBuf,

        /// Slice by offer_type, difficulty, reward or duration
        #[arg(short, long)]
        by: Option<Dimension>,

        /// JSON options file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stage order: count_desc or canonical
        #[arg(long)]
        order: Option<StageOrder>,

        /// Smallest dimension value kept (numeric dimensions only)
        #[arg(long)]
        min: Option<f64>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,
    },

    /// Run every query of the catalogue
    Report {
        /// Events CSV file
        events: PathBuf,

        /// Offers CSV file
        offers: PathBuf,

        /// JSON options file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Force one stage order on every query
        #[arg(long)]
        order: Option<StageOrder>,

        /// Also write events_cleaned to this file
        #[arg(long)]
        cleaned: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,
    },

    /// List the query catalogue
    Queries,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offer_funnel=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean { events, output } => cmd_clean(&events, output.as_deref()),

        Commands::Funnel {
            events,
            offers,
            by,
            config,
            order,
            min,
            format,
        } => cmd_funnel(&events, &offers, by, config.as_deref(), order, min, format),

        Commands::Report {
            events,
            offers,
            config,
            order,
            cleaned,
            output,
            format,
        } => cmd_report(
            &events,
            &offers,
            config.as_deref(),
            order,
            cleaned.as_deref(),
            output.as_deref(),
            format,
        ),

        Commands::Queries => cmd_queries(),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_clean(events: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let log = load_events(events)?;
    let cleaned = clean(log);

    match output {
        Some(path) => {
            cleaned.write_csv_file(path)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => cleaned.write_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_funnel(
    events: &Path,
    offers: &Path,
    by: Option<Dimension>,
    config: Option<&Path>,
    order: Option<StageOrder>,
    min: Option<f64>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = AnalysisOptions::load(config)?;
    let mut query = FunnelQuery::from_options(by, &options);
    if let Some(order) = order {
        query.order = order;
    }
    if min.is_some() {
        query.min_value = min;
    }

    let cleaned = clean(load_events(events)?);
    let catalog = load_offers(offers)?;
    let index = OfferIndex::new(&catalog.offers);

    let result = run_funnel(&cleaned.events, &index, &query);

    let content = match format {
        Format::Json => serde_json::to_string_pretty(&result)?,
        Format::Table => render_query(&result),
    };
    write_output(&content, None)
}

#[allow(clippy::too_many_arguments)]
fn cmd_report(
    events: &Path,
    offers: &Path,
    config: Option<&Path>,
    order: Option<StageOrder>,
    cleaned_path: Option<&Path>,
    output: Option<&Path>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = AnalysisOptions::load(config)?;
    if order.is_some() {
        options.order_override = order;
    }

    let output_data = run(events, offers, &options)?;

    if let Some(path) = cleaned_path {
        output_data.cleaned.write_csv_file(path)?;
        eprintln!("💾 events_cleaned written to: {}", path.display());
    }

    let content = match format {
        Format::Json => serde_json::to_string_pretty(&output_data.report)?,
        Format::Table => render_report(&output_data.report),
    };
    write_output(&content, output)
}

fn cmd_queries() -> Result<(), Box<dyn std::error::Error>> {
    let options = AnalysisOptions::default();
    for query in Query::ALL {
        let funnel = query.to_funnel(&options);
        let min = funnel
            .min_value
            .map(|m| format!(", min {}", m))
            .unwrap_or_default();
        println!("  {:<16} {} [{}{}]", query.name(), query.description(), funnel.order, min);
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
