// src/main.rs
mod dataset;
mod edgar;
mod extractors;
mod pipeline;
mod storage;
mod utils;

use clap::Parser;
use dataset::Alignment;
use edgar::{ClientConfig, EdgarClient, TickerLookup};
use extractors::DocumentSelection;
use pipeline::{Pipeline, PipelineConfig, RunReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use storage::StorageManager;
use utils::AppError;

/// Multi-year financial statements from SEC 10-K filings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol of the company
    #[arg(short, long)]
    ticker: String,

    /// Number of most recent annual reports to combine
    #[arg(short, long, default_value_t = pipeline::DEFAULT_YEARS)]
    years: usize,

    /// Local copy of company_tickers.json (downloaded from the SEC when omitted)
    #[arg(long)]
    lookup: Option<PathBuf>,

    /// User-Agent sent to EDGAR; the SEC expects a name and contact address
    #[arg(long, env = "EDGAR_USER_AGENT", default_value = edgar::client::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Filings processed concurrently
    #[arg(long, default_value_t = pipeline::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// How statement documents are picked: "names" (manifest) or "slots" (R2..R10)
    #[arg(long, default_value = "names")]
    selection: DocumentSelection,

    /// How years are lined up: "position" or "category"
    #[arg(long, default_value = "position")]
    align: Alignment,

    /// Output directory for exported data and debug files
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Write the dataset as CSV plus a metadata JSON file
    #[arg(short, long)]
    export: bool,

    /// Debug mode - save raw and annotated statement HTML files
    #[arg(short, long)]
    debug: bool,

    /// Retries for transient HTTP failures
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Setup Logging (RUST_LOG overrides)
    utils::logging::setup_logging("info");

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), AppError> {
    if args.years == 0 {
        return Err(AppError::Config("--years must be at least 1".to_string()));
    }

    // 3. Initialize the EDGAR client
    let client = EdgarClient::new(ClientConfig {
        user_agent: args.user_agent.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        max_retries: args.max_retries,
        ..ClientConfig::default()
    })?;

    // 4. Load the ticker table
    let lookup = match &args.lookup {
        Some(path) => TickerLookup::from_path(path)?,
        None => TickerLookup::fetch(&client).await?,
    };
    tracing::info!("Ticker table has {} entries", lookup.len());

    // 5. Run the pipeline
    let config = PipelineConfig {
        years: args.years,
        concurrency: args.concurrency,
        selection: args.selection,
        alignment: args.align,
        debug_dir: args.debug.then(|| args.output_dir.join("debug")),
    };
    let report = Pipeline::new(&client, &lookup, config).run(&args.ticker).await?;

    println!("{}", report.registrant);
    print!("{}", report.dataset);
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.filing.index_url, skipped.reason);
    }

    // 6. Export
    if args.export {
        export(&args.output_dir, &report)?;
    }
    Ok(())
}

fn export(output_dir: &Path, report: &RunReport) -> Result<(), AppError> {
    let storage = StorageManager::new(output_dir)?;
    let csv_path = storage.save_dataset(report)?;
    let meta_path = storage.save_metadata(report)?;
    tracing::info!("Exported {} and {}", csv_path.display(), meta_path.display());
    Ok(())
}
