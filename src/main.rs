// src/main.rs
mod utils;
mod forecast;
mod extractors;
mod storage;

use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use extractors::{extract_forecast, BareUnit, ExtractOptions};
use forecast::client;
use forecast::models::ForecastMeta;
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the tide forecast extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Location slug as used in tide-forecast.com URLs
    #[arg(short, long, default_value = "Playa-del-Ingles")]
    location: String,

    /// Full page URL (optional, overrides the location slug)
    #[arg(short, long)]
    url: Option<String>,

    /// IANA timezone the page's dates and times belong to
    #[arg(short, long, default_value = "Atlantic/Canary")]
    timezone: String,

    /// Output directory for the forecast JSON
    #[arg(short, long, default_value = "./data")]
    output_dir: String,

    /// Read the page from a local HTML file instead of fetching
    #[arg(short, long)]
    input: Option<String>,

    /// Debug mode - save the fetched page next to the forecast
    #[arg(short, long)]
    debug: bool,

    /// Unit assumed for height values that carry no unit marker
    #[arg(long, value_enum, default_value = "feet")]
    bare_unit: BareUnit,

    /// Maximum number of events kept per day
    #[arg(long, default_value = "4")]
    max_events: usize,

    /// Below this many located table rows the text fallback also runs
    #[arg(long, default_value = "2")]
    min_table_rows: usize,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Resolve the page timezone
    let tz = resolve_timezone(&args.timezone)?;

    // 4. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 5. Obtain the page HTML, from disk or over the network
    let html = match &args.input {
        Some(path) => {
            tracing::info!("Reading page from local file: {}", path);
            std::fs::read_to_string(path)?
        }
        None => {
            let url = args
                .url
                .clone()
                .unwrap_or_else(|| client::page_url(&args.location));
            tracing::info!("Fetching tide page from: {}", url);
            client::fetch_tide_page(&url).await?
        }
    };
    tracing::info!("Obtained document ({} bytes)", html.len());

    // 6. In debug mode keep the raw page next to the output
    if args.debug {
        if let Err(e) = storage.save_raw_page(&html) {
            tracing::warn!("Failed to save raw page: {}", e);
        }
    }

    // 7. Run the extraction pipeline
    let now = Utc::now().with_timezone(&tz);
    let options = ExtractOptions {
        bare_unit: args.bare_unit,
        max_events_per_day: args.max_events,
        min_table_rows: args.min_table_rows,
    };
    let meta = ForecastMeta {
        location: args.location.replace('-', " "),
        timezone: tz.name().to_string(),
        generated_at: Utc::now(),
    };
    let forecast = extract_forecast(&html, &options, now, meta)?;
    tracing::info!(
        "Extracted {} day(s) for {}",
        forecast.days.len(),
        forecast.meta.location
    );

    // 8. Save the forecast
    let path = storage.save_forecast(&forecast)?;
    tracing::info!("Forecast written to: {}", path.display());

    Ok(())
}

/// Parses an IANA zone id, turning an unknown id into a configuration error.
fn resolve_timezone(id: &str) -> Result<Tz, AppError> {
    id.parse()
        .map_err(|_| AppError::Config(format!("Unknown timezone id '{}'", id)))
}
