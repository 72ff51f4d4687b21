//! Seven-day history and forecast: reads `{"currentPrice": <number>}` on stdin.
//!
//! Prints one JSON line and always exits 0. Failures are reported as
//! `{"error": ..., "history": [], "forecast": []}`.

use chrono::Local;
use clap::Parser;
use crop_price_forecaster::{
    read_input, rng_from_seed, EngineConfig, ForecastProcessor, ForecastResponse,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "price_forecast", about = "Synthetic crop price history and forecast as JSON")]
struct Cli {
    /// Seed for reproducible output (overrides CROP_PRICE_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the JSON Schema of the output and exit
    #[arg(long)]
    schema: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn emit(response: &ForecastResponse) {
    match serde_json::to_string(response) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            warn!("Could not serialize response: {}", e);
            println!(r#"{{"error":"serialization failed","history":[],"forecast":[]}}"#);
        }
    }
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            warn!("Ignoring arguments: {:?}", e.kind());
            Cli {
                seed: None,
                schema: false,
            }
        }
        Err(e) => {
            let _ = e.print();
            return;
        }
    };

    if cli.schema {
        let schema = schemars::schema_for!(ForecastResponse);
        match serde_json::to_string(&schema) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Could not render schema: {}", e),
        }
        return;
    }

    let mut config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            emit(&ForecastResponse::failure(e));
            return;
        }
    };
    if let Some(seed) = cli.seed {
        config.apply_seed(seed);
    }
    let config = config.forecast;

    let input = read_input(std::io::stdin().lock());

    let today = Local::now().date_naive();
    let mut rng = rng_from_seed(config.seed);
    info!(bytes = input.len(), %today, "Forecast requested");

    let response = ForecastProcessor::process(&input, &config, today, &mut rng);
    if let Some(error) = response.error() {
        warn!(error, "Returning fallback payload");
    }
    emit(&response);
}
