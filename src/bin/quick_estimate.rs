//! Quick price estimate: `quick_estimate [cropName] [location]`.
//!
//! Prints one JSON line and always exits 0.

use clap::Parser;
use crop_price_forecaster::{estimate, rng_from_seed, EngineConfig, Estimate, EstimateRequest};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "quick_estimate",
    about = "Random crop price estimate as JSON",
    disable_help_flag = true
)]
struct Cli {
    /// Crop name, e.g. "Tomato"
    crop_name: Option<String>,

    /// Market location, e.g. "Guntur"
    location: Option<String>,

    /// Seed for reproducible output (overrides CROP_PRICE_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the JSON Schema of the output and exit
    #[arg(long)]
    schema: bool,
}

impl Cli {
    /// Unparseable arguments are read positionally instead of failing. There
    /// is no help flag, so a crop named `--help` is still just a crop.
    fn parse_lenient() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) => {
                warn!("Falling back to positional arguments: {:?}", e.kind());
                let mut args = std::env::args().skip(1);
                Self {
                    crop_name: args.next(),
                    location: args.next(),
                    seed: None,
                    schema: false,
                }
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse_lenient();

    if cli.schema {
        let schema = schemars::schema_for!(Estimate);
        match serde_json::to_string(&schema) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Could not render schema: {}", e),
        }
        return;
    }

    let mut config = EngineConfig::from_env().unwrap_or_else(|e| {
        warn!("{}; using default configuration", e);
        EngineConfig::default()
    });
    if let Some(seed) = cli.seed {
        config.apply_seed(seed);
    }

    let estimator = config.estimator;
    let request =
        EstimateRequest::with_placeholder(cli.crop_name, cli.location, &estimator.placeholder);
    debug!(?request, "Quick estimate requested");

    let mut rng = rng_from_seed(estimator.seed);
    let result = estimate(&request, &estimator, &mut rng);

    match serde_json::to_string(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Could not serialize estimate: {}", e),
    }
}
