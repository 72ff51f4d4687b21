//! # Crop Price Forecaster
//!
//! Fabricated crop-price predictions for a demo marketplace. A backend spawns
//! one of two binaries per request and reads a single JSON line from stdout.
//!
//! ## Core Concepts
//!
//! - **Quick Estimate**: A random current price, a slightly higher predicted
//!   price, a trend label and a templated advisory sentence
//! - **Synthetic Series**: One year of daily prices built from a seasonal sine
//!   wave, a gentle upward ramp and Gaussian noise, scaled so the last day
//!   equals the requested current price
//! - **Cyclical Features**: Day-of-year encoded as `(sin, cos)` so Dec 31 and
//!   Jan 1 are neighbours
//! - **Forecast**: A random forest fitted on the synthetic year predicts the
//!   next seven days
//! - **Fallback Payload**: Any failure is reported as
//!   `{"error": ..., "history": [], "forecast": []}` instead of a crash
//!
//! ## Example
//!
//! ```rust,ignore
//! use crop_price_forecaster::*;
//! use chrono::NaiveDate;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let today = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
//!
//! let response = ForecastProcessor::process(
//!     r#"{"currentPrice": 3000}"#,
//!     &ForecastConfig::default(),
//!     today,
//!     &mut rng,
//! );
//! assert_eq!(response.history().len(), 7);
//! assert_eq!(response.forecast().len(), 7);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod forest;
pub mod ingestion;
pub mod schema;
pub mod seasonality;
pub mod utils;

pub use config::{EngineConfig, EstimatorConfig, ForecastConfig, ForestConfig};
pub use engine::{MarketAnalyzer, SeriesPoint, SyntheticSeries};
pub use error::{PriceEngineError, Result};
pub use estimator::estimate;
pub use forest::{RandomForestRegressor, RegressionTree};
pub use ingestion::{parse_request, read_input};
pub use schema::*;
pub use utils::{cyclical_features, day_of_year};

use chrono::NaiveDate;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct ForecastProcessor;

impl ForecastProcessor {
    /// Runs the whole forecaster on raw stdin text. Every failure becomes the
    /// fallback payload; this never panics on caller input.
    pub fn process<R: Rng + ?Sized>(
        input: &str,
        config: &ForecastConfig,
        today: NaiveDate,
        rng: &mut R,
    ) -> ForecastResponse {
        Self::try_process(input, config, today, rng).into()
    }

    pub fn try_process<R: Rng + ?Sized>(
        input: &str,
        config: &ForecastConfig,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<ForecastReport> {
        let request = ingestion::parse_request_with_default(input, config.default_price)?;
        info!(
            "Forecasting {} from current price {}",
            request.crop_name.as_deref().unwrap_or(UNKNOWN_PLACEHOLDER),
            request.current_price
        );

        MarketAnalyzer::new(config.clone()).analyze(request.current_price, today, rng)
    }
}

/// A seeded generator when `seed` is set, otherwise one seeded from entropy.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn process_forecast(
    input: &str,
    config: &ForecastConfig,
    today: NaiveDate,
) -> ForecastResponse {
    let mut rng = rng_from_seed(config.seed);
    ForecastProcessor::process(input, config, today, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 12, 28).unwrap()
    }

    #[test]
    fn test_end_to_end_forecast() {
        let mut rng = StdRng::seed_from_u64(1);
        let response = ForecastProcessor::process(
            r#"{"currentPrice": 3000}"#,
            &ForecastConfig::default(),
            today(),
            &mut rng,
        );

        assert!(response.is_success());
        assert_eq!(response.history().len(), 7);
        assert_eq!(response.forecast().len(), 7);
        assert_eq!(response.history()[6].price, 3000);

        // Forecast crosses into the new year
        assert_eq!(response.forecast()[3].date_label, "01 Jan");
    }

    #[test]
    fn test_garbage_input_uses_default_price() {
        let mut rng = StdRng::seed_from_u64(2);
        let response =
            ForecastProcessor::process("%%%", &ForecastConfig::default(), today(), &mut rng);

        assert!(response.is_success());
        assert_eq!(response.history()[6].price, 2000);
    }

    #[test]
    fn test_bad_price_yields_fallback_payload() {
        let mut rng = StdRng::seed_from_u64(3);
        for input in [
            r#"{"currentPrice": "abc"}"#,
            r#"{"currentPrice": -5}"#,
            r#"["currentPrice"]"#,
        ] {
            let response =
                ForecastProcessor::process(input, &ForecastConfig::default(), today(), &mut rng);
            assert!(!response.is_success(), "input {:?}", input);
            assert!(response.error().is_some());
            assert!(response.history().is_empty());
            assert!(response.forecast().is_empty());
        }
    }

    #[test]
    fn test_invalid_config_yields_fallback_payload() {
        let config = ForecastConfig {
            noise_factor: -1.0,
            ..ForecastConfig::default()
        };
        let response = process_forecast("", &config, today());
        let error = response.error().unwrap();
        assert!(error.contains("noise_factor"));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = ForecastConfig {
            seed: Some(123),
            ..ForecastConfig::default()
        };
        let a = process_forecast(r#"{"currentPrice": 4100}"#, &config, today());
        let b = process_forecast(r#"{"currentPrice": 4100}"#, &config, today());
        assert_eq!(a, b);
    }
}
