use crate::error::{PriceEngineError, Result};
use crate::schema::{DEFAULT_CURRENT_PRICE, UNKNOWN_PLACEHOLDER};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names a JSON file with optional `estimator` and `forecast` sections.
pub const CONFIG_PATH_ENV: &str = "CROP_PRICE_CONFIG";

/// Seeds every random draw in a run when set.
pub const SEED_ENV: &str = "CROP_PRICE_SEED";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    pub placeholder: String,
    /// Half-open range `[min, max)` for the current price.
    pub current_price_range: (u32, u32),
    /// Half-open range `[min, max)` added on top of the current price.
    pub increment_range: (u32, u32),
    /// Inclusive range for the confidence percentage.
    pub confidence_range: (u32, u32),
    pub sell_horizon_days: u32,
    pub seed: Option<u64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            placeholder: UNKNOWN_PLACEHOLDER.to_string(),
            current_price_range: (2000, 5000),
            increment_range: (100, 500),
            confidence_range: (85, 99),
            sell_horizon_days: 3,
            seed: None,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<()> {
        check_half_open("current_price_range", self.current_price_range)?;
        check_half_open("increment_range", self.increment_range)?;

        let (low, high) = self.confidence_range;
        if low > high || high > 100 {
            return Err(PriceEngineError::InvalidConfig(format!(
                "confidence_range ({}, {}) must be ordered and within 0..=100",
                low, high
            )));
        }

        if self.current_price_range.0 == 0 {
            return Err(PriceEngineError::InvalidConfig(
                "current_price_range must start above zero".to_string(),
            ));
        }

        let highest_price = self.current_price_range.1 - 1;
        let highest_increment = self.increment_range.1 - 1;
        if highest_price.checked_add(highest_increment).is_none() {
            return Err(PriceEngineError::InvalidConfig(format!(
                "current_price_range ({}, {}) plus increment_range ({}, {}) overflows u32",
                self.current_price_range.0,
                self.current_price_range.1,
                self.increment_range.0,
                self.increment_range.1
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_depth: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_price: f64,
    /// Length of the synthetic series in days, ending today.
    pub series_days: usize,
    /// Number of days reported in both history and forecast.
    pub window_days: usize,
    pub seasonal_period_days: f64,
    pub seasonal_amplitude: f64,
    pub trend_start: f64,
    pub trend_end: f64,
    /// Standard deviation of the relative daily noise.
    pub noise_factor: f64,
    pub seed: Option<u64>,
    pub forest: ForestConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_price: DEFAULT_CURRENT_PRICE,
            series_days: 365,
            window_days: 7,
            seasonal_period_days: 180.0,
            seasonal_amplitude: 0.2,
            trend_start: 0.8,
            trend_end: 1.0,
            noise_factor: 0.05,
            seed: None,
            forest: ForestConfig::default(),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<()> {
        if self.noise_factor < 0.0 || self.noise_factor > 1.0 {
            return Err(PriceEngineError::InvalidConfig(format!(
                "noise_factor {} must be between 0.0 and 1.0",
                self.noise_factor
            )));
        }

        if self.window_days == 0 || self.window_days > self.series_days {
            return Err(PriceEngineError::InvalidConfig(format!(
                "window_days {} must be between 1 and series_days ({})",
                self.window_days, self.series_days
            )));
        }

        if self.seasonal_period_days.is_nan() || self.seasonal_period_days <= 0.0 {
            return Err(PriceEngineError::InvalidConfig(format!(
                "seasonal_period_days {} must be positive",
                self.seasonal_period_days
            )));
        }

        if !self.default_price.is_finite() || self.default_price <= 0.0 {
            return Err(PriceEngineError::InvalidConfig(format!(
                "default_price {} must be positive",
                self.default_price
            )));
        }

        if self.forest.n_trees == 0 {
            return Err(PriceEngineError::InvalidConfig(
                "forest.n_trees must be at least 1".to_string(),
            ));
        }

        if self.forest.min_samples_split < 2 || self.forest.min_samples_leaf == 0 {
            return Err(PriceEngineError::InvalidConfig(format!(
                "forest.min_samples_split ({}) must be >= 2 and forest.min_samples_leaf ({}) >= 1",
                self.forest.min_samples_split, self.forest.min_samples_leaf
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub estimator: EstimatorConfig,
    pub forecast: ForecastConfig,
}

impl EngineConfig {
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Loads the file named by `CROP_PRICE_CONFIG` (defaults when unset) and
    /// applies `CROP_PRICE_SEED` to both sections.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                debug!("Loading configuration from {}", path);
                Self::from_file(path.trim())?
            }
            _ => Self::default(),
        };

        if let Some(seed) = seed_from_env()? {
            config.apply_seed(seed);
        }

        Ok(config)
    }

    pub fn apply_seed(&mut self, seed: u64) {
        self.estimator.seed = Some(seed);
        self.forecast.seed = Some(seed);
    }

    pub fn validate(&self) -> Result<()> {
        self.estimator.validate()?;
        self.forecast.validate()
    }
}

fn seed_from_env() -> Result<Option<u64>> {
    match std::env::var(SEED_ENV) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(|_| {
            PriceEngineError::InvalidConfig(format!(
                "{} must be an unsigned integer, got '{}'",
                SEED_ENV, raw
            ))
        }),
        _ => Ok(None),
    }
}

fn check_half_open(name: &str, (low, high): (u32, u32)) -> Result<()> {
    if low >= high {
        return Err(PriceEngineError::InvalidConfig(format!(
            "{} ({}, {}) must satisfy min < max",
            name, low, high
        )));
    }
    Ok(())
}
