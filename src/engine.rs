use crate::config::ForecastConfig;
use crate::error::{PriceEngineError, Result};
use crate::forest::RandomForestRegressor;
use crate::schema::{DayPoint, ForecastReport};
use crate::seasonality::{combine, noise_component, seasonal_component, trend_component};
use crate::utils::{date_features, trailing_days, upcoming_days};
use chrono::NaiveDate;
use log::{debug, info};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub price: i64,
}

/// A daily price series, oldest first, whose last point is anchored to the
/// requested current price.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    points: Vec<SeriesPoint>,
}

impl SyntheticSeries {
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn tail(&self, count: usize) -> &[SeriesPoint] {
        let start = self.points.len().saturating_sub(count);
        &self.points[start..]
    }

    /// Training matrix of `[sin, cos]` day-of-year features and prices.
    pub fn training_set(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        self.points
            .iter()
            .map(|p| (date_features(p.date).to_vec(), p.price as f64))
            .unzip()
    }
}

pub struct MarketAnalyzer {
    config: ForecastConfig,
}

impl MarketAnalyzer {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Builds the synthetic year ending on `today`.
    ///
    /// The raw signal is a seasonal sine wave plus a slow upward ramp plus
    /// Gaussian noise, rescaled so that its final value equals
    /// `current_price`. Prices are truncated toward zero.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        current_price: f64,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<SyntheticSeries> {
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(PriceEngineError::InvalidPrice(current_price));
        }

        let days = self.config.series_days;
        let dates = trailing_days(today, days)?;

        let seasonal = seasonal_component(
            days,
            self.config.seasonal_period_days,
            self.config.seasonal_amplitude,
        );
        let trend = trend_component(days, self.config.trend_start, self.config.trend_end);
        let noise = noise_component(days, self.config.noise_factor, rng)?;
        let raw = combine(&[seasonal.as_slice(), trend.as_slice(), noise.as_slice()]);

        let anchor = raw.last().copied().unwrap_or(0.0);
        if anchor == 0.0 || !anchor.is_finite() {
            return Err(PriceEngineError::DegenerateSignal(anchor));
        }

        let scale = current_price / anchor;
        let last = raw.len() - 1;
        let points = dates
            .into_iter()
            .zip(raw)
            .enumerate()
            .map(|(i, (date, value))| {
                // The anchor is pinned so rounding can never pull it under the input
                let scaled = if i == last { current_price } else { value * scale };
                SeriesPoint {
                    date,
                    price: scaled.trunc() as i64,
                }
            })
            .collect();

        debug!(
            "Synthesized {} days ending {} (scale factor {:.4})",
            days, today, scale
        );

        Ok(SyntheticSeries { points })
    }

    pub fn fit(&self, series: &SyntheticSeries) -> Result<RandomForestRegressor> {
        let (features, targets) = series.training_set();
        let mut model = RandomForestRegressor::new(self.config.forest.clone());
        model.fit(&features, &targets)?;
        Ok(model)
    }

    /// Synthesizes a year of prices, fits the forest on it, and reports the
    /// last week of the series alongside predictions for the coming week.
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        current_price: f64,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<ForecastReport> {
        self.config.validate()?;

        let series = self.synthesize(current_price, today, rng)?;
        let model = self.fit(&series)?;

        let history = series
            .tail(self.config.window_days)
            .iter()
            .map(|p| DayPoint::new(p.date, p.price))
            .collect();

        let future = upcoming_days(today, self.config.window_days)?;
        let rows: Vec<Vec<f64>> = future.iter().map(|d| date_features(*d).to_vec()).collect();
        let predictions = model.predict(&rows)?;

        let forecast = future
            .into_iter()
            .zip(predictions)
            .map(|(date, price)| DayPoint::new(date, price.trunc() as i64))
            .collect();

        info!(
            "Analyzed market at price {} with {} trees",
            current_price, self.config.forest.n_trees
        );

        Ok(ForecastReport { history, forecast })
    }
}
