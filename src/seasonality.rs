use crate::error::{PriceEngineError, Result};
use crate::utils::linspace;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Sine wave over the day index with the given period, scaled by `amplitude`.
pub fn seasonal_component(days: usize, period_days: f64, amplitude: f64) -> Vec<f64> {
    (0..days)
        .map(|t| (2.0 * PI * t as f64 / period_days).sin() * amplitude)
        .collect()
}

/// Slow drift from `start` to `end` across the series.
pub fn trend_component(days: usize, start: f64, end: f64) -> Vec<f64> {
    linspace(start, end, days)
}

pub fn noise_component<R: Rng + ?Sized>(
    days: usize,
    noise_factor: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if noise_factor == 0.0 {
        return Ok(vec![0.0; days]);
    }

    let normal = Normal::new(0.0, noise_factor).map_err(|e| {
        PriceEngineError::InvalidConfig(format!("noise_factor {}: {}", noise_factor, e))
    })?;

    Ok((0..days).map(|_| normal.sample(rng)).collect())
}

/// Element-wise sum of equally long components.
pub fn combine(components: &[&[f64]]) -> Vec<f64> {
    let len = components.iter().map(|c| c.len()).min().unwrap_or(0);
    (0..len)
        .map(|i| components.iter().map(|c| c[i]).sum::<f64>())
        .collect()
}
