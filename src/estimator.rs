use crate::config::EstimatorConfig;
use crate::schema::{Estimate, EstimateRequest, Trend};
use log::{debug, warn};
use rand::Rng;

/// Produces a randomized price estimate. The numbers carry no information
/// about the crop or location; those only appear in the advisory text.
///
/// An invalid configuration is replaced by the defaults rather than failing.
pub fn estimate<R: Rng + ?Sized>(
    request: &EstimateRequest,
    config: &EstimatorConfig,
    rng: &mut R,
) -> Estimate {
    let fallback;
    let config = match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!("{}; using default estimator settings", e);
            fallback = EstimatorConfig::default();
            &fallback
        }
    };

    let (price_low, price_high) = config.current_price_range;
    let (inc_low, inc_high) = config.increment_range;
    let (conf_low, conf_high) = config.confidence_range;

    let current_price = rng.gen_range(price_low..price_high);
    let predicted_price = current_price + rng.gen_range(inc_low..inc_high);
    let confidence = rng.gen_range(conf_low..=conf_high);
    let trend = Trend::between(current_price, predicted_price);

    debug!(
        "Estimate for {} at {}: {} -> {} ({})",
        request.crop_name, request.location, current_price, predicted_price, trend
    );

    Estimate {
        crop: request.crop_name.clone(),
        location: request.location.clone(),
        current_price,
        predicted_price,
        trend,
        confidence_score: format!("{}%", confidence),
        advisory: advisory(&request.crop_name, trend, config.sell_horizon_days),
    }
}

pub fn advisory(crop_name: &str, trend: Trend, sell_horizon_days: u32) -> String {
    format!(
        "Prices for {} are trending {}. Best time to sell is in {} days.",
        crop_name, trend, sell_horizon_days
    )
}
