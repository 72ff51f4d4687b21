use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used for any free-text field the caller leaves out.
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown";

/// Price assumed by the forecaster when the caller supplies none.
pub const DEFAULT_CURRENT_PRICE: f64 = 2000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    #[schemars(description = "The predicted price is strictly above the current price")]
    Up,

    #[schemars(description = "The predicted price is at or below the current price")]
    Down,
}

impl Trend {
    pub fn between(current: u32, predicted: u32) -> Self {
        if predicted > current {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "UP"),
            Trend::Down => write!(f, "DOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    pub crop_name: String,
    pub location: String,
}

impl EstimateRequest {
    /// Builds a request from optional arguments, substituting the placeholder
    /// for each one independently.
    pub fn from_args(crop_name: Option<String>, location: Option<String>) -> Self {
        Self::with_placeholder(crop_name, location, UNKNOWN_PLACEHOLDER)
    }

    pub fn with_placeholder(
        crop_name: Option<String>,
        location: Option<String>,
        placeholder: &str,
    ) -> Self {
        Self {
            crop_name: crop_name.unwrap_or_else(|| placeholder.to_string()),
            location: location.unwrap_or_else(|| placeholder.to_string()),
        }
    }
}

impl Default for EstimateRequest {
    fn default() -> Self {
        Self::from_args(None, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Estimate {
    #[schemars(description = "Crop name as supplied by the caller")]
    pub crop: String,

    #[schemars(description = "Market location as supplied by the caller")]
    pub location: String,

    #[schemars(description = "Randomized current price per quintal")]
    pub current_price: u32,

    #[schemars(description = "Randomized predicted price, always above the current price")]
    pub predicted_price: u32,

    pub trend: Trend,

    #[schemars(description = "Confidence percentage rendered as text, e.g. \"93%\"")]
    pub confidence_score: String,

    #[schemars(description = "Templated advisory sentence mentioning the crop and trend")]
    pub advisory: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub current_price: f64,
    /// Sent by the backend alongside the price; only used for diagnostics.
    pub crop_name: Option<String>,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            current_price: DEFAULT_CURRENT_PRICE,
            crop_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct DayPoint {
    #[serde(rename = "day")]
    #[schemars(description = "Short weekday name, e.g. \"Mon\"")]
    pub day_label: String,

    #[serde(rename = "date")]
    #[schemars(description = "Day of month and short month name, e.g. \"12 Feb\"")]
    pub date_label: String,

    #[schemars(description = "Price truncated to a whole number")]
    pub price: i64,
}

impl DayPoint {
    pub fn new(date: NaiveDate, price: i64) -> Self {
        Self {
            day_label: date.format("%a").to_string(),
            date_label: date.format("%d %b").to_string(),
            price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ForecastReport {
    #[schemars(description = "The last seven days of the synthetic series, oldest first")]
    pub history: Vec<DayPoint>,

    #[schemars(description = "Model predictions for the seven days after today")]
    pub forecast: Vec<DayPoint>,
}

/// What the forecaster prints. Failures keep the success shape with empty
/// arrays so callers can always read `history` and `forecast`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(untagged)]
pub enum ForecastResponse {
    Failure {
        error: String,
        history: Vec<DayPoint>,
        forecast: Vec<DayPoint>,
    },
    Success(ForecastReport),
}

impl ForecastResponse {
    pub fn failure(error: impl fmt::Display) -> Self {
        ForecastResponse::Failure {
            error: error.to_string(),
            history: Vec::new(),
            forecast: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ForecastResponse::Success(_))
    }

    pub fn history(&self) -> &[DayPoint] {
        match self {
            ForecastResponse::Success(report) => &report.history,
            ForecastResponse::Failure { history, .. } => history,
        }
    }

    pub fn forecast(&self) -> &[DayPoint] {
        match self {
            ForecastResponse::Success(report) => &report.forecast,
            ForecastResponse::Failure { forecast, .. } => forecast,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ForecastResponse::Success(_) => None,
            ForecastResponse::Failure { error, .. } => Some(error),
        }
    }
}

impl From<crate::error::Result<ForecastReport>> for ForecastResponse {
    fn from(result: crate::error::Result<ForecastReport>) -> Self {
        match result {
            Ok(report) => ForecastResponse::Success(report),
            Err(e) => ForecastResponse::failure(e),
        }
    }
}
